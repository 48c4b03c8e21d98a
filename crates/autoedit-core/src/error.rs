use std::path::PathBuf;

use thiserror::Error;

/// Rejections raised before a file ever reaches analysis.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("{path} is not a video file (detected type: {mime_type})")]
    NotAVideo { path: PathBuf, mime_type: String },

    #[error("File size exceeds limit of {limit_mb}MB ({size} bytes)")]
    TooLarge { size: u64, limit_mb: u64 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that went wrong while talking to the model service.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No response from model")]
    EmptyResponse,

    #[error("No image data found in response")]
    NoImagePayload,
}

/// The analysis call either produces a whole result or this.
#[derive(Error, Debug)]
pub enum AnalysisFailure {
    #[error("Analysis request failed: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Analysis response did not match the expected schema: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{kind} #{index} has an invalid window [{start_time}, {end_time}]")]
    InvalidInterval {
        kind: &'static str,
        index: usize,
        start_time: f64,
        end_time: f64,
    },
}

#[derive(Error, Debug)]
pub enum AutoEditError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Analysis(#[from] AnalysisFailure),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid image reference: {reason}")]
    InvalidImage { reason: String },
}

pub type Result<T> = std::result::Result<T, AutoEditError>;
