use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::IntakeError;

/// A validated upload, ready for analysis.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub path: PathBuf,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Guess a MIME type from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Check type and size before anything is read into memory.
pub fn validate(path: &Path, mime_type: &str, size: u64, max_bytes: u64) -> Result<(), IntakeError> {
    if !mime_type.starts_with("video/") {
        return Err(IntakeError::NotAVideo {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
        });
    }

    if size > max_bytes {
        return Err(IntakeError::TooLarge {
            size,
            limit_mb: max_bytes / (1024 * 1024),
        });
    }

    Ok(())
}

/// Validate and load a video file from disk.
pub async fn load_upload(path: &Path, max_bytes: u64) -> Result<MediaUpload, IntakeError> {
    let io_err = |source| IntakeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mime_type = mime_type_for(path);
    let metadata = fs::metadata(path).await.map_err(io_err)?;
    validate(path, mime_type, metadata.len(), max_bytes)?;

    let bytes = fs::read(path).await.map_err(io_err)?;

    Ok(MediaUpload {
        path: path.to_path_buf(),
        mime_type: mime_type.to_string(),
        bytes,
    })
}
