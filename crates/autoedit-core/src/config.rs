use std::time::Duration;

use crate::error::CollaboratorError;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Upload ceiling of the reference deployment.
pub const MAX_UPLOAD_MB: u64 = 15;

/// Connection settings for the Gemini `generateContent` endpoint.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_base: String,
    pub analysis_model: String,
    pub image_model: String,
    /// Low temperature keeps transcription factual.
    pub temperature: f32,
    pub env_vars: &'static [&'static str],
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            temperature: 0.2,
            env_vars: &["GEMINI_API_KEY", "API_KEY"],
        }
    }
}

impl GeminiConfig {
    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }

    /// Validate that an API key is set, checking each variable in order
    pub fn validate_api_key(&self) -> Result<String, CollaboratorError> {
        self.env_vars
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| CollaboratorError::MissingApiKey {
                env_var: self.env_vars.first().copied().unwrap_or("API_KEY").to_string(),
            })
    }
}

#[derive(Clone, Debug)]
pub struct EditorConfig {
    pub max_upload_bytes: u64,
    /// A seek is written back to the clock only when it diverges by more than this.
    pub seek_tolerance: f64,
    pub tick_interval: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_MB * 1024 * 1024,
            seek_tolerance: 0.5,
            tick_interval: Duration::from_millis(250),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_model_path() {
        let config = GeminiConfig {
            api_base: "http://localhost:8080/v1beta/".into(),
            ..GeminiConfig::default()
        };
        assert_eq!(
            config.endpoint("gemini-2.5-flash"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn missing_key_names_first_variable() {
        let config = GeminiConfig {
            env_vars: &["AUTOEDIT_TEST_KEY_THAT_IS_NEVER_SET"],
            ..GeminiConfig::default()
        };
        let err = config.validate_api_key().unwrap_err();
        assert!(err.to_string().contains("AUTOEDIT_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn default_upload_ceiling_is_fifteen_megabytes() {
        assert_eq!(EditorConfig::default().max_upload_bytes, 15_728_640);
    }
}
