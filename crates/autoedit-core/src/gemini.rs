//! The two calls made to the hosted model: video analysis and image synthesis.
//!
//! Both sit behind small `async_trait` seams so the orchestrator and the
//! B-roll board can be driven by fakes in tests.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::GeminiConfig,
    error::{AutoEditError, CollaboratorError},
};

static ANALYSIS_PROMPT: &str = r#"You are an expert video editor. Analyze this video to create a professional edit.
1. Transcribe the audio into accurate captions with timestamps.
2. Identify 3-5 key moments where the visual content is static, talking-head, or could be improved with B-roll (contextual images).
3. For these moments, suggest 'bRoll' segments with a specific 'imagePrompt' that can be used to generate an image.

Return the result in JSON format."#;

pub const IMAGE_STYLE_SUFFIX: &str = "photorealistic, high quality, cinematic lighting, 4k";

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Sends a video to the model and returns the raw JSON text it produced.
#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    async fn analyze(&self, bytes: &[u8], mime_type: &str) -> Result<String, CollaboratorError>;
}

/// Renders a prompt into a displayable image reference (a data URI).
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn first_image(&self) -> Option<String> {
        self.parts().find_map(|part| {
            let inline = part.inline_data.as_ref()?;
            let data = inline.data.as_deref().filter(|d| !d.is_empty())?;
            let mime_type = inline.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
            Some(to_data_uri(mime_type, data))
        })
    }
}

/// JSON schema handed to the model so its answer matches `AnalysisResponse`.
fn analysis_schema() -> serde_json::Value {
    let timed = |extra: serde_json::Value| {
        let mut props = json!({
            "startTime": { "type": "NUMBER", "description": "Start time in seconds" },
            "endTime": { "type": "NUMBER", "description": "End time in seconds" },
        });
        if let (Some(props), Some(extra)) = (props.as_object_mut(), extra.as_object()) {
            props.extend(extra.clone());
        }
        props
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "A catchy title for the video" },
            "summary": { "type": "STRING", "description": "A one sentence summary of the video content" },
            "captions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": timed(json!({
                        "text": { "type": "STRING", "description": "The spoken text" },
                    })),
                    "required": ["startTime", "endTime", "text"],
                },
            },
            "bRoll": {
                "type": "ARRAY",
                "description": "Suggested B-roll inserts for moments that benefit from visual variety",
                "items": {
                    "type": "OBJECT",
                    "properties": timed(json!({
                        "id": { "type": "STRING", "description": "Unique ID for the segment" },
                        "description": { "type": "STRING", "description": "Reason for this b-roll" },
                        "imagePrompt": { "type": "STRING", "description": "A detailed prompt to generate an image for this segment" },
                    })),
                    "required": ["id", "startTime", "endTime", "description", "imagePrompt"],
                },
            },
        },
        "required": ["title", "summary", "captions", "bRoll"],
    })
}

pub fn to_data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{mime_type};base64,{base64_data}")
}

/// Split a `data:<mime>;base64,<payload>` URI into its MIME type and bytes.
pub fn decode_data_uri(uri: &str) -> crate::Result<(String, Vec<u8>)> {
    let invalid = |reason: &str| AutoEditError::InvalidImage {
        reason: reason.to_string(),
    };

    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| invalid("missing data: prefix"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing payload separator"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("payload is not base64"))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| invalid(&e.to_string()))?;

    Ok((mime_type.to_string(), bytes))
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key,
        }
    }

    /// Build a client from the environment, failing early when no key is set.
    pub fn from_env(config: GeminiConfig) -> Result<Self, CollaboratorError> {
        let api_key = config.validate_api_key()?;
        Ok(Self::new(config, api_key))
    }

    async fn generate_content(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<GenerateContentResponse, CollaboratorError> {
        let response = self
            .client
            .post(self.config.endpoint(model))
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl VideoAnalyzer for GeminiClient {
    async fn analyze(&self, bytes: &[u8], mime_type: &str) -> Result<String, CollaboratorError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": STANDARD.encode(bytes) } },
                    { "text": ANALYSIS_PROMPT },
                ],
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": analysis_schema(),
                "temperature": self.config.temperature,
            },
        });

        let response = self
            .generate_content(&self.config.analysis_model, body)
            .await?;
        response.text().ok_or(CollaboratorError::EmptyResponse)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": format!("{prompt}, {IMAGE_STYLE_SUFFIX}") }],
            }],
        });

        let response = self.generate_content(&self.config.image_model, body).await?;
        if response.parts().next().is_none() {
            return Err(CollaboratorError::EmptyResponse);
        }
        response.first_image().ok_or(CollaboratorError::NoImagePayload)
    }
}
