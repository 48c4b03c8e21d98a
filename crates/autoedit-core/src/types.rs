use serde::{Deserialize, Serialize};

/// A timed transcript fragment shown on screen during its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl Caption {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
        }
    }

    /// Closed interval check: both edges count as inside.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

/// Lifecycle of a single B-roll image.
///
/// Serialized flat next to the segment fields, so a completed segment reads
/// `{"status": "completed", "generatedImageUrl": "data:..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BRollStatus {
    Pending,
    Generating,
    Completed {
        #[serde(rename = "generatedImageUrl")]
        image_url: String,
    },
    Failed,
}

impl BRollStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BRollStatus::Pending => "pending",
            BRollStatus::Generating => "generating",
            BRollStatus::Completed { .. } => "completed",
            BRollStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BRollSegment {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub description: String,
    pub image_prompt: String,
    #[serde(flatten)]
    pub status: BRollStatus,
}

impl BRollSegment {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    pub fn generated_image_url(&self) -> Option<&str> {
        match &self.status {
            BRollStatus::Completed { image_url } => Some(image_url),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, BRollStatus::Completed { .. })
    }
}

/// Everything one analysis call produced, with B-roll ids already assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub title: String,
    pub summary: String,
    pub captions: Vec<Caption>,
    pub b_roll: Vec<BRollSegment>,
}

/// Playback position as seen by the composition root.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
}

/// The pieces of a frame that sit on top of the video.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActiveOverlay<'a> {
    pub caption: Option<&'a Caption>,
    pub b_roll: Option<&'a BRollSegment>,
}
