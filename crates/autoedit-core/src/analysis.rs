use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{error, info};

use crate::{
    error::AnalysisFailure,
    gemini::VideoAnalyzer,
    types::{AnalysisResult, BRollSegment, BRollStatus, Caption},
};

/// The model's answer, before ids and statuses are assigned.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub title: String,
    pub summary: String,
    pub captions: Vec<Caption>,
    pub b_roll: Vec<SuggestedBRoll>,
}

/// A B-roll suggestion as the model returns it. Its `id` is not trusted to be
/// unique and any extra fields (such as a `status`) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedBRoll {
    pub id: String,
    pub start_time: f64,
    pub end_time: f64,
    pub description: String,
    pub image_prompt: String,
}

fn check_window(
    kind: &'static str,
    index: usize,
    start_time: f64,
    end_time: f64,
) -> Result<(), AnalysisFailure> {
    let valid = start_time.is_finite() && end_time.is_finite() && 0.0 <= start_time && start_time < end_time;
    if valid {
        Ok(())
    } else {
        Err(AnalysisFailure::InvalidInterval {
            kind,
            index,
            start_time,
            end_time,
        })
    }
}

/// Turn a parsed response into a session-ready result.
///
/// Every B-roll entry gets `broll-<index>-<ingested_at_ms>` as its id and
/// starts out `Pending`.
pub fn materialize(
    response: AnalysisResponse,
    ingested_at_ms: u128,
) -> Result<AnalysisResult, AnalysisFailure> {
    for (index, caption) in response.captions.iter().enumerate() {
        check_window("caption", index, caption.start_time, caption.end_time)?;
    }
    for (index, b_roll) in response.b_roll.iter().enumerate() {
        check_window("bRoll", index, b_roll.start_time, b_roll.end_time)?;
    }

    let b_roll = response
        .b_roll
        .into_iter()
        .enumerate()
        .map(|(index, suggested)| BRollSegment {
            id: format!("broll-{index}-{ingested_at_ms}"),
            start_time: suggested.start_time,
            end_time: suggested.end_time,
            description: suggested.description,
            image_prompt: suggested.image_prompt,
            status: BRollStatus::Pending,
        })
        .collect();

    Ok(AnalysisResult {
        title: response.title,
        summary: response.summary,
        captions: response.captions,
        b_roll,
    })
}

/// Parse the model's JSON text and materialize it.
pub fn parse_analysis(text: &str, ingested_at_ms: u128) -> Result<AnalysisResult, AnalysisFailure> {
    let response: AnalysisResponse = serde_json::from_str(text)?;
    materialize(response, ingested_at_ms)
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Run the single analysis call. No retries; a failure leaves nothing behind.
pub async fn submit(
    analyzer: &dyn VideoAnalyzer,
    bytes: &[u8],
    mime_type: &str,
) -> Result<AnalysisResult, AnalysisFailure> {
    info!(mime_type, size = bytes.len(), "Submitting video for analysis");

    let outcome = match analyzer.analyze(bytes, mime_type).await {
        Ok(text) => parse_analysis(&text, now_ms()),
        Err(e) => Err(e.into()),
    };

    match &outcome {
        Ok(result) => info!(
            title = %result.title,
            captions = result.captions.len(),
            b_roll = result.b_roll.len(),
            "Analysis finished"
        ),
        Err(e) => error!(error = %e, "Analysis failed"),
    }

    outcome
}
