//! Autoedit Core Library
//!
//! Captions and AI-generated B-roll stills, kept in step with a video's
//! playback clock.

pub mod analysis;
pub mod broll;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod gemini;
pub mod intake;
pub mod overlay;
pub mod session;
pub mod timeline;
pub mod types;

// Re-export commonly used items at crate root
pub use analysis::submit;
pub use broll::{BRollBoard, BRollCollection, GenerationEvent};
pub use cache::{get_analysis_path, get_cache_dir, get_root_cache_dir, load_analysis, save_analysis, save_image};
pub use clock::{ClockError, MediaClock, PlaybackController, SimulatedClock};
pub use config::{EditorConfig, GeminiConfig};
pub use error::{AnalysisFailure, AutoEditError, CollaboratorError, IntakeError, Result};
pub use format::{format_analysis_readable, format_overlay, format_timeline, format_timestamp};
pub use gemini::{GeminiClient, ImageGenerator, VideoAnalyzer};
pub use intake::{MediaUpload, load_upload};
pub use overlay::resolve;
pub use session::{AppPhase, EditSession, OverlayFrame, Studio};
pub use timeline::{offset_from_position, position_from_offset};
pub use types::{ActiveOverlay, AnalysisResult, BRollSegment, BRollStatus, Caption, PlaybackState};
