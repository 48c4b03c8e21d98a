//! Composition root: owns the analysis output, the B-roll board and the
//! playback controller, and answers "what is on screen right now".

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::{
    analysis,
    broll::{BRollBoard, BRollCollection},
    clock::{MediaClock, PlaybackController},
    config::EditorConfig,
    error::AnalysisFailure,
    gemini::{ImageGenerator, VideoAnalyzer},
    intake::MediaUpload,
    overlay,
    types::{ActiveOverlay, AnalysisResult, BRollSegment, BRollStatus, Caption, PlaybackState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Idle,
    Analyzing,
    Editing,
}

/// Owned copy of the overlay at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    pub time: f64,
    pub caption: Option<Caption>,
    pub b_roll: Option<BRollSegment>,
}

impl OverlayFrame {
    pub fn as_overlay(&self) -> ActiveOverlay<'_> {
        ActiveOverlay {
            caption: self.caption.as_ref(),
            b_roll: self.b_roll.as_ref(),
        }
    }

    /// Whether the visible overlay differs from `other`, ignoring time.
    pub fn differs_from(&self, other: &OverlayFrame) -> bool {
        self.caption != other.caption || self.b_roll != other.b_roll
    }
}

pub struct EditSession<C> {
    session_id: Uuid,
    title: String,
    summary: String,
    captions: Arc<[Caption]>,
    board: BRollBoard,
    playback: PlaybackController<C>,
}

impl<C: MediaClock> EditSession<C> {
    pub fn new(
        result: AnalysisResult,
        images: Arc<dyn ImageGenerator>,
        clock: C,
        config: &EditorConfig,
    ) -> Self {
        // A segment saved mid-call has no call left to finish it.
        let b_roll = result
            .b_roll
            .into_iter()
            .map(|mut segment| {
                if segment.status == BRollStatus::Generating {
                    segment.status = BRollStatus::Failed;
                }
                segment
            })
            .collect();

        Self {
            session_id: Uuid::new_v4(),
            title: result.title,
            summary: result.summary,
            captions: result.captions.into(),
            board: BRollBoard::new(b_roll, images),
            playback: PlaybackController::new(clock, config.seek_tolerance),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn board(&self) -> &BRollBoard {
        &self.board
    }

    pub fn b_roll(&self) -> BRollCollection {
        self.board.snapshot()
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<C> {
        &mut self.playback
    }

    /// Overlay for the current position against the latest committed B-roll.
    pub fn frame(&self) -> OverlayFrame {
        let time = self.playback.state().current_time;
        let b_roll = self.board.snapshot();
        let active = overlay::resolve(time, &self.captions, &b_roll);
        OverlayFrame {
            time,
            caption: active.caption.cloned(),
            b_roll: active.b_roll.cloned(),
        }
    }

    /// Pull the clock position, stop at the end, and resolve the overlay.
    pub fn tick(&mut self) -> OverlayFrame {
        let time = self.playback.sync();
        let state = self.playback.state();
        if state.is_playing && state.duration > 0.0 && time >= state.duration {
            self.playback.set_playing(false);
        }
        self.frame()
    }

    pub fn generate(&self, id: &str) -> Option<JoinHandle<()>> {
        let _span = info_span!("generate", session = %self.session_id).entered();
        self.board.trigger(id)
    }

    pub fn generate_all(&self) -> Vec<JoinHandle<()>> {
        let _span = info_span!("generate_all", session = %self.session_id).entered();
        self.board.trigger_all()
    }

    /// Jump to a caption or segment start from a list view.
    pub fn jump_to(&mut self, time: f64) -> bool {
        self.playback.seek_to(time)
    }

    pub fn scrub(&mut self, pixel_offset: f64, track_width: f64) -> bool {
        self.playback.scrub(pixel_offset, track_width)
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playback.set_playing(playing);
    }

    pub fn toggle_play(&mut self) {
        self.playback.toggle_play();
    }

    /// The session as a serializable result, with the latest B-roll state.
    pub fn to_result(&self) -> AnalysisResult {
        AnalysisResult {
            title: self.title.clone(),
            summary: self.summary.clone(),
            captions: self.captions.to_vec(),
            b_roll: self.board.snapshot().to_vec(),
        }
    }
}

/// Top-level app state: idle until a file is analyzed, then editing.
pub struct Studio {
    analyzer: Arc<dyn VideoAnalyzer>,
    images: Arc<dyn ImageGenerator>,
    config: EditorConfig,
    phase: AppPhase,
}

impl Studio {
    pub fn new(
        analyzer: Arc<dyn VideoAnalyzer>,
        images: Arc<dyn ImageGenerator>,
        config: EditorConfig,
    ) -> Self {
        Self {
            analyzer,
            images,
            config,
            phase: AppPhase::Idle,
        }
    }

    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Analyze an upload and open an editing session on it.
    ///
    /// `make_clock` builds the playback clock once the result is known. On
    /// failure the studio returns to `Idle` with nothing kept.
    pub async fn open<C, F>(
        &mut self,
        upload: &MediaUpload,
        make_clock: F,
    ) -> Result<EditSession<C>, AnalysisFailure>
    where
        C: MediaClock,
        F: FnOnce(&AnalysisResult) -> C,
    {
        self.phase = AppPhase::Analyzing;
        info!(path = %upload.path.display(), "Analyzing upload");

        match analysis::submit(self.analyzer.as_ref(), &upload.bytes, &upload.mime_type).await {
            Ok(result) => {
                let clock = make_clock(&result);
                Ok(self.resume(result, clock))
            }
            Err(e) => {
                self.phase = AppPhase::Idle;
                Err(e)
            }
        }
    }

    /// Open a session on a result that was analyzed earlier.
    pub fn resume<C: MediaClock>(&mut self, result: AnalysisResult, clock: C) -> EditSession<C> {
        self.phase = AppPhase::Editing;
        EditSession::new(result, Arc::clone(&self.images), clock, &self.config)
    }

    pub fn close(&mut self) {
        self.phase = AppPhase::Idle;
    }
}
