//! Playback clock boundary.
//!
//! The media engine is not ours; it reports positions and accepts play,
//! pause and seek. [`PlaybackController`] is the single owner of
//! [`PlaybackState`] and reconciles the two writers of `current_time`:
//! positions reported by the engine are taken as-is, while seeks from the UI
//! are written back to the engine only when they diverge from what it
//! reports by more than the configured tolerance.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{timeline, types::PlaybackState};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    #[error("Playback was rejected: {0}")]
    PlayRejected(String),
}

/// What the core needs from a media engine.
pub trait MediaClock {
    /// Position the engine is currently at, in seconds.
    fn position(&self) -> f64;
    /// Total length once known.
    fn duration(&self) -> Option<f64>;
    fn play(&mut self) -> Result<(), ClockError>;
    fn pause(&mut self);
    fn seek(&mut self, position: f64);
}

pub struct PlaybackController<C> {
    clock: C,
    state: PlaybackState,
    seek_tolerance: f64,
}

impl<C: MediaClock> PlaybackController<C> {
    pub fn new(clock: C, seek_tolerance: f64) -> Self {
        let mut controller = Self {
            clock,
            state: PlaybackState::default(),
            seek_tolerance,
        };
        if let Some(duration) = controller.clock.duration() {
            controller.on_duration_known(duration);
        }
        controller
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn clamp(&self, position: f64) -> f64 {
        if self.state.duration > 0.0 {
            position.clamp(0.0, self.state.duration)
        } else {
            0.0
        }
    }

    /// One-time notification that the media length is known.
    pub fn on_duration_known(&mut self, duration: f64) {
        self.state.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.state.current_time = self.clamp(self.state.current_time);
    }

    /// A position pushed by the engine. Always accepted.
    pub fn on_position(&mut self, position: f64) {
        self.state.current_time = self.clamp(position);
    }

    /// The engine reached the end of the media.
    pub fn on_ended(&mut self) {
        self.state.is_playing = false;
    }

    /// Pull the latest position from the engine.
    pub fn sync(&mut self) -> f64 {
        let position = self.clock.position();
        self.on_position(position);
        self.state.current_time
    }

    /// Move playback to `position`. Ignored until the duration is known.
    ///
    /// Returns whether the request was accepted.
    pub fn seek_to(&mut self, position: f64) -> bool {
        if self.state.duration <= 0.0 || !position.is_finite() {
            return false;
        }

        let target = self.clamp(position);
        self.state.current_time = target;

        let drift = (self.clock.position() - target).abs();
        if drift > self.seek_tolerance {
            debug!(position = target, drift, "Writing seek back to media clock");
            self.clock.seek(target);
        } else {
            debug!(position = target, drift, "Seek within tolerance, clock left alone");
        }
        true
    }

    /// Seek from a click or drag on the timeline track.
    pub fn scrub(&mut self, pixel_offset: f64, track_width: f64) -> bool {
        match timeline::seek_target(pixel_offset, track_width, self.state.duration) {
            Some(position) => self.seek_to(position),
            None => false,
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        if !playing {
            self.clock.pause();
            self.state.is_playing = false;
            return;
        }

        match self.clock.play() {
            Ok(()) => self.state.is_playing = true,
            Err(e) => {
                warn!(error = %e, "Play rejected, staying paused");
                self.state.is_playing = false;
            }
        }
    }

    pub fn toggle_play(&mut self) {
        self.set_playing(!self.state.is_playing);
    }
}

/// A wall-clock driven stand-in for a media engine.
#[derive(Debug)]
pub struct SimulatedClock {
    position: f64,
    duration: f64,
    rate: f64,
    started_at: Option<Instant>,
}

impl SimulatedClock {
    pub fn new(duration: f64) -> Self {
        Self {
            position: 0.0,
            duration,
            rate: 1.0,
            started_at: None,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Move the clock forward by `seconds` of media time.
    pub fn advance(&mut self, seconds: f64) {
        self.position = (self.position + seconds).clamp(0.0, self.duration);
    }

    /// Fold elapsed wall time into the position.
    fn settle(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.advance(started_at.elapsed().as_secs_f64() * self.rate);
            self.started_at = Some(Instant::now());
        }
    }

    pub fn has_ended(&self) -> bool {
        MediaClock::position(self) >= self.duration
    }
}

impl MediaClock for SimulatedClock {
    fn position(&self) -> f64 {
        match self.started_at {
            Some(started_at) => {
                (self.position + started_at.elapsed().as_secs_f64() * self.rate)
                    .clamp(0.0, self.duration)
            }
            None => self.position,
        }
    }

    fn duration(&self) -> Option<f64> {
        (self.duration > 0.0).then_some(self.duration)
    }

    fn play(&mut self) -> Result<(), ClockError> {
        if self.duration <= 0.0 {
            return Err(ClockError::PlayRejected("no media loaded".into()));
        }
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.settle();
        self.started_at = None;
    }

    fn seek(&mut self, position: f64) {
        self.settle();
        self.position = position.clamp(0.0, self.duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every seek it receives.
    #[derive(Default)]
    struct RecordingClock {
        position: f64,
        duration: Option<f64>,
        reject_play: bool,
        seeks: Vec<f64>,
    }

    impl MediaClock for RecordingClock {
        fn position(&self) -> f64 {
            self.position
        }
        fn duration(&self) -> Option<f64> {
            self.duration
        }
        fn play(&mut self) -> Result<(), ClockError> {
            if self.reject_play {
                Err(ClockError::PlayRejected("autoplay blocked".into()))
            } else {
                Ok(())
            }
        }
        fn pause(&mut self) {}
        fn seek(&mut self, position: f64) {
            self.position = position;
            self.seeks.push(position);
        }
    }

    fn loaded(duration: f64) -> PlaybackController<RecordingClock> {
        PlaybackController::new(
            RecordingClock {
                duration: Some(duration),
                ..Default::default()
            },
            0.5,
        )
    }

    #[test]
    fn seek_is_ignored_before_duration_is_known() {
        let mut controller = PlaybackController::new(RecordingClock::default(), 0.5);
        assert!(!controller.seek_to(12.0));
        assert_eq!(controller.state().current_time, 0.0);
        assert!(controller.clock().seeks.is_empty());
    }

    #[test]
    fn position_is_pinned_to_zero_without_duration() {
        let mut controller = PlaybackController::new(RecordingClock::default(), 0.5);
        controller.on_position(7.0);
        assert_eq!(controller.state().current_time, 0.0);
    }

    #[test]
    fn large_seek_is_written_back() {
        let mut controller = loaded(100.0);
        assert!(controller.seek_to(40.0));
        assert_eq!(controller.state().current_time, 40.0);
        assert_eq!(controller.clock().seeks, vec![40.0]);
    }

    #[test]
    fn small_drift_does_not_seek() {
        let mut controller = loaded(100.0);
        controller.clock_mut().position = 10.2;
        controller.on_position(10.2);

        assert!(controller.seek_to(10.5));
        assert_eq!(controller.state().current_time, 10.5);
        assert!(controller.clock().seeks.is_empty());
    }

    #[test]
    fn engine_positions_are_accepted_and_clamped() {
        let mut controller = loaded(100.0);
        controller.on_position(33.3);
        assert_eq!(controller.state().current_time, 33.3);
        controller.on_position(250.0);
        assert_eq!(controller.state().current_time, 100.0);
    }

    #[test]
    fn seek_beyond_end_is_clamped() {
        let mut controller = loaded(100.0);
        controller.seek_to(500.0);
        assert_eq!(controller.state().current_time, 100.0);
    }

    #[test]
    fn rejected_play_falls_back_to_paused() {
        let mut controller = PlaybackController::new(
            RecordingClock {
                duration: Some(10.0),
                reject_play: true,
                ..Default::default()
            },
            0.5,
        );
        controller.set_playing(true);
        assert!(!controller.state().is_playing);
    }

    #[test]
    fn scrub_projects_offset_through_duration() {
        let mut controller = loaded(120.0);
        assert!(controller.scrub(50.0, 200.0));
        assert_eq!(controller.state().current_time, 30.0);
        assert!(controller.scrub(-50.0, 200.0));
        assert_eq!(controller.state().current_time, 0.0);
    }

    #[test]
    fn ended_stops_playback() {
        let mut controller = loaded(10.0);
        controller.toggle_play();
        assert!(controller.state().is_playing);
        controller.on_ended();
        assert!(!controller.state().is_playing);
    }

    #[test]
    fn simulated_clock_advances_and_seeks() {
        let mut clock = SimulatedClock::new(10.0);
        assert_eq!(clock.duration(), Some(10.0));
        clock.advance(4.0);
        assert_eq!(clock.position(), 4.0);
        clock.seek(9.0);
        clock.advance(5.0);
        assert_eq!(clock.position(), 10.0);
        assert!(clock.has_ended());
    }

    #[test]
    fn empty_simulated_clock_rejects_play() {
        let mut clock = SimulatedClock::new(0.0);
        assert!(clock.play().is_err());
        assert_eq!(clock.duration(), None);
    }
}
