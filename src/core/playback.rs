//! Timeline playback seam driven by the play mode controller.
//!
//! The controller never advances time itself. It issues transport commands
//! through [`TimelinePlayback`] and feeds the already time-scaled frame delta
//! into [`TimelinePlayback::update`].
//!
//! # Timing Model
//!
//! Seconds-based playhead. `update()` advances the playhead by the delta it
//! receives; the controller has already multiplied that delta by its time
//! scale, so `speed` is informational for the engine (displayed by the
//! transport bar) and is not applied a second time.

use log::trace;

/// Transport commands the play mode controller needs from a timeline.
pub trait TimelinePlayback: Send {
    fn play(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);

    /// Playback speed multiplier (already clamped by the caller)
    fn set_speed(&mut self, speed: f64);

    /// Rewind playhead to the start of the timeline
    fn jump_to_start(&mut self);

    /// Move playhead to `time` seconds
    fn seek_to(&mut self, time: f64);

    /// Current playhead in seconds
    fn current_time(&self) -> f64;

    /// Advance by a pre-scaled delta (seconds)
    fn update(&mut self, delta: f64);
}

/// Transport state of [`TimelinePlaybackEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Default timeline engine: a playhead over `[0, duration]`.
///
/// `duration == 0.0` means open-ended (no clamp, no loop).
#[derive(Debug, Clone)]
pub struct TimelinePlaybackEngine {
    state: TransportState,
    speed: f64,
    current_time: f64,
    duration: f64,
    loop_enabled: bool,
}

impl Default for TimelinePlaybackEngine {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TimelinePlaybackEngine {
    pub fn new(duration: f64) -> Self {
        Self {
            state: TransportState::Stopped,
            speed: 1.0,
            current_time: 0.0,
            duration: duration.max(0.0),
            loop_enabled: false,
        }
    }

    pub fn with_loop(mut self, enabled: bool) -> Self {
        self.loop_enabled = enabled;
        self
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    fn clamp_time(&self, time: f64) -> f64 {
        if self.duration > 0.0 {
            time.clamp(0.0, self.duration)
        } else {
            time.max(0.0)
        }
    }
}

impl TimelinePlayback for TimelinePlaybackEngine {
    fn play(&mut self) {
        self.state = TransportState::Playing;
        trace!("Timeline play at {:.3}s", self.current_time);
    }

    fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
            trace!("Timeline paused at {:.3}s", self.current_time);
        }
    }

    fn resume(&mut self) {
        if self.state == TransportState::Paused {
            self.state = TransportState::Playing;
            trace!("Timeline resumed at {:.3}s", self.current_time);
        }
    }

    /// Stop halts the transport but leaves the playhead where it is;
    /// restoring position is the caller's business (scene snapshot).
    fn stop(&mut self) {
        self.state = TransportState::Stopped;
        trace!("Timeline stopped at {:.3}s", self.current_time);
    }

    fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    fn jump_to_start(&mut self) {
        self.current_time = 0.0;
    }

    fn seek_to(&mut self, time: f64) {
        self.current_time = self.clamp_time(time);
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn update(&mut self, delta: f64) {
        if self.state != TransportState::Playing {
            return;
        }

        let next = self.current_time + delta;
        if self.duration > 0.0 && next > self.duration {
            if self.loop_enabled {
                trace!("Timeline loop: {:.3}s -> start", next);
                self.current_time = next % self.duration;
            } else {
                trace!("Reached timeline end, stopping");
                self.current_time = self.duration;
                self.state = TransportState::Stopped;
            }
        } else {
            self.current_time = next.max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_only_while_playing() {
        let mut engine = TimelinePlaybackEngine::new(10.0);
        engine.update(1.0);
        assert_eq!(engine.current_time(), 0.0);

        engine.play();
        engine.update(1.5);
        assert_eq!(engine.current_time(), 1.5);

        engine.pause();
        engine.update(1.0);
        assert_eq!(engine.current_time(), 1.5);

        engine.resume();
        engine.update(0.5);
        assert_eq!(engine.current_time(), 2.0);
    }

    #[test]
    fn test_stops_at_end_without_loop() {
        let mut engine = TimelinePlaybackEngine::new(2.0);
        engine.play();
        engine.update(3.0);
        assert_eq!(engine.current_time(), 2.0);
        assert_eq!(engine.state(), TransportState::Stopped);
    }

    #[test]
    fn test_loops_at_end() {
        let mut engine = TimelinePlaybackEngine::new(2.0).with_loop(true);
        engine.play();
        engine.update(2.5);
        assert!((engine.current_time() - 0.5).abs() < 1e-9);
        assert_eq!(engine.state(), TransportState::Playing);
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut engine = TimelinePlaybackEngine::new(5.0);
        engine.seek_to(8.0);
        assert_eq!(engine.current_time(), 5.0);
        engine.seek_to(-1.0);
        assert_eq!(engine.current_time(), 0.0);

        let mut open = TimelinePlaybackEngine::default();
        open.seek_to(100.0);
        assert_eq!(open.current_time(), 100.0);
    }

    #[test]
    fn test_stop_keeps_playhead() {
        let mut engine = TimelinePlaybackEngine::new(10.0);
        engine.play();
        engine.update(4.0);
        engine.stop();
        assert_eq!(engine.current_time(), 4.0);
        engine.jump_to_start();
        assert_eq!(engine.current_time(), 0.0);
    }
}
