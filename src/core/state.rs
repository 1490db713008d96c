//! Play mode state and session configuration.

use serde::{Deserialize, Serialize};

/// Upper bound for [`PlayModeConfig::time_scale`]
pub const MAX_TIME_SCALE: f64 = 10.0;

/// Play mode states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayModeState {
    /// Normal editor mode
    #[default]
    Stopped,
    /// Transitioning to play mode
    Starting,
    Playing,
    Paused,
    /// Transitioning back to editor mode
    Stopping,
}

impl PlayModeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayModeState::Stopped => "Stopped",
            PlayModeState::Starting => "Starting",
            PlayModeState::Playing => "Playing",
            PlayModeState::Paused => "Paused",
            PlayModeState::Stopping => "Stopping",
        }
    }

    /// Anything but `Stopped` counts as play mode, bookends included.
    pub fn is_in_play_mode(&self) -> bool {
        !matches!(self, PlayModeState::Stopped)
    }
}

impl std::fmt::Display for PlayModeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Play mode configuration.
///
/// One copy is persisted as the editor default; `play()` copies it (or a
/// caller-supplied one) into the active session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayModeConfig {
    /// Start from current scene vs beginning of the timeline
    pub start_from_current_scene: bool,
    pub maximize_scene_view: bool,
    pub mute_audio: bool,
    pub show_debug_overlay: bool,
    /// Pause when a script error is reported
    pub pause_on_error: bool,
    pub enable_breakpoints: bool,
    pub time_scale: f64,
    /// Override start scene (empty = current)
    pub start_scene_id: String,
    pub enabled_debug_views: Vec<String>,
}

impl Default for PlayModeConfig {
    fn default() -> Self {
        Self {
            start_from_current_scene: true,
            maximize_scene_view: false,
            mute_audio: false,
            show_debug_overlay: true,
            pause_on_error: true,
            enable_breakpoints: true,
            time_scale: 1.0,
            start_scene_id: String::new(),
            enabled_debug_views: Vec::new(),
        }
    }
}

/// Clamp a requested time scale into `[0, MAX_TIME_SCALE]`.
///
/// NaN maps to 0 so a bad slider value freezes time instead of poisoning stats.
pub fn clamp_time_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 0.0;
    }
    scale.clamp(0.0, MAX_TIME_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_mode_membership() {
        assert!(!PlayModeState::Stopped.is_in_play_mode());
        for state in [
            PlayModeState::Starting,
            PlayModeState::Playing,
            PlayModeState::Paused,
            PlayModeState::Stopping,
        ] {
            assert!(state.is_in_play_mode(), "{state} should be play mode");
        }
    }

    #[test]
    fn test_clamp_time_scale() {
        assert_eq!(clamp_time_scale(15.0), 10.0);
        assert_eq!(clamp_time_scale(-5.0), 0.0);
        assert_eq!(clamp_time_scale(2.5), 2.5);
        assert_eq!(clamp_time_scale(f64::NAN), 0.0);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let cfg: PlayModeConfig = serde_json::from_str(r#"{"mute_audio": true}"#).unwrap();
        assert!(cfg.mute_audio);
        assert!(cfg.pause_on_error);
        assert_eq!(cfg.time_scale, 1.0);
    }
}
