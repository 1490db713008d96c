//! View models for the play mode toolbar and debug overlay.
//!
//! Plain data snapshots so UI code never holds a borrow on the controller.

use indexmap::IndexMap;
use serde::Serialize;

use super::state::PlayModeState;

/// Speed choices offered by the toolbar dropdown
pub const SPEED_PRESETS: [f64; 5] = [0.25, 0.5, 1.0, 2.0, 4.0];

/// Toolbar label for a time scale, e.g. `0.25x`, `2x`
pub fn speed_label(scale: f64) -> String {
    format!("{}x", scale)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolbarState {
    /// Play from stopped, or resume a manual pause
    pub can_play: bool,
    pub can_pause: bool,
    pub can_stop: bool,
    pub can_step: bool,
    pub can_continue: bool,
    pub at_breakpoint: bool,
    pub time_scale: f64,
    #[serde(skip)]
    pub speed_presets: &'static [f64],
}

impl ToolbarState {
    /// Preset matching the current scale, if any
    pub fn active_preset(&self) -> Option<usize> {
        self.speed_presets
            .iter()
            .position(|p| (p - self.time_scale).abs() < f64::EPSILON)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugOverlay {
    pub state: PlayModeState,
    pub play_time: f64,
    pub fps: f64,
    pub frame_count: u32,
    pub current_node: String,
    pub current_scene: String,
    pub breakpoint_id: Option<String>,
    pub variables: IndexMap<String, String>,
    pub debug_views: Vec<String>,
}

impl DebugOverlay {
    /// Overlay text lines, top to bottom
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("{}  {:.2}s  {:.1} fps  #{}", self.state, self.play_time, self.fps, self.frame_count),
            format!("scene: {}  node: {}", self.current_scene, self.current_node),
        ];
        if let Some(bp) = &self.breakpoint_id {
            lines.push(format!("breakpoint: {}", bp));
        }
        lines.extend(self.variables.iter().map(|(k, v)| format!("  {} = {}", k, v)));
        lines
    }
}
