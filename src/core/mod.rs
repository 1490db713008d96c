//! Core play mode modules - state machine, breakpoints, events, playback
//!
//! These modules form the play-in-editor engine, independent of UI.

pub mod breakpoints;
pub mod event_bus;
pub mod listener;
pub mod overlay;
pub mod play_mode;
pub mod play_mode_events;
pub mod playback;
pub mod player_events;
pub mod session_recorder;
pub mod snapshot;
pub mod state;
pub mod stats;

// Re-exports for convenience
pub use breakpoints::{Breakpoint, BreakpointCondition, BreakpointRegistry};
pub use event_bus::EventBus;
pub use listener::{ListenerId, PlayModeListener};
pub use play_mode::PlayModeController;
pub use playback::{TimelinePlayback, TimelinePlaybackEngine};
pub use snapshot::{SceneSnapshot, SceneStore};
pub use state::{PlayModeConfig, PlayModeState};
pub use stats::PlayModeStats;
