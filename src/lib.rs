//! NovelPlay - play-in-editor controller for visual novel authoring
//!
//! Re-exports all modules for use by binary targets.

// Core engine (state machine, breakpoints, events, playback)
pub mod core;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod main_events;
pub mod paths;
pub mod runner;

// Re-export commonly used types from core
pub use crate::core::event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter};
pub use crate::core::play_mode::{PlayModeController, ScriptError};
pub use crate::core::playback::{TimelinePlayback, TimelinePlaybackEngine};
pub use crate::core::state::{PlayModeConfig, PlayModeState};
