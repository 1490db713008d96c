//! Scene state captured on entering play mode and restored on exit.
//!
//! The controller owns at most one [`SceneSnapshot`]. Timeline position is
//! always captured; opaque scene bytes are only captured when the editor
//! installs a [`SceneStore`].

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Snapshot of scene state for restoration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub scene_id: String,
    /// Serialized scene state from the [`SceneStore`]
    pub serialized_data: Vec<u8>,
    pub timeline_position: f64,
    pub selected_objects: Vec<String>,
}

/// Editor-side scene serialization used around a play session.
///
/// `capture` runs while the controller is `Starting`, `restore` while it is
/// `Stopping`. Failures are logged by the controller and never abort the
/// transition.
pub trait SceneStore: Send {
    fn capture(&mut self, scene_id: &str) -> Result<Vec<u8>>;
    fn restore(&mut self, scene_id: &str, data: &[u8]) -> Result<()>;
}
