//! Persisted editor settings for play mode.
//!
//! Stored as pretty JSON in `novelplay.json` (see [`crate::paths`]). Missing
//! fields fall back to defaults so older files keep loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::breakpoints::Breakpoint;
use crate::core::play_mode::PlayModeController;
use crate::core::state::PlayModeConfig;

pub const SETTINGS_FILE: &str = "novelplay.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Config copied into each session by `play()`
    pub play_mode: PlayModeConfig,
    /// Breakpoints survive editor restarts
    pub breakpoints: Vec<Breakpoint>,
    /// Scene opened when the editor starts
    pub last_scene: String,
}

impl EditorSettings {
    /// Load settings, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        debug!("Loaded settings from {} ({} breakpoints)", path.display(), settings.breakpoints.len());
        Ok(settings)
    }

    /// Like [`Self::load`] but logs and falls back to defaults on error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("{:#}", e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Failed to write settings: {}", path.display()))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Push defaults, breakpoints and the open scene into a controller.
    pub fn apply_to(&self, controller: &mut PlayModeController) {
        controller.set_default_config(self.play_mode.clone());
        controller.set_editor_scene(self.last_scene.clone());
        for bp in &self.breakpoints {
            controller.restore_breakpoint(bp.clone());
        }
    }

    /// Capture the controller's persistent state.
    pub fn capture_from(&mut self, controller: &PlayModeController) {
        self.play_mode = controller.default_config().clone();
        self.breakpoints = controller.breakpoints().to_vec();
        self.last_scene = controller.editor_scene().to_string();
    }
}
