//! Application module - EditorApp owns the play mode controller.
//!
//! - `events` - event bus polling and dispatch (handle_events)
//!
//! There is one controller per editor instance. Panels get at it through
//! the app, or talk to it through the event bus.

mod events;

use std::path::PathBuf;

use anyhow::Result;
use log::{debug, error, info};

use crate::config::{EditorSettings, SETTINGS_FILE};
use crate::core::event_bus::EventBus;
use crate::core::play_mode::PlayModeController;
use crate::core::playback::TimelinePlayback;
use crate::paths::{self, PathConfig};

/// Main application state.
///
/// Contains the runtime state for the editor's play mode:
/// - The controller and its playback engine
/// - Persisted settings (defaults, breakpoints)
/// - Event bus for decoupled communication with panels
pub struct EditorApp {
    pub controller: PlayModeController,
    pub settings: EditorSettings,
    pub path_config: PathConfig,
    /// Global event bus for application-wide events
    pub event_bus: EventBus,
    /// Set by handlers that touched persistent state
    settings_dirty: bool,
}

impl EditorApp {
    /// Build the app and load settings from the configured location.
    pub fn new<P: TimelinePlayback + 'static>(playback: P, path_config: PathConfig) -> Self {
        let settings = EditorSettings::load_or_default(&paths::config_file(SETTINGS_FILE, &path_config));
        Self::with_settings(playback, settings, path_config)
    }

    pub fn with_settings<P: TimelinePlayback + 'static>(
        playback: P,
        settings: EditorSettings,
        path_config: PathConfig,
    ) -> Self {
        let event_bus = EventBus::new();
        let mut controller = PlayModeController::new(playback, event_bus.emitter());
        settings.apply_to(&mut controller);
        info!(
            "Editor ready: {} breakpoints, time scale {}",
            controller.breakpoints().len(),
            controller.default_config().time_scale
        );

        Self {
            controller,
            settings,
            path_config,
            event_bus,
            settings_dirty: false,
        }
    }

    /// One editor frame: dispatch queued commands, then tick play mode.
    pub fn run_frame(&mut self, delta_time: f64) {
        self.handle_events();
        self.controller.update(delta_time);
    }

    pub fn settings_path(&self) -> PathBuf {
        paths::config_file(SETTINGS_FILE, &self.path_config)
    }

    pub fn settings_dirty(&self) -> bool {
        self.settings_dirty
    }

    pub fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    /// Write controller defaults and breakpoints to disk.
    pub fn save_settings(&mut self) -> Result<()> {
        self.settings.capture_from(&self.controller);
        paths::ensure_dirs(&self.path_config)?;
        self.settings.save(&self.settings_path())?;
        self.settings_dirty = false;
        Ok(())
    }

    /// Persist pending changes and shut the controller down.
    pub fn shutdown(&mut self) {
        if self.settings_dirty
            && let Err(e) = self.save_settings()
        {
            error!("Failed to save settings on exit: {:#}", e);
        }
        self.controller.shutdown();
        self.event_bus.clear();
        debug!("EditorApp shut down");
    }
}
