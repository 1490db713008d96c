//! Play Mode Controller: play-in-editor state machine.
//!
//! Manages the play-in-editor workflow:
//! 1. Captures editor state before entering play mode
//! 2. Drives the timeline playback engine
//! 3. Handles play/pause/stop controls
//! 4. Manages debug features (breakpoints, stepping)
//! 5. Restores editor state when exiting play mode
//!
//! # State Machine
//!
//! ```text
//! Stopped  --play()-->              Starting --(auto)--> Playing
//! Playing  --pause()-->             Paused
//! Paused   --resume()-->            Playing   (rejected at a breakpoint)
//! Paused   --continue_execution()-> Playing
//! any play state --stop()-->        Stopping --(auto)--> Stopped
//! ```
//!
//! Calls that don't apply to the current state are silent no-ops. The
//! controller never returns an error for misuse.
//!
//! # Notifications
//!
//! Every state change reaches listeners twice: the generic
//! `on_play_mode_state_changed` callback, then the specific lifecycle callback.
//! A [`PlayModeStateChangedEvent`] is also published on the event bus.
//! Listeners are called synchronously before the triggering method returns.
//!
//! # Breakpoints
//!
//! A breakpoint fires once per arrival at its node: `jump_to_node()` arms the
//! check, a hit disarms it until the next jump. Hit count and `hit_once`
//! removal are applied before the pause so listeners see final state.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use log::{debug, error, info, trace, warn};

use super::breakpoints::{Breakpoint, BreakpointCondition, BreakpointRegistry};
use super::event_bus::EventEmitter;
use super::listener::{ListenerId, ListenerRegistry, PlayModeListener};
use super::overlay::{DebugOverlay, ToolbarState, SPEED_PRESETS};
use super::play_mode_events::{BreakpointHitEvent, PlayModeErrorEvent, PlayModeStateChangedEvent};
use super::playback::TimelinePlayback;
use super::snapshot::{SceneSnapshot, SceneStore};
use super::state::{clamp_time_scale, PlayModeConfig, PlayModeState};
use super::stats::{PlayModeStats, StatsTracker};

/// Fixed delta for one debug step (one frame at 60 fps)
pub const STEP_DELTA: f64 = 1.0 / 60.0;

/// Script error reported by the story runtime
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptError {
    pub message: String,
    pub node_id: String,
    pub script_name: String,
    pub line_number: u32,
}

impl ScriptError {
    pub fn new(message: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            node_id: node_id.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, script_name: impl Into<String>, line_number: u32) -> Self {
        self.script_name = script_name.into();
        self.line_number = line_number;
        self
    }
}

pub struct PlayModeController {
    state: PlayModeState,
    config: PlayModeConfig,
    default_config: PlayModeConfig,
    stats: StatsTracker,

    /// Present only between enter and exit of play mode
    snapshot: Option<SceneSnapshot>,
    scene_store: Option<Box<dyn SceneStore>>,

    breakpoints: BreakpointRegistry,
    condition: Option<Box<dyn BreakpointCondition>>,
    at_breakpoint: bool,
    current_breakpoint_id: Option<String>,
    /// Set by jump_to_node, cleared by a hit
    breakpoint_armed: bool,

    /// Runtime variable overrides
    variables: IndexMap<String, String>,

    // Editor context (survives play sessions)
    editor_scene_id: String,
    selection: Vec<String>,

    // Current execution context
    current_node_id: String,
    current_scene_id: String,

    listeners: ListenerRegistry,
    playback: Box<dyn TimelinePlayback>,
    emitter: EventEmitter,
}

impl std::fmt::Debug for PlayModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayModeController")
            .field("state", &self.state)
            .field("at_breakpoint", &self.at_breakpoint)
            .field("current_node_id", &self.current_node_id)
            .field("breakpoints", &self.breakpoints.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl PlayModeController {
    /// Create the controller with default configuration.
    ///
    /// The editor owns exactly one controller; panels reach it through the
    /// application object, not a global.
    pub fn new<P: TimelinePlayback + 'static>(playback: P, emitter: EventEmitter) -> Self {
        let default_config = PlayModeConfig::default();
        debug!("PlayModeController initialized");
        Self {
            state: PlayModeState::Stopped,
            config: default_config.clone(),
            default_config,
            stats: StatsTracker::new(),
            snapshot: None,
            scene_store: None,
            breakpoints: BreakpointRegistry::new(),
            condition: None,
            at_breakpoint: false,
            current_breakpoint_id: None,
            breakpoint_armed: false,
            variables: IndexMap::new(),
            editor_scene_id: String::new(),
            selection: Vec::new(),
            current_node_id: String::new(),
            current_scene_id: String::new(),
            listeners: ListenerRegistry::new(),
            playback: Box::new(playback),
            emitter,
        }
    }

    /// Exit play mode cleanly, then drop listeners, breakpoints and variables.
    pub fn shutdown(&mut self) {
        if self.is_in_play_mode() {
            self.stop();
        }

        self.listeners.clear();
        self.breakpoints.clear();
        self.variables.clear();
        debug!("PlayModeController shut down");
    }

    pub fn set_scene_store(&mut self, store: Option<Box<dyn SceneStore>>) {
        self.scene_store = store;
    }

    /// Install a condition evaluator. Without one, conditional breakpoints
    /// fire unconditionally.
    pub fn set_breakpoint_condition(&mut self, condition: Option<Box<dyn BreakpointCondition>>) {
        self.condition = condition;
    }

    // =========================================================================
    // Play Controls
    // =========================================================================

    /// Enter play mode with the default configuration
    pub fn play(&mut self) {
        let config = self.default_config.clone();
        self.play_with(config);
    }

    pub fn play_with(&mut self, config: PlayModeConfig) {
        if self.state != PlayModeState::Stopped {
            trace!("play() ignored in state {}", self.state);
            return;
        }

        self.config = config;
        self.config.time_scale = clamp_time_scale(self.config.time_scale);
        self.enter_play_mode();
    }

    pub fn pause(&mut self) {
        if self.state != PlayModeState::Playing {
            trace!("pause() ignored in state {}", self.state);
            return;
        }

        let old = self.set_state(PlayModeState::Paused);
        self.playback.pause();
        self.announce(old, |l| l.on_play_mode_paused());
    }

    /// Resume from a manual pause. At a breakpoint use [`Self::continue_execution`].
    pub fn resume(&mut self) {
        if self.state != PlayModeState::Paused {
            trace!("resume() ignored in state {}", self.state);
            return;
        }
        if self.at_breakpoint {
            trace!("resume() ignored at breakpoint, use continue_execution()");
            return;
        }

        self.resume_playing();
    }

    /// Stop play mode and restore editor state. Accepted from any play state.
    pub fn stop(&mut self) {
        if self.state == PlayModeState::Stopped {
            return;
        }

        self.exit_play_mode();
    }

    pub fn toggle_play_pause(&mut self) {
        match self.state {
            PlayModeState::Stopped => self.play(),
            PlayModeState::Playing => self.pause(),
            PlayModeState::Paused => {
                if self.at_breakpoint {
                    self.continue_execution();
                } else {
                    self.resume();
                }
            }
            PlayModeState::Starting | PlayModeState::Stopping => {}
        }
    }

    /// Restart from the beginning, or start playing if stopped.
    pub fn restart(&mut self) {
        if self.state == PlayModeState::Stopped {
            self.play();
            return;
        }

        info!("Restarting play session");
        self.playback.jump_to_start();
        self.stats.reset();
        self.variables.clear();

        self.at_breakpoint = false;
        self.current_breakpoint_id = None;
        self.breakpoint_armed = !self.current_node_id.is_empty();

        if self.state == PlayModeState::Paused {
            self.resume();
        }
    }

    // =========================================================================
    // State Queries
    // =========================================================================

    pub fn state(&self) -> PlayModeState {
        self.state
    }

    /// True for every state except `Stopped`
    pub fn is_in_play_mode(&self) -> bool {
        self.state.is_in_play_mode()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayModeState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlayModeState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == PlayModeState::Stopped
    }

    pub fn is_at_breakpoint(&self) -> bool {
        self.at_breakpoint
    }

    pub fn current_breakpoint_id(&self) -> Option<&str> {
        self.current_breakpoint_id.as_deref()
    }

    pub fn current_node_id(&self) -> &str {
        &self.current_node_id
    }

    pub fn current_scene_id(&self) -> &str {
        &self.current_scene_id
    }

    /// Active session configuration
    pub fn config(&self) -> &PlayModeConfig {
        &self.config
    }

    pub fn stats(&self) -> &PlayModeStats {
        self.stats.stats()
    }

    pub fn play_time(&self) -> f64 {
        self.stats.stats().total_play_time
    }

    pub fn snapshot(&self) -> Option<&SceneSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn playback(&self) -> &dyn TimelinePlayback {
        self.playback.as_ref()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn set_default_config(&mut self, config: PlayModeConfig) {
        self.default_config = config;
    }

    pub fn default_config(&self) -> &PlayModeConfig {
        &self.default_config
    }

    /// Set time scale, clamped to 0..=10
    pub fn set_time_scale(&mut self, scale: f64) {
        self.config.time_scale = clamp_time_scale(scale);

        if self.is_in_play_mode() {
            self.playback.set_speed(self.config.time_scale);
        }
    }

    pub fn time_scale(&self) -> f64 {
        self.config.time_scale
    }

    // =========================================================================
    // Editor Context
    // =========================================================================

    /// Scene currently open in the editor
    pub fn set_editor_scene(&mut self, scene_id: impl Into<String>) {
        self.editor_scene_id = scene_id.into();
    }

    pub fn editor_scene(&self) -> &str {
        &self.editor_scene_id
    }

    pub fn set_selection(&mut self, selection: Vec<String>) {
        self.selection = selection;
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    // =========================================================================
    // Debug Features
    // =========================================================================

    /// Advance exactly one frame while paused, then stay paused.
    pub fn step_next(&mut self) {
        if self.state != PlayModeState::Paused {
            trace!("step ignored in state {}", self.state);
            return;
        }

        let scaled = STEP_DELTA * self.config.time_scale;
        // Timeline only advances while its transport runs
        self.playback.resume();
        self.advance_frame(scaled);
        self.playback.pause();
        trace!("Stepped one frame ({:.4}s)", scaled);
    }

    /// Same as [`Self::step_next`] until the story runtime exposes graph
    /// structure for nested stepping.
    pub fn step_into(&mut self) {
        self.step_next();
    }

    /// Same as [`Self::step_next`], see [`Self::step_into`].
    pub fn step_out(&mut self) {
        self.step_next();
    }

    /// Add a breakpoint. Silently ignored if the node already has one.
    pub fn add_breakpoint(&mut self, node_id: &str, condition: &str) {
        if let Some(id) = self.breakpoints.add(node_id, condition, false) {
            debug!("Breakpoint {} added on node '{}'", id, node_id);
        }
    }

    /// Add a breakpoint that removes itself after its first hit.
    pub fn add_breakpoint_once(&mut self, node_id: &str, condition: &str) {
        if let Some(id) = self.breakpoints.add(node_id, condition, true) {
            debug!("One-shot breakpoint {} added on node '{}'", id, node_id);
        }
    }

    pub fn remove_breakpoint(&mut self, breakpoint_id: &str) {
        if self.breakpoints.remove(breakpoint_id).is_some() {
            debug!("Breakpoint {} removed", breakpoint_id);
        }
    }

    pub fn toggle_breakpoint(&mut self, node_id: &str) {
        let now_set = self.breakpoints.toggle(node_id);
        debug!("Breakpoint on node '{}' {}", node_id, if now_set { "set" } else { "cleared" });
    }

    pub fn set_breakpoint_enabled(&mut self, breakpoint_id: &str, enabled: bool) {
        self.breakpoints.set_enabled(breakpoint_id, enabled);
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        self.breakpoints.all()
    }

    pub fn breakpoint_for_node(&self, node_id: &str) -> Option<&Breakpoint> {
        self.breakpoints.for_node(node_id)
    }

    /// Restore a persisted breakpoint (id and hit count preserved)
    pub fn restore_breakpoint(&mut self, breakpoint: Breakpoint) {
        let id = breakpoint.id.clone();
        if !self.breakpoints.restore(breakpoint) {
            warn!("Skipping duplicate persisted breakpoint {}", id);
        }
    }

    pub fn clear_all_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// The only way out of a breakpoint pause.
    pub fn continue_execution(&mut self) {
        if !self.at_breakpoint {
            return;
        }

        self.at_breakpoint = false;
        self.current_breakpoint_id = None;

        if self.state == PlayModeState::Paused {
            self.resume_playing();
        }
    }

    // =========================================================================
    // Scene Control
    // =========================================================================

    pub fn jump_to_scene(&mut self, scene_id: &str) {
        if !self.is_in_play_mode() {
            return;
        }

        debug!("Jump to scene '{}'", scene_id);
        self.current_scene_id = scene_id.to_string();
    }

    /// Move execution to a story node. Counts as a visit and arms the
    /// node's breakpoint for the next update.
    pub fn jump_to_node(&mut self, node_id: &str) {
        if !self.is_in_play_mode() {
            return;
        }

        trace!("Jump to node '{}'", node_id);
        self.current_node_id = node_id.to_string();
        self.breakpoint_armed = !node_id.is_empty();
        if !node_id.is_empty() {
            self.stats.record_visit(node_id);
        }
    }

    /// Set a runtime variable override. Ignored outside play mode.
    pub fn set_variable(&mut self, name: &str, value: &str) {
        if !self.is_in_play_mode() {
            trace!("set_variable('{}') ignored outside play mode", name);
            return;
        }
        self.variables.insert(name.to_string(), value.to_string());
    }

    /// Variable value, or empty string if unset
    pub fn variable(&self, name: &str) -> String {
        self.variables.get(name).cloned().unwrap_or_default()
    }

    pub fn all_variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Per-frame hook, call from the editor main loop. Only runs while playing.
    ///
    /// A node's breakpoint is checked once per arrival (see `jump_to_node`),
    /// not on every frame spent on the node: after `continue_execution()` the
    /// same node does not pause again until execution jumps back to it.
    pub fn update(&mut self, delta_time: f64) {
        if self.state != PlayModeState::Playing {
            return;
        }

        let scaled = delta_time * self.config.time_scale;
        self.advance_frame(scaled);
        self.check_breakpoint();
    }

    fn advance_frame(&mut self, scaled_delta: f64) {
        self.stats.record_frame(scaled_delta);
        self.playback.update(scaled_delta);
    }

    fn check_breakpoint(&mut self) {
        if !self.config.enable_breakpoints || !self.breakpoint_armed || self.current_node_id.is_empty() {
            return;
        }

        let Some(bp) = self.breakpoints.for_node(&self.current_node_id) else {
            return;
        };
        if !bp.enabled {
            return;
        }
        if !bp.condition.is_empty()
            && let Some(condition) = &self.condition
            && !condition.should_break(&bp.condition, &self.variables)
        {
            trace!("Breakpoint {} condition '{}' not met", bp.id, bp.condition);
            return;
        }

        let id = bp.id.clone();
        let Some(hit) = self.breakpoints.record_hit(&id) else {
            return;
        };

        self.at_breakpoint = true;
        self.current_breakpoint_id = Some(id);
        self.breakpoint_armed = false;
        info!("Breakpoint {} hit on node '{}' (hits: {})", hit.id, hit.node_id, hit.hit_count);

        self.pause();
        self.notify_breakpoint_hit(&hit);
    }

    // =========================================================================
    // Error Reporting
    // =========================================================================

    /// Report a script error. Pauses if `pause_on_error` and playing.
    pub fn notify_error(&mut self, error: &str, node_id: &str) {
        self.notify_script_error(ScriptError::new(error, node_id));
    }

    pub fn notify_script_error(&mut self, script_error: ScriptError) {
        self.stats.record_error();
        if script_error.script_name.is_empty() {
            error!("Script error at node '{}': {}", script_error.node_id, script_error.message);
        } else {
            error!(
                "Script error at node '{}' ({}:{}): {}",
                script_error.node_id, script_error.script_name, script_error.line_number, script_error.message
            );
        }

        self.listeners
            .notify(|l| l.on_script_error(&script_error.message, &script_error.node_id));

        self.emitter.emit(PlayModeErrorEvent {
            error_message: script_error.message,
            node_id: script_error.node_id,
            script_name: script_error.script_name,
            line_number: script_error.line_number,
        });

        if self.config.pause_on_error && self.state == PlayModeState::Playing {
            self.pause();
        }
    }

    /// Non-fatal runtime warning; counted and logged only.
    pub fn notify_warning(&mut self, message: &str, node_id: &str) {
        self.stats.record_warning();
        warn!("Runtime warning at node '{}': {}", node_id, message);
    }

    // =========================================================================
    // Event Handling
    // =========================================================================

    pub fn add_listener<L: PlayModeListener + 'static>(&mut self, listener: &Arc<Mutex<L>>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // =========================================================================
    // Toolbar / Overlay models
    // =========================================================================

    pub fn toolbar_state(&self) -> ToolbarState {
        ToolbarState {
            can_play: matches!(self.state, PlayModeState::Stopped)
                || (self.state == PlayModeState::Paused && !self.at_breakpoint),
            can_pause: self.state == PlayModeState::Playing,
            can_stop: self.is_in_play_mode(),
            can_step: self.state == PlayModeState::Paused,
            can_continue: self.at_breakpoint,
            at_breakpoint: self.at_breakpoint,
            time_scale: self.config.time_scale,
            speed_presets: &SPEED_PRESETS,
        }
    }

    /// Overlay contents, or None when not playing or the overlay is disabled.
    pub fn debug_overlay(&self) -> Option<DebugOverlay> {
        if !self.is_in_play_mode() || !self.config.show_debug_overlay {
            return None;
        }

        let stats = self.stats.stats();
        Some(DebugOverlay {
            state: self.state,
            play_time: stats.total_play_time,
            fps: stats.average_fps,
            frame_count: stats.frame_count,
            current_node: self.current_node_id.clone(),
            current_scene: self.current_scene_id.clone(),
            breakpoint_id: self.current_breakpoint_id.clone(),
            variables: self.variables.clone(),
            debug_views: self.config.enabled_debug_views.clone(),
        })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn set_state(&mut self, new_state: PlayModeState) -> PlayModeState {
        let old = self.state;
        self.state = new_state;
        trace!("Play mode {} -> {}", old, new_state);
        old
    }

    /// Generic callback, specific callback, then bus event.
    fn announce<F>(&mut self, old_state: PlayModeState, specific: F)
    where
        F: FnMut(&mut dyn PlayModeListener),
    {
        let new_state = self.state;
        self.listeners
            .notify(|l| l.on_play_mode_state_changed(old_state, new_state));
        self.listeners.notify(specific);
        self.emitter.emit(PlayModeStateChangedEvent {
            previous_state: old_state,
            new_state,
        });
    }

    fn resume_playing(&mut self) {
        let old = self.set_state(PlayModeState::Playing);
        self.playback.resume();
        self.announce(old, |l| l.on_play_mode_resumed());
    }

    fn enter_play_mode(&mut self) {
        info!("Entering play mode");
        let old = self.set_state(PlayModeState::Starting);
        self.announce(old, |l| l.on_play_mode_starting());

        self.capture_scene_snapshot();
        self.stats.reset();

        self.current_scene_id = if self.config.start_scene_id.is_empty() {
            self.editor_scene_id.clone()
        } else {
            self.config.start_scene_id.clone()
        };

        self.playback.set_speed(self.config.time_scale);
        if !self.config.start_from_current_scene {
            self.playback.jump_to_start();
        }

        let old = self.set_state(PlayModeState::Playing);
        self.playback.play();
        self.announce(old, |l| l.on_play_mode_started());
    }

    fn exit_play_mode(&mut self) {
        info!("Exiting play mode after {:.2}s", self.stats.stats().total_play_time);
        let old = self.set_state(PlayModeState::Stopping);
        self.announce(old, |l| l.on_play_mode_stopping());

        self.playback.stop();
        self.restore_scene_snapshot();

        self.variables.clear();
        self.at_breakpoint = false;
        self.current_breakpoint_id = None;
        self.breakpoint_armed = false;
        self.current_node_id.clear();
        self.current_scene_id.clear();

        let old = self.set_state(PlayModeState::Stopped);
        self.announce(old, |l| l.on_play_mode_stopped());
    }

    fn capture_scene_snapshot(&mut self) {
        let mut snapshot = SceneSnapshot {
            scene_id: self.editor_scene_id.clone(),
            serialized_data: Vec::new(),
            timeline_position: self.playback.current_time(),
            selected_objects: self.selection.clone(),
        };

        if let Some(store) = self.scene_store.as_mut() {
            match store.capture(&snapshot.scene_id) {
                Ok(data) => snapshot.serialized_data = data,
                Err(e) => error!("Failed to capture scene '{}': {:#}", snapshot.scene_id, e),
            }
        }

        debug!(
            "Captured snapshot of scene '{}' at {:.3}s ({} bytes)",
            snapshot.scene_id,
            snapshot.timeline_position,
            snapshot.serialized_data.len()
        );
        self.snapshot = Some(snapshot);
    }

    fn restore_scene_snapshot(&mut self) {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };

        self.playback.seek_to(snapshot.timeline_position);

        if let Some(store) = self.scene_store.as_mut()
            && let Err(e) = store.restore(&snapshot.scene_id, &snapshot.serialized_data)
        {
            error!("Failed to restore scene '{}': {:#}", snapshot.scene_id, e);
        }

        self.selection = snapshot.selected_objects;
        debug!("Restored snapshot of scene '{}'", snapshot.scene_id);
    }

    fn notify_breakpoint_hit(&mut self, breakpoint: &Breakpoint) {
        self.listeners.notify(|l| l.on_breakpoint_hit(breakpoint));

        self.emitter.emit(BreakpointHitEvent {
            breakpoint_id: breakpoint.id.clone(),
            node_id: breakpoint.node_id.clone(),
            hit_count: breakpoint.hit_count,
        });
    }
}
