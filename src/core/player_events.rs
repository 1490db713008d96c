//! Play mode command events (toolbar, hotkeys, remote panels).
//!
//! Panels emit these on the bus; the editor frame loop routes them to the
//! controller via `main_events::handle_app_event`.

use super::state::PlayModeConfig;

// === Transport ===

#[derive(Clone, Debug)]
pub struct PlayEvent;

/// Enter play mode with an explicit session config
#[derive(Clone, Debug)]
pub struct PlayWithConfigEvent(pub PlayModeConfig);

#[derive(Clone, Debug)]
pub struct PauseEvent;

#[derive(Clone, Debug)]
pub struct ResumeEvent;

#[derive(Clone, Debug)]
pub struct StopEvent;

#[derive(Clone, Debug)]
pub struct TogglePlayPauseEvent;

#[derive(Clone, Debug)]
pub struct RestartEvent;

#[derive(Clone, Debug)]
pub struct SetTimeScaleEvent(pub f64);

// === Debugging ===

#[derive(Clone, Debug)]
pub struct StepNextEvent;

#[derive(Clone, Debug)]
pub struct StepIntoEvent;

#[derive(Clone, Debug)]
pub struct StepOutEvent;

/// Continue after a breakpoint pause
#[derive(Clone, Debug)]
pub struct ContinueEvent;

#[derive(Clone, Debug)]
pub struct ToggleBreakpointEvent(pub String);

#[derive(Clone, Debug)]
pub struct SetBreakpointEnabledEvent {
    pub breakpoint_id: String,
    pub enabled: bool,
}

#[derive(Clone, Debug)]
pub struct ClearBreakpointsEvent;

// === Story runtime ===

#[derive(Clone, Debug)]
pub struct JumpToSceneEvent(pub String);

#[derive(Clone, Debug)]
pub struct JumpToNodeEvent(pub String);

#[derive(Clone, Debug)]
pub struct SetVariableEvent {
    pub name: String,
    pub value: String,
}

/// Script error reported by the story runtime
#[derive(Clone, Debug)]
pub struct ScriptErrorEvent {
    pub message: String,
    pub node_id: String,
    pub script_name: String,
    pub line_number: u32,
}
