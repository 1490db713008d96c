//! Events published by the play mode controller.

use super::state::PlayModeState;

/// Emitted on every play mode state change, bookends included
#[derive(Clone, Debug, PartialEq)]
pub struct PlayModeStateChangedEvent {
    pub previous_state: PlayModeState,
    pub new_state: PlayModeState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BreakpointHitEvent {
    pub breakpoint_id: String,
    pub node_id: String,
    pub hit_count: u32,
}

/// Script error surfaced during play. `script_name` is empty and
/// `line_number` is 0 when the runtime could not attribute the error.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayModeErrorEvent {
    pub error_message: String,
    pub node_id: String,
    pub script_name: String,
    pub line_number: u32,
}
