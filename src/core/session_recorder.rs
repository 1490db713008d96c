//! Listener that keeps an ordered trace of a play session.
//!
//! Used by the headless runner to print what happened and by panels that
//! want a scrollback of transitions without subscribing to every bus event.

use std::collections::VecDeque;

use serde::Serialize;

use super::breakpoints::Breakpoint;
use super::listener::PlayModeListener;
use super::state::PlayModeState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEntry {
    StateChanged { from: PlayModeState, to: PlayModeState },
    Starting,
    Started,
    Paused,
    Resumed,
    Stopping,
    Stopped,
    BreakpointHit { breakpoint_id: String, node_id: String, hit_count: u32 },
    ScriptError { error: String, node_id: String },
}

/// Bounded trace of lifecycle callbacks, oldest entries dropped first
#[derive(Debug, Clone)]
pub struct SessionRecorder {
    entries: VecDeque<SessionEntry>,
    capacity: usize,
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.clamp(1, 4096)),
            capacity: capacity.max(1),
        }
    }

    pub fn entries(&self) -> &VecDeque<SessionEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take and clear the trace
    pub fn drain(&mut self) -> Vec<SessionEntry> {
        self.entries.drain(..).collect()
    }

    fn push(&mut self, entry: SessionEntry) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

impl PlayModeListener for SessionRecorder {
    fn on_play_mode_state_changed(&mut self, old_state: PlayModeState, new_state: PlayModeState) {
        self.push(SessionEntry::StateChanged { from: old_state, to: new_state });
    }

    fn on_play_mode_starting(&mut self) {
        self.push(SessionEntry::Starting);
    }

    fn on_play_mode_started(&mut self) {
        self.push(SessionEntry::Started);
    }

    fn on_play_mode_paused(&mut self) {
        self.push(SessionEntry::Paused);
    }

    fn on_play_mode_resumed(&mut self) {
        self.push(SessionEntry::Resumed);
    }

    fn on_play_mode_stopping(&mut self) {
        self.push(SessionEntry::Stopping);
    }

    fn on_play_mode_stopped(&mut self) {
        self.push(SessionEntry::Stopped);
    }

    fn on_breakpoint_hit(&mut self, breakpoint: &Breakpoint) {
        self.push(SessionEntry::BreakpointHit {
            breakpoint_id: breakpoint.id.clone(),
            node_id: breakpoint.node_id.clone(),
            hit_count: breakpoint.hit_count,
        });
    }

    fn on_script_error(&mut self, error: &str, node_id: &str) {
        self.push(SessionEntry::ScriptError {
            error: error.to_string(),
            node_id: node_id.to_string(),
        });
    }
}
