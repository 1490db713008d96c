//! Event handling for EditorApp.

use super::EditorApp;
use crate::core::event_bus::downcast_event;
use crate::core::play_mode_events::{BreakpointHitEvent, PlayModeErrorEvent, PlayModeStateChangedEvent};
use crate::main_events;

use log::trace;

impl EditorApp {
    /// Handle events from event bus.
    ///
    /// Controller notifications queued by the previous frame are only traced;
    /// panels consume them through subscriptions.
    pub fn handle_events(&mut self) {
        let events = self.event_bus.poll();
        for event in events {
            if let Some(e) = downcast_event::<PlayModeStateChangedEvent>(&event) {
                trace!("Play mode changed: {} -> {}", e.previous_state, e.new_state);
                continue;
            }
            if let Some(e) = downcast_event::<BreakpointHitEvent>(&event) {
                trace!("Breakpoint {} on '{}' (hits: {})", e.breakpoint_id, e.node_id, e.hit_count);
                continue;
            }
            if downcast_event::<PlayModeErrorEvent>(&event).is_some() {
                continue;
            }

            match main_events::handle_app_event(&event, &mut self.controller) {
                Some(result) => {
                    if result.save_settings {
                        self.mark_settings_dirty();
                    }
                }
                None => trace!("Unhandled event: {}", (*event).type_name()),
            }
        }
    }
}
