//! Application event handling - routes play mode commands to the controller.
//!
//! Toolbar buttons, hotkeys and the story runtime emit command events from
//! [`crate::core::player_events`]. The frame loop polls the bus and hands each
//! event here.
//!
//! Always downcast through [`downcast_event`]: it derefs to `dyn Event` before
//! `as_any()`, otherwise the blanket `Event for Box<dyn Event>` impl answers
//! with the box's TypeId and every downcast fails.

use log::debug;

use crate::core::event_bus::{BoxedEvent, downcast_event};
use crate::core::play_mode::{PlayModeController, ScriptError};
use crate::core::player_events::*;

/// Result of handling an app event - may contain deferred actions
#[derive(Debug, Default, PartialEq)]
pub struct EventResult {
    /// Persistent state changed (breakpoints, defaults); write settings
    pub save_settings: bool,
}

/// Handle a single app event (called from main event loop).
/// Returns Some(result) if event was handled, None otherwise.
pub fn handle_app_event(event: &BoxedEvent, controller: &mut PlayModeController) -> Option<EventResult> {
    let mut result = EventResult::default();

    // === Transport ===
    if downcast_event::<PlayEvent>(event).is_some() {
        controller.play();
        return Some(result);
    }
    if let Some(e) = downcast_event::<PlayWithConfigEvent>(event) {
        controller.play_with(e.0.clone());
        return Some(result);
    }
    if downcast_event::<PauseEvent>(event).is_some() {
        controller.pause();
        return Some(result);
    }
    if downcast_event::<ResumeEvent>(event).is_some() {
        controller.resume();
        return Some(result);
    }
    if downcast_event::<StopEvent>(event).is_some() {
        controller.stop();
        return Some(result);
    }
    if downcast_event::<TogglePlayPauseEvent>(event).is_some() {
        controller.toggle_play_pause();
        return Some(result);
    }
    if downcast_event::<RestartEvent>(event).is_some() {
        controller.restart();
        return Some(result);
    }
    if let Some(e) = downcast_event::<SetTimeScaleEvent>(event) {
        debug!("SetTimeScale: {}", e.0);
        controller.set_time_scale(e.0);
        return Some(result);
    }

    // === Debugging ===
    if downcast_event::<StepNextEvent>(event).is_some() {
        controller.step_next();
        return Some(result);
    }
    if downcast_event::<StepIntoEvent>(event).is_some() {
        controller.step_into();
        return Some(result);
    }
    if downcast_event::<StepOutEvent>(event).is_some() {
        controller.step_out();
        return Some(result);
    }
    if downcast_event::<ContinueEvent>(event).is_some() {
        controller.continue_execution();
        return Some(result);
    }
    if let Some(e) = downcast_event::<ToggleBreakpointEvent>(event) {
        controller.toggle_breakpoint(&e.0);
        result.save_settings = true;
        return Some(result);
    }
    if let Some(e) = downcast_event::<SetBreakpointEnabledEvent>(event) {
        controller.set_breakpoint_enabled(&e.breakpoint_id, e.enabled);
        result.save_settings = true;
        return Some(result);
    }
    if downcast_event::<ClearBreakpointsEvent>(event).is_some() {
        controller.clear_all_breakpoints();
        result.save_settings = true;
        return Some(result);
    }

    // === Story runtime ===
    if let Some(e) = downcast_event::<JumpToSceneEvent>(event) {
        controller.jump_to_scene(&e.0);
        return Some(result);
    }
    if let Some(e) = downcast_event::<JumpToNodeEvent>(event) {
        controller.jump_to_node(&e.0);
        return Some(result);
    }
    if let Some(e) = downcast_event::<SetVariableEvent>(event) {
        controller.set_variable(&e.name, &e.value);
        return Some(result);
    }
    if let Some(e) = downcast_event::<ScriptErrorEvent>(event) {
        controller.notify_script_error(
            ScriptError::new(e.message.clone(), e.node_id.clone()).at(e.script_name.clone(), e.line_number),
        );
        return Some(result);
    }

    // Event not handled
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::EventBus;
    use crate::core::play_mode_events::PlayModeStateChangedEvent;
    use crate::core::playback::{TimelinePlayback, TimelinePlaybackEngine};
    use crate::core::state::PlayModeState;

    fn controller(bus: &EventBus) -> PlayModeController {
        PlayModeController::new(TimelinePlaybackEngine::new(60.0), bus.emitter())
    }

    fn boxed<E: crate::core::event_bus::Event>(e: E) -> BoxedEvent {
        Box::new(e)
    }

    #[test]
    fn test_transport_events_drive_controller() {
        let bus = EventBus::new();
        let mut ctrl = controller(&bus);

        assert!(handle_app_event(&boxed(PlayEvent), &mut ctrl).is_some());
        assert_eq!(ctrl.state(), PlayModeState::Playing);

        handle_app_event(&boxed(TogglePlayPauseEvent), &mut ctrl);
        assert_eq!(ctrl.state(), PlayModeState::Paused);

        handle_app_event(&boxed(StepNextEvent), &mut ctrl);
        assert_eq!(ctrl.stats().frame_count, 1);

        handle_app_event(&boxed(SetTimeScaleEvent(3.0)), &mut ctrl);
        assert_eq!(ctrl.time_scale(), 3.0);

        handle_app_event(&boxed(StopEvent), &mut ctrl);
        assert_eq!(ctrl.state(), PlayModeState::Stopped);
    }

    #[test]
    fn test_breakpoint_events_request_save() {
        let bus = EventBus::new();
        let mut ctrl = controller(&bus);

        let result = handle_app_event(&boxed(ToggleBreakpointEvent("n1".into())), &mut ctrl);
        assert_eq!(result, Some(EventResult { save_settings: true }));
        assert!(ctrl.breakpoint_for_node("n1").is_some());

        let result = handle_app_event(&boxed(PauseEvent), &mut ctrl);
        assert_eq!(result, Some(EventResult::default()));
    }

    #[test]
    fn test_breakpoint_enable_and_clear_events() {
        let bus = EventBus::new();
        let mut ctrl = controller(&bus);
        ctrl.add_breakpoint("n1", "");
        ctrl.add_breakpoint("n2", "");

        let event = SetBreakpointEnabledEvent {
            breakpoint_id: "bp_1".into(),
            enabled: false,
        };
        let result = handle_app_event(&boxed(event), &mut ctrl);
        assert_eq!(result, Some(EventResult { save_settings: true }));
        assert_eq!(ctrl.breakpoint_for_node("n1").map(|bp| bp.enabled), Some(false));

        // Disabled breakpoint is skipped during play
        handle_app_event(&boxed(PlayEvent), &mut ctrl);
        handle_app_event(&boxed(JumpToNodeEvent("n1".into())), &mut ctrl);
        ctrl.update(1.0 / 60.0);
        assert!(ctrl.is_playing());

        let result = handle_app_event(&boxed(ClearBreakpointsEvent), &mut ctrl);
        assert_eq!(result, Some(EventResult { save_settings: true }));
        assert!(ctrl.breakpoints().is_empty());
    }

    #[test]
    fn test_jump_to_scene_and_restart_events() {
        let bus = EventBus::new();
        let mut ctrl = controller(&bus);

        // Ignored outside play mode
        let result = handle_app_event(&boxed(JumpToSceneEvent("chapter_2".into())), &mut ctrl);
        assert_eq!(result, Some(EventResult::default()));
        assert_eq!(ctrl.current_scene_id(), "");

        handle_app_event(&boxed(PlayEvent), &mut ctrl);
        let result = handle_app_event(&boxed(JumpToSceneEvent("chapter_2".into())), &mut ctrl);
        assert_eq!(result, Some(EventResult::default()));
        assert_eq!(ctrl.current_scene_id(), "chapter_2");

        for _ in 0..5 {
            ctrl.update(0.1);
        }
        handle_app_event(&boxed(PauseEvent), &mut ctrl);

        let result = handle_app_event(&boxed(RestartEvent), &mut ctrl);
        assert_eq!(result, Some(EventResult::default()));
        assert_eq!(ctrl.state(), PlayModeState::Playing);
        assert_eq!(ctrl.stats().frame_count, 0);
        assert_eq!(ctrl.playback().current_time(), 0.0);
    }

    #[test]
    fn test_runtime_events_reach_breakpoint() {
        let bus = EventBus::new();
        let mut ctrl = controller(&bus);
        ctrl.add_breakpoint("n2", "");

        handle_app_event(&boxed(PlayEvent), &mut ctrl);
        handle_app_event(&boxed(SetVariableEvent { name: "route".into(), value: "good".into() }), &mut ctrl);
        handle_app_event(&boxed(JumpToNodeEvent("n2".into())), &mut ctrl);
        ctrl.update(1.0 / 60.0);

        assert!(ctrl.is_at_breakpoint());
        assert_eq!(ctrl.variable("route"), "good");

        handle_app_event(&boxed(ContinueEvent), &mut ctrl);
        assert!(ctrl.is_playing());
    }

    #[test]
    fn test_script_error_event() {
        let bus = EventBus::new();
        let mut ctrl = controller(&bus);
        handle_app_event(&boxed(PlayEvent), &mut ctrl);

        let err = ScriptErrorEvent {
            message: "bad jump".into(),
            node_id: "n3".into(),
            script_name: "intro.nms".into(),
            line_number: 7,
        };
        handle_app_event(&boxed(err), &mut ctrl);
        assert!(ctrl.is_paused());
        assert_eq!(ctrl.stats().script_error_count, 1);
    }

    #[test]
    fn test_unknown_event_not_handled() {
        let bus = EventBus::new();
        let mut ctrl = controller(&bus);
        let event = boxed(PlayModeStateChangedEvent {
            previous_state: PlayModeState::Stopped,
            new_state: PlayModeState::Starting,
        });
        assert!(handle_app_event(&event, &mut ctrl).is_none());
    }
}
