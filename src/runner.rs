//! Headless runner - plays a story route through the editor app.
//!
//! Each node gets `frames_per_node` editor frames. The runner behaves like a
//! user sitting at the toolbar: it continues from breakpoints and resumes
//! after error pauses, one frame later, through the same command events the
//! toolbar emits.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::app::EditorApp;
use crate::cli::{self, Args};
use crate::core::playback::TimelinePlaybackEngine;
use crate::core::player_events::*;
use crate::core::session_recorder::{SessionEntry, SessionRecorder};
use crate::core::state::{PlayModeConfig, PlayModeState};
use crate::core::stats::PlayModeStats;
use crate::paths::PathConfig;

/// What to play and how
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub route: Vec<String>,
    pub errors: IndexMap<String, String>,
    pub variables: IndexMap<String, String>,
    pub frames_per_node: u32,
    pub frame_delta: f64,
}

impl RoutePlan {
    /// Timeline length that fits the whole route at 1x
    pub fn duration(&self) -> f64 {
        self.route.len() as f64 * self.frames_per_node as f64 * self.frame_delta
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub route: Vec<String>,
    pub final_state: PlayModeState,
    pub breakpoint_hits: usize,
    pub stats: PlayModeStats,
    pub trace: Vec<SessionEntry>,
}

/// Play `plan` from the first node to the last, then stop.
pub fn run_route(app: &mut EditorApp, plan: &RoutePlan, config: PlayModeConfig) -> SessionReport {
    let recorder = Arc::new(Mutex::new(SessionRecorder::new()));
    let listener_id = app.controller.add_listener(&recorder);

    app.event_bus.emit(PlayWithConfigEvent(config));
    for (name, value) in &plan.variables {
        app.event_bus.emit(SetVariableEvent {
            name: name.clone(),
            value: value.clone(),
        });
    }

    for node in &plan.route {
        app.event_bus.emit(JumpToNodeEvent(node.clone()));
        if let Some(message) = plan.errors.get(node) {
            app.event_bus.emit(ScriptErrorEvent {
                message: message.clone(),
                node_id: node.clone(),
                script_name: String::new(),
                line_number: 0,
            });
        }

        for _ in 0..plan.frames_per_node {
            app.run_frame(plan.frame_delta);

            if app.controller.is_at_breakpoint() {
                debug!(
                    "At breakpoint {} on '{}', continuing",
                    app.controller.current_breakpoint_id().unwrap_or_default(),
                    app.controller.current_node_id()
                );
                app.event_bus.emit(ContinueEvent);
            } else if app.controller.is_paused() {
                trace!("Paused after error, resuming");
                app.event_bus.emit(ResumeEvent);
            }
        }
    }

    // Flush pending commands, snapshot stats before stop
    app.handle_events();
    let stats = app.controller.stats().clone();
    app.event_bus.emit(StopEvent);
    app.handle_events();

    app.controller.remove_listener(listener_id);
    let trace = recorder.lock().unwrap_or_else(|e| e.into_inner()).drain();
    let breakpoint_hits = trace
        .iter()
        .filter(|e| matches!(e, SessionEntry::BreakpointHit { .. }))
        .count();

    SessionReport {
        route: plan.route.clone(),
        final_state: app.controller.state(),
        breakpoint_hits,
        stats,
        trace,
    }
}

fn build_plan(args: &Args) -> Result<RoutePlan> {
    if args.route.is_empty() {
        bail!("No route given, pass at least one story node ID");
    }
    if args.fps.is_nan() || args.fps <= 0.0 {
        bail!("Frame rate must be positive, got {}", args.fps);
    }

    let mut variables = IndexMap::new();
    for raw in &args.variables {
        let (name, value) =
            cli::parse_assignment(raw).with_context(|| format!("Bad --var '{}', expected NAME=VALUE", raw))?;
        variables.insert(name.to_string(), value.to_string());
    }

    let mut errors = IndexMap::new();
    for raw in &args.errors {
        let (node, message) =
            cli::parse_error_spec(raw).with_context(|| format!("Bad --error '{}', expected NODE:MESSAGE", raw))?;
        errors.insert(node.to_string(), message.to_string());
    }

    Ok(RoutePlan {
        route: args.route.clone(),
        errors,
        variables,
        frames_per_node: args.frames_per_node.max(1),
        frame_delta: 1.0 / args.fps,
    })
}

/// Run the headless player with given arguments.
pub fn run_app(args: Args, path_config: PathConfig) -> Result<()> {
    let plan = build_plan(&args)?;
    let mut app = EditorApp::new(TimelinePlaybackEngine::new(plan.duration()), path_config);

    if let Some(scene) = &args.scene {
        app.controller.set_editor_scene(scene.clone());
    }
    for node in &args.breakpoints {
        app.controller.add_breakpoint(node, "");
    }
    for node in &args.break_once {
        app.controller.add_breakpoint_once(node, "");
    }
    if args.save_breakpoints && !(args.breakpoints.is_empty() && args.break_once.is_empty()) {
        app.mark_settings_dirty();
    }

    let mut config = app.controller.default_config().clone();
    if let Some(scale) = args.time_scale {
        config.time_scale = scale;
    }
    if let Some(scene) = &args.start_scene {
        config.start_scene_id = scene.clone();
    }
    if args.from_start {
        config.start_from_current_scene = false;
    }
    if args.no_breakpoints {
        config.enable_breakpoints = false;
    }

    info!("Playing route of {} nodes ({} frames each)", plan.route.len(), plan.frames_per_node);
    let report = run_route(&mut app, &plan, config);
    info!(
        "Session finished: {} frames, {:.2}s, {} breakpoint hits, {} errors",
        report.stats.frame_count,
        report.stats.total_play_time,
        report.breakpoint_hits,
        report.stats.script_error_count
    );

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize session report")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write report: {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    if app.settings_dirty() {
        info!("Saving settings to {}", app.settings_path().display());
    } else if args.save_breakpoints {
        warn!("--save-breakpoints given without any breakpoints");
    }
    app.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorSettings;

    fn app() -> EditorApp {
        let dir = std::env::temp_dir().join("novelplay_runner_test");
        EditorApp::with_settings(
            TimelinePlaybackEngine::new(10.0),
            EditorSettings::default(),
            PathConfig { config_dir: Some(dir) },
        )
    }

    fn plan(route: &[&str]) -> RoutePlan {
        RoutePlan {
            route: route.iter().map(|s| s.to_string()).collect(),
            errors: IndexMap::new(),
            variables: IndexMap::new(),
            frames_per_node: 4,
            frame_delta: 0.25,
        }
    }

    #[test]
    fn test_plain_route() {
        let mut app = app();
        let report = run_route(&mut app, &plan(&["a", "b", "c"]), PlayModeConfig::default());

        assert_eq!(report.final_state, PlayModeState::Stopped);
        assert_eq!(report.stats.frame_count, 12);
        assert!((report.stats.total_play_time - 3.0).abs() < 1e-9);
        assert_eq!(report.stats.visited_nodes, vec!["a", "b", "c"]);
        assert_eq!(report.breakpoint_hits, 0);
        assert_eq!(report.trace.first(), Some(&SessionEntry::StateChanged {
            from: PlayModeState::Stopped,
            to: PlayModeState::Starting,
        }));
        assert_eq!(report.trace.last(), Some(&SessionEntry::Stopped));
    }

    #[test]
    fn test_route_continues_past_breakpoints() {
        let mut app = app();
        app.controller.add_breakpoint("b", "");
        app.controller.add_breakpoint_once("c", "");

        let report = run_route(&mut app, &plan(&["a", "b", "c", "b"]), PlayModeConfig::default());

        assert_eq!(report.breakpoint_hits, 3);
        assert_eq!(app.controller.breakpoint_for_node("b").map(|bp| bp.hit_count), Some(2));
        assert!(app.controller.breakpoint_for_node("c").is_none());
        // Continue lands before the next tick, so no frame is lost
        assert_eq!(report.stats.frame_count, 16);
    }

    #[test]
    fn test_route_resumes_after_error() {
        let mut app = app();
        let mut plan = plan(&["a", "b"]);
        plan.errors.insert("a".into(), "missing asset".into());

        let report = run_route(&mut app, &plan, PlayModeConfig::default());

        assert_eq!(report.stats.script_error_count, 1);
        assert!(report.trace.contains(&SessionEntry::ScriptError {
            error: "missing asset".into(),
            node_id: "a".into(),
        }));
        assert!(report.trace.contains(&SessionEntry::Resumed));
    }

    #[test]
    fn test_build_plan_rejects_bad_input() {
        use clap::Parser;

        let args = Args::parse_from(["novelplay"]);
        assert!(build_plan(&args).is_err());

        let args = Args::parse_from(["novelplay", "n1", "--var", "oops"]);
        assert!(build_plan(&args).is_err());

        let args = Args::parse_from(["novelplay", "n1", "--fps", "30", "--error", "n1:boom"]);
        let plan = build_plan(&args).unwrap();
        assert!((plan.frame_delta - 1.0 / 30.0).abs() < 1e-12);
        assert_eq!(plan.errors.get("n1").map(String::as_str), Some("boom"));
    }
}
