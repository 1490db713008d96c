//! Play session statistics.
//!
//! Average FPS is a periodic reset average, not a rolling window: frames and
//! time accumulate until one second has passed, the average is recomputed
//! from that bucket, then the bucket empties.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Play mode statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayModeStats {
    pub total_play_time: f64,
    pub frame_count: u32,
    pub average_fps: f64,
    pub min_frame_time: f64,
    pub max_frame_time: f64,
    pub script_error_count: u32,
    pub warning_count: u32,
    pub visited_nodes: Vec<String>,
    pub node_visit_counts: IndexMap<String, u32>,
}

/// Stats plus the frame-timing bucket behind `average_fps`.
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    stats: PlayModeStats,
    last_frame_time: f64,
    frame_time_accumulator: f64,
    frame_time_count: u32,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &PlayModeStats {
        &self.stats
    }

    pub fn last_frame_time(&self) -> f64 {
        self.last_frame_time
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record one frame of `delta` seconds (already time-scaled).
    pub fn record_frame(&mut self, delta: f64) {
        self.stats.total_play_time += delta;
        self.stats.frame_count += 1;

        self.last_frame_time = delta;
        self.frame_time_accumulator += delta;
        self.frame_time_count += 1;

        // min is meaningless before the first frame
        if self.stats.frame_count == 1 || delta < self.stats.min_frame_time {
            self.stats.min_frame_time = delta;
        }
        if delta > self.stats.max_frame_time {
            self.stats.max_frame_time = delta;
        }

        if self.frame_time_accumulator >= 1.0 {
            self.stats.average_fps = self.frame_time_count as f64 / self.frame_time_accumulator;
            self.frame_time_accumulator = 0.0;
            self.frame_time_count = 0;
        }
    }

    pub fn record_visit(&mut self, node_id: &str) {
        self.stats.visited_nodes.push(node_id.to_string());
        *self.stats.node_visit_counts.entry(node_id.to_string()).or_insert(0) += 1;
    }

    pub fn record_error(&mut self) {
        self.stats.script_error_count += 1;
    }

    pub fn record_warning(&mut self) {
        self.stats.warning_count += 1;
    }
}
