//! Story-node breakpoints.
//!
//! Flat ordered list with linear lookups; editors hold dozens of breakpoints,
//! not thousands. At most one breakpoint targets a given node.

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};

/// Debug breakpoint on a story node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub id: String,
    /// Story node ID
    pub node_id: String,
    /// Optional condition expression, empty = always
    #[serde(default)]
    pub condition: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Delete after first hit
    #[serde(default)]
    pub hit_once: bool,
    #[serde(default)]
    pub hit_count: u32,
}

fn enabled_default() -> bool {
    true
}

/// Decides whether a conditional breakpoint fires.
///
/// Only consulted for breakpoints with a non-empty condition. The variable
/// table is the controller's current runtime overrides.
pub trait BreakpointCondition: Send {
    fn should_break(&self, condition: &str, variables: &IndexMap<String, String>) -> bool;
}

impl<F> BreakpointCondition for F
where
    F: Fn(&str, &IndexMap<String, String>) -> bool + Send,
{
    fn should_break(&self, condition: &str, variables: &IndexMap<String, String>) -> bool {
        self(condition, variables)
    }
}

/// Breakpoint storage with monotonic `bp_<n>` ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointRegistry {
    breakpoints: Vec<Breakpoint>,
    next_id: u64,
}

impl Default for BreakpointRegistry {
    fn default() -> Self {
        Self {
            breakpoints: Vec::new(),
            next_id: 1,
        }
    }
}

impl BreakpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_id(&mut self) -> String {
        let id = format!("bp_{}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a breakpoint for `node_id`. Returns the new id, or None if the
    /// node already has one.
    pub fn add(&mut self, node_id: &str, condition: &str, hit_once: bool) -> Option<String> {
        if self.for_node(node_id).is_some() {
            trace!("Breakpoint for node '{}' already exists", node_id);
            return None;
        }

        let id = self.generate_id();
        self.breakpoints.push(Breakpoint {
            id: id.clone(),
            node_id: node_id.to_string(),
            condition: condition.to_string(),
            enabled: true,
            hit_once,
            hit_count: 0,
        });
        Some(id)
    }

    /// Re-insert a breakpoint loaded from settings, keeping the id counter
    /// ahead of any restored `bp_<n>` id.
    pub fn restore(&mut self, breakpoint: Breakpoint) -> bool {
        if self.for_node(&breakpoint.node_id).is_some() || self.get(&breakpoint.id).is_some() {
            return false;
        }
        if let Some(n) = breakpoint.id.strip_prefix("bp_").and_then(|n| n.parse::<u64>().ok()) {
            self.next_id = self.next_id.max(n + 1);
        }
        self.breakpoints.push(breakpoint);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Breakpoint> {
        let pos = self.breakpoints.iter().position(|bp| bp.id == id)?;
        Some(self.breakpoints.remove(pos))
    }

    /// Add if absent, remove if present. Returns true if a breakpoint now exists.
    pub fn toggle(&mut self, node_id: &str) -> bool {
        match self.for_node(node_id).map(|bp| bp.id.clone()) {
            Some(id) => {
                self.remove(&id);
                false
            }
            None => self.add(node_id, "", false).is_some(),
        }
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.get_mut(id) {
            Some(bp) => {
                bp.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Breakpoint> {
        self.breakpoints.iter().find(|bp| bp.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Breakpoint> {
        self.breakpoints.iter_mut().find(|bp| bp.id == id)
    }

    pub fn for_node(&self, node_id: &str) -> Option<&Breakpoint> {
        self.breakpoints.iter().find(|bp| bp.node_id == node_id)
    }

    /// Record a hit: bump the count and drop `hit_once` breakpoints.
    /// Returns the breakpoint as it stands after the hit.
    pub fn record_hit(&mut self, id: &str) -> Option<Breakpoint> {
        let pos = self.breakpoints.iter().position(|bp| bp.id == id)?;
        self.breakpoints[pos].hit_count += 1;
        if self.breakpoints[pos].hit_once {
            Some(self.breakpoints.remove(pos))
        } else {
            Some(self.breakpoints[pos].clone())
        }
    }

    pub fn all(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    pub fn clear(&mut self) {
        self.breakpoints.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut reg = BreakpointRegistry::new();
        assert_eq!(reg.add("n1", "", false).as_deref(), Some("bp_1"));
        assert_eq!(reg.add("n2", "", false).as_deref(), Some("bp_2"));
        reg.remove("bp_2");
        // Removed ids are never reused
        assert_eq!(reg.add("n3", "", false).as_deref(), Some("bp_3"));
    }

    #[test]
    fn test_one_breakpoint_per_node() {
        let mut reg = BreakpointRegistry::new();
        assert!(reg.add("n1", "", false).is_some());
        assert!(reg.add("n1", "x > 1", false).is_none());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.for_node("n1").map(|bp| bp.condition.as_str()), Some(""));
    }

    #[test]
    fn test_toggle_twice_restores_set() {
        let mut reg = BreakpointRegistry::new();
        reg.add("keep", "", false);
        let before: Vec<String> = reg.all().iter().map(|bp| bp.node_id.clone()).collect();

        assert!(reg.toggle("n9"));
        assert!(!reg.toggle("n9"));

        let after: Vec<String> = reg.all().iter().map(|bp| bp.node_id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_record_hit_removes_hit_once() {
        let mut reg = BreakpointRegistry::new();
        let sticky = reg.add("a", "", false).unwrap();
        let once = reg.add("b", "", true).unwrap();

        let hit = reg.record_hit(&sticky).unwrap();
        assert_eq!(hit.hit_count, 1);
        assert_eq!(reg.get(&sticky).map(|bp| bp.hit_count), Some(1));

        let hit = reg.record_hit(&once).unwrap();
        assert_eq!(hit.hit_count, 1);
        assert!(reg.get(&once).is_none());
        assert!(reg.record_hit("bp_missing").is_none());
    }

    #[test]
    fn test_restore_advances_counter() {
        let mut reg = BreakpointRegistry::new();
        assert!(reg.restore(Breakpoint {
            id: "bp_7".into(),
            node_id: "n7".into(),
            condition: String::new(),
            enabled: false,
            hit_once: false,
            hit_count: 3,
        }));
        assert_eq!(reg.add("n8", "", false).as_deref(), Some("bp_8"));
        assert!(!reg.set_enabled("bp_404", true));
        assert!(reg.set_enabled("bp_7", true));
        assert!(reg.get("bp_7").unwrap().enabled);
    }
}
