//! Direct-callback listeners for play mode transitions.
//!
//! Listeners are held weakly: the registry never keeps a panel alive, and a
//! dropped listener is pruned on the next notification. Callbacks run
//! synchronously in registration order.

use std::sync::{Arc, Mutex, Weak};

use super::breakpoints::Breakpoint;
use super::state::PlayModeState;

/// Listener interface for play mode events. All methods default to no-ops.
pub trait PlayModeListener: Send {
    fn on_play_mode_state_changed(&mut self, _old_state: PlayModeState, _new_state: PlayModeState) {}
    fn on_play_mode_starting(&mut self) {}
    fn on_play_mode_started(&mut self) {}
    fn on_play_mode_paused(&mut self) {}
    fn on_play_mode_resumed(&mut self) {}
    fn on_play_mode_stopping(&mut self) {}
    fn on_play_mode_stopped(&mut self) {}
    fn on_breakpoint_hit(&mut self, _breakpoint: &Breakpoint) {}
    fn on_script_error(&mut self, _error: &str, _node_id: &str) {}
}

/// Handle returned by [`ListenerRegistry::add`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerRef = Weak<Mutex<dyn PlayModeListener>>;

#[derive(Default)]
pub struct ListenerRegistry {
    entries: Vec<(ListenerId, ListenerRef)>,
    next_id: u64,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.entries.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same allocation twice returns the
    /// original id.
    pub fn add<L: PlayModeListener + 'static>(&mut self, listener: &Arc<Mutex<L>>) -> ListenerId {
        let listener: Arc<Mutex<dyn PlayModeListener>> = listener.clone();
        let weak = Arc::downgrade(&listener);

        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| std::ptr::addr_eq(existing.as_ptr(), weak.as_ptr()))
        {
            return *id;
        }

        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, weak));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _)| *lid != id);
        self.entries.len() != before
    }

    /// Live listeners only
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|(_, l)| l.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Invoke `f` on every live listener in registration order.
    pub fn notify<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn PlayModeListener),
    {
        self.entries.retain(|(_, l)| l.strong_count() > 0);
        for (_, weak) in &self.entries {
            if let Some(listener) = weak.upgrade() {
                let mut guard = listener.lock().unwrap_or_else(|e| e.into_inner());
                f(&mut *guard);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        started: u32,
    }

    impl PlayModeListener for Counter {
        fn on_play_mode_started(&mut self) {
            self.started += 1;
        }
    }

    struct Tagged {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl PlayModeListener for Tagged {
        fn on_play_mode_paused(&mut self) {
            self.log.lock().unwrap().push(self.tag);
        }
    }

    #[test]
    fn test_duplicate_add_returns_same_id() {
        let mut reg = ListenerRegistry::new();
        let counter = Arc::new(Mutex::new(Counter::default()));
        let a = reg.add(&counter);
        let b = reg.add(&counter);
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);

        reg.notify(|l| l.on_play_mode_started());
        assert_eq!(counter.lock().unwrap().started, 1);
    }

    #[test]
    fn test_notify_in_registration_order() {
        let mut reg = ListenerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::new(Mutex::new(Tagged { tag: "first", log: Arc::clone(&log) }));
        let second = Arc::new(Mutex::new(Tagged { tag: "second", log: Arc::clone(&log) }));
        reg.add(&first);
        reg.add(&second);

        reg.notify(|l| l.on_play_mode_paused());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let mut reg = ListenerRegistry::new();
        let kept = Arc::new(Mutex::new(Counter::default()));
        reg.add(&kept);
        {
            let temp = Arc::new(Mutex::new(Counter::default()));
            reg.add(&temp);
            assert_eq!(reg.len(), 2);
        }
        assert_eq!(reg.len(), 1);

        reg.notify(|l| l.on_play_mode_started());
        assert_eq!(kept.lock().unwrap().started, 1);
    }

    #[test]
    fn test_remove_by_id() {
        let mut reg = ListenerRegistry::new();
        let counter = Arc::new(Mutex::new(Counter::default()));
        let id = reg.add(&counter);
        assert!(reg.remove(id));
        assert!(!reg.remove(id));

        reg.notify(|l| l.on_play_mode_started());
        assert_eq!(counter.lock().unwrap().started, 0);
        assert!(reg.is_empty());
    }
}
