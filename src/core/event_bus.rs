//! Pub/Sub Event Bus connecting the play mode controller with editor panels.
//!
//! Architecture:
//! - Panels subscribe to event types with callbacks (immediate invocation)
//! - emit() invokes callbacks immediately AND queues for deferred processing
//! - poll() returns queued events for batch processing in the editor frame loop
//!
//! Callback order: FIFO (first-subscribed, first-called) within same event type.
//! Cross-type order undefined - don't rely on ordering between different event types.
//!
//! Every subscription gets a [`SubscriptionId`] so a panel can detach itself
//! without tearing down other subscribers of the same type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use log::{trace, warn};

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Marker trait for events. Events must be Send + Sync + 'static.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

// Blanket impl for all qualifying types
impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased callback
type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SubscriberTable = HashMap<TypeId, Vec<(SubscriptionId, Callback)>>;

/// Shared state behind both [`EventBus`] and [`EventEmitter`].
struct Channel {
    subscribers: RwLock<SubscriberTable>,
    queue: Mutex<Vec<BoxedEvent>>,
    next_id: AtomicU64,
}

impl Channel {
    fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            queue: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot callbacks so a handler may subscribe/emit without deadlocking.
    fn callbacks_for(&self, type_id: TypeId) -> Vec<Callback> {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&type_id)
            .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }

    fn dispatch(&self, type_id: TypeId, event: &dyn Any) {
        for cb in self.callbacks_for(type_id) {
            cb(event);
        }
    }

    fn enqueue(&self, event: BoxedEvent) {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict_count = queue.len() / 2;
            warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
            queue.drain(0..evict_count);
        }
        queue.push(event);
    }

    fn emit<E: Event + Clone>(&self, event: E) {
        trace!("emit {}", event.type_name());
        self.dispatch(TypeId::of::<E>(), &event);
        self.enqueue(Box::new(event));
    }

    fn emit_boxed(&self, event: BoxedEvent) {
        // Deref to dyn Event so type_id/as_any resolve to the inner event,
        // not to Box<dyn Event> (see downcast_event)
        let type_id = (*event).as_any().type_id();
        self.dispatch(type_id, (*event).as_any());
        self.enqueue(event);
    }
}

/// Pub/Sub Event Bus with deferred processing support.
///
/// Two modes of operation:
/// 1. Immediate: subscribe() + emit() triggers callbacks instantly
/// 2. Deferred: emit() also queues events for poll() in the frame loop
///
/// Both modes work together - callbacks fire immediately, and events
/// are also available for batch processing via poll().
#[derive(Clone)]
pub struct EventBus {
    channel: Arc<Channel>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queue_len", &self.queue_len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::new()),
        }
    }

    // ========== Pub/Sub (immediate) ==========

    /// Subscribe to events of type E.
    ///
    /// Callback is invoked immediately when emit() is called.
    /// Use Arc<Mutex<State>> in the callback for state mutations.
    ///
    /// # Example
    /// ```ignore
    /// let hits = Arc::new(Mutex::new(Vec::new()));
    /// let hits_clone = Arc::clone(&hits);
    /// event_bus.subscribe::<BreakpointHitEvent, _>(move |e| {
    ///     hits_clone.lock().unwrap().push(e.node_id.clone());
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, callback: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.channel.next_id.fetch_add(1, Ordering::Relaxed));
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.channel
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, wrapped));
        id
    }

    /// Remove a single subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.channel.subscribers.write().unwrap_or_else(|e| e.into_inner());
        for subs in subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|(sid, _)| *sid == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    /// Emit event: invoke callbacks immediately AND queue for deferred processing.
    pub fn emit<E: Event + Clone>(&self, event: E) {
        self.channel.emit(event);
    }

    /// Emit boxed event (for dynamic dispatch).
    pub fn emit_boxed(&self, event: BoxedEvent) {
        self.channel.emit_boxed(event);
    }

    // ========== Deferred Processing ==========

    /// Poll all queued events for batch processing.
    ///
    /// Returns all events emitted since last poll. Use in the frame loop:
    /// ```ignore
    /// for event in event_bus.poll() {
    ///     handle_app_event(&event, &mut controller);
    /// }
    /// ```
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.channel.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    // ========== Handle & Utilities ==========

    /// Get an emitter handle for the controller and panels.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            channel: Arc::clone(&self.channel),
        }
    }

    /// Clear subscribers for type E
    pub fn unsubscribe_all<E: Event>(&self) {
        self.channel
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&TypeId::of::<E>());
    }

    /// Clear all subscribers and queue
    pub fn clear(&self) {
        self.channel.subscribers.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.channel.queue.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Check if there are subscribers for event type E
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.channel
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    /// Check queue length
    pub fn queue_len(&self) -> usize {
        self.channel.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Lightweight emitter handle.
///
/// Can be cloned and handed to the controller or panels for publishing.
/// Cannot subscribe or poll.
#[derive(Clone)]
pub struct EventEmitter {
    channel: Arc<Channel>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriber_types", &self.channel.subscribers.read().map(|s| s.len()).unwrap_or(0))
            .field("queue_len", &self.channel.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventEmitter {
    /// Emit event: invoke callbacks and queue for deferred processing
    pub fn emit<E: Event + Clone>(&self, event: E) {
        self.channel.emit(event);
    }

    /// Emit boxed event
    pub fn emit_boxed(&self, event: BoxedEvent) {
        self.channel.emit_boxed(event);
    }
}

/// Helper: downcast BoxedEvent to concrete type
///
/// Must explicitly deref to `dyn Event` before calling `as_any()`.
/// Without explicit deref, the blanket impl `Event for Box<dyn Event>` intercepts
/// the call and returns `&dyn Any` containing `Box<dyn Event>` instead of the
/// original type, causing downcast to always fail.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[derive(Clone, Debug)]
    struct NodeEntered { weight: i32 }

    #[derive(Clone, Debug)]
    struct SceneLoaded { scene: String }

    #[test]
    fn test_subscribe_emit_immediate() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<NodeEntered, _>(move |e| {
            c.fetch_add(e.weight, Ordering::SeqCst);
        });

        bus.emit(NodeEntered { weight: 10 });
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        bus.emit(NodeEntered { weight: 5 });
        assert_eq!(counter.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();

        bus.emit(NodeEntered { weight: 1 });
        bus.emit(SceneLoaded { scene: "intro".into() });

        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert_eq!(downcast_event::<SceneLoaded>(&events[1]).map(|e| e.scene.as_str()), Some("intro"));

        // Queue is empty after poll
        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn test_subscribers_called_in_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let o = Arc::clone(&order);
            bus.subscribe::<NodeEntered, _>(move |_| o.lock().unwrap().push(tag));
        }

        bus.emit(NodeEntered { weight: 0 });
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_single() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));

        let c1 = Arc::clone(&counter);
        let keep = bus.subscribe::<NodeEntered, _>(move |e| {
            c1.fetch_add(e.weight, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&counter);
        let drop_me = bus.subscribe::<NodeEntered, _>(move |e| {
            c2.fetch_add(e.weight * 100, Ordering::SeqCst);
        });

        assert!(bus.unsubscribe(drop_me));
        assert!(!bus.unsubscribe(drop_me));

        bus.emit(NodeEntered { weight: 1 });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(bus.has_subscribers::<NodeEntered>());

        assert!(bus.unsubscribe(keep));
        assert!(!bus.has_subscribers::<NodeEntered>());
    }

    #[test]
    fn test_emitter_handle() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        bus.subscribe::<NodeEntered, _>(move |e| {
            c.fetch_add(e.weight, Ordering::SeqCst);
        });

        let emitter = bus.emitter();
        emitter.emit(NodeEntered { weight: 42 });

        assert_eq!(counter.load(Ordering::SeqCst), 42);
        assert_eq!(bus.poll().len(), 1);
    }

    #[test]
    fn test_emit_boxed_reaches_typed_subscriber() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);
        bus.subscribe::<NodeEntered, _>(move |e| {
            c.fetch_add(e.weight, Ordering::SeqCst);
        });

        bus.emit_boxed(Box::new(NodeEntered { weight: 7 }));
        assert_eq!(counter.load(Ordering::SeqCst), 7);
        let events = bus.poll();
        assert!(downcast_event::<NodeEntered>(&events[0]).is_some());
    }

    #[test]
    fn test_subscribe_from_callback_does_not_deadlock() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        bus.subscribe::<SceneLoaded, _>(move |_| {
            inner_bus.subscribe::<NodeEntered, _>(|_| {});
        });

        bus.emit(SceneLoaded { scene: "a".into() });
        assert!(bus.has_subscribers::<NodeEntered>());
    }

    #[test]
    fn test_unsubscribe_all_drops_only_that_type() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicI32::new(0));

        for _ in 0..2 {
            let c = Arc::clone(&counter);
            bus.subscribe::<NodeEntered, _>(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        let c = Arc::clone(&counter);
        bus.subscribe::<SceneLoaded, _>(move |_| {
            c.fetch_add(100, Ordering::SeqCst);
        });

        bus.unsubscribe_all::<NodeEntered>();
        assert!(!bus.has_subscribers::<NodeEntered>());
        assert!(bus.has_subscribers::<SceneLoaded>());

        bus.emit(NodeEntered { weight: 1 });
        bus.emit(SceneLoaded { scene: "intro".into() });
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        // Queue is unaffected by subscriptions
        assert_eq!(bus.poll().len(), 2);
    }

    #[test]
    fn test_queue_eviction() {
        let bus = EventBus::new();
        for i in 0..MAX_QUEUE_SIZE {
            bus.emit(NodeEntered { weight: i as i32 });
        }
        assert_eq!(bus.queue_len(), MAX_QUEUE_SIZE);

        bus.emit(NodeEntered { weight: -1 });
        assert_eq!(bus.queue_len(), MAX_QUEUE_SIZE / 2 + 1);
        let events = bus.poll();
        let first = downcast_event::<NodeEntered>(&events[0]).map(|e| e.weight);
        assert_eq!(first, Some((MAX_QUEUE_SIZE / 2) as i32));
    }
}
