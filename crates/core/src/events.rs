//! Event bus - engine signals consumed by the bridge
//!
//! Listeners are stored in a slotmap keyed registry, following the same
//! pattern for every event: register a callback, keep the key, remove it
//! later. Callbacks run on the thread that sends the event, outside of the
//! registry lock, so a callback may subscribe or unsubscribe.
//!
//! # Example
//!
//! ```ignore
//! use objbridge_core::events::{EventArgs, ENGINE_INITIALIZED};
//!
//! let key = context.events().subscribe(ENGINE_INITIALIZED, |_, args| {
//!     tracing::info!("Engine initialized with {} args", args.len());
//! });
//!
//! context.events().unsubscribe(key);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::hash::TypeHash;

new_key_type! {
    /// Key for registered listeners, used for removal
    pub struct ListenerKey;
}

/// Generic event payload
pub type EventArgs = serde_json::Map<String, serde_json::Value>;

/// Listener callback type
pub type EventCallback = Arc<dyn Fn(TypeHash, &EventArgs) + Send + Sync>;

/// Sent by the engine once its subsystems are up; triggers the factory scan
pub const ENGINE_INITIALIZED: TypeHash = TypeHash::from_name("EngineInitialized");

struct Listener {
    event: TypeHash,
    callback: EventCallback,
}

/// Per-context event registry
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<SlotMap<ListenerKey, Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `event`
    ///
    /// # Returns
    /// A key that can be used to unregister the callback via `unsubscribe`.
    pub fn subscribe<F>(&self, event: TypeHash, callback: F) -> ListenerKey
    where
        F: Fn(TypeHash, &EventArgs) + Send + Sync + 'static,
    {
        self.listeners.write().insert(Listener {
            event,
            callback: Arc::new(callback),
        })
    }

    /// Remove a listener by its key
    ///
    /// Returns `true` if the listener was found and removed.
    pub fn unsubscribe(&self, key: ListenerKey) -> bool {
        self.listeners.write().remove(key).is_some()
    }

    /// Fire `event` to every listener registered for it
    ///
    /// Returns the number of callbacks invoked.
    pub fn send(&self, event: TypeHash, args: &EventArgs) -> usize {
        let callbacks: Vec<EventCallback> = self
            .listeners
            .read()
            .values()
            .filter(|listener| listener.event == event)
            .map(|listener| Arc::clone(&listener.callback))
            .collect();

        tracing::trace!("Sending {} to {} listeners", event, callbacks.len());
        for callback in &callbacks {
            callback(event, args);
        }
        callbacks.len()
    }

    pub fn listener_count(&self, event: TypeHash) -> usize {
        self.listeners
            .read()
            .values()
            .filter(|listener| listener.event == event)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OTHER: TypeHash = TypeHash::from_name("Other");

    #[test]
    fn test_send_reaches_matching_listeners_only() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        bus.subscribe(ENGINE_INITIALIZED, move |event, _| {
            assert_eq!(event, ENGINE_INITIALIZED);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        bus.subscribe(OTHER, |_, _| panic!("wrong event"));

        assert_eq!(bus.send(ENGINE_INITIALIZED, &EventArgs::new()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let key = bus.subscribe(OTHER, |_, _| {});
        assert_eq!(bus.listener_count(OTHER), 1);

        assert!(bus.unsubscribe(key));
        assert!(!bus.unsubscribe(key));
        assert_eq!(bus.send(OTHER, &EventArgs::new()), 0);
    }

    #[test]
    fn test_args_are_forwarded() {
        let bus = EventBus::new();
        bus.subscribe(OTHER, |_, args| {
            assert_eq!(args.get("frame"), Some(&serde_json::Value::from(3)));
        });

        let mut args = EventArgs::new();
        args.insert("frame".into(), 3.into());
        bus.send(OTHER, &args);
    }

    #[test]
    fn test_callback_may_subscribe() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);
        bus.subscribe(OTHER, move |_, _| {
            inner.subscribe(ENGINE_INITIALIZED, |_, _| {});
        });

        bus.send(OTHER, &EventArgs::new());
        assert_eq!(bus.listener_count(ENGINE_INITIALIZED), 1);
    }
}
