use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

/// Callback invoked with `(store name, changed key)` after a write changes a key.
///
/// Listeners are compared by identity, so keep the `Arc` around to unsubscribe.
pub type ChangeListener = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Set of change listeners shared by every clone of a store handle.
#[derive(Clone, Default)]
pub(crate) struct ListenerRegistry {
    listeners: Arc<Mutex<Vec<ChangeListener>>>,
}

impl ListenerRegistry {
    pub fn register(&self, listener: &ChangeListener) {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| Arc::ptr_eq(l, listener)) {
            return;
        }
        listeners.push(Arc::clone(listener));
        debug!(total_listeners = listeners.len(), "change listener registered");
    }

    pub fn unregister(&self, listener: &ChangeListener) {
        let mut listeners = self.listeners.lock();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        debug!(remaining_listeners = listeners.len(), "change listener unregistered");
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Calls every listener once per changed key.
    ///
    /// The listener list is copied first so callbacks may subscribe or
    /// unsubscribe without deadlocking.
    pub fn notify(&self, store: &str, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let listeners = self.listeners.lock().clone();
        for key in keys {
            for listener in &listeners {
                listener(store, key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_listener() -> (ChangeListener, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: ChangeListener = Arc::new(move |store: &str, key: &str| {
            sink.lock().push(format!("{}:{}", store, key));
        });
        (listener, seen)
    }

    #[test]
    fn test_notify_calls_listener_per_key() {
        let registry = ListenerRegistry::default();
        let (listener, seen) = recording_listener();
        registry.register(&listener);

        registry.notify("prefs", &["a".to_string(), "b".to_string()]);

        assert_eq!(*seen.lock(), ["prefs:a", "prefs:b"]);
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = ListenerRegistry::default();
        let (listener, seen) = recording_listener();
        registry.register(&listener);
        registry.register(&listener);

        registry.notify("prefs", &["a".to_string()]);

        assert_eq!(registry.len(), 1);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_unregister_stops_notifications() {
        let registry = ListenerRegistry::default();
        let (listener, seen) = recording_listener();
        registry.register(&listener);
        registry.unregister(&listener);
        registry.unregister(&listener);

        registry.notify("prefs", &["a".to_string()]);

        assert_eq!(registry.len(), 0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let registry = ListenerRegistry::default();
        let slot: Arc<Mutex<Option<ChangeListener>>> = Arc::new(Mutex::new(None));
        let registry_clone = registry.clone();
        let slot_clone = Arc::clone(&slot);
        let listener: ChangeListener = Arc::new(move |_store: &str, _key: &str| {
            if let Some(me) = slot_clone.lock().take() {
                registry_clone.unregister(&me);
            }
        });
        *slot.lock() = Some(Arc::clone(&listener));
        registry.register(&listener);

        registry.notify("prefs", &["a".to_string()]);

        assert_eq!(registry.len(), 0);
    }
}
