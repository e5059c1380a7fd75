//! Content-change notification channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Receives "contents changed" notifications.
pub trait ContentChangeListener: Send + Sync {
    fn content_changed(&self, source: &ContentChangeNotifier);
}

/// Fans a change notification out to its subscribers.
///
/// Subscribers are held weakly; a dropped listener is pruned on the next
/// notification.
#[derive(Default)]
pub struct ContentChangeNotifier {
    listeners: Mutex<Vec<Weak<dyn ContentChangeListener>>>,
}

impl ContentChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener`. Subscribing the same listener twice is a no-op.
    pub fn subscribe(&self, listener: &Arc<dyn ContentChangeListener>) {
        let weak = Arc::downgrade(listener);
        let mut listeners = self.table();
        if !listeners.iter().any(|l| Weak::ptr_eq(l, &weak)) {
            listeners.push(weak);
        }
    }

    /// Returns `true` if `listener` was subscribed.
    pub fn unsubscribe(&self, listener: &Arc<dyn ContentChangeListener>) -> bool {
        let weak = Arc::downgrade(listener);
        let mut listeners = self.table();
        let before = listeners.len();
        listeners.retain(|l| !Weak::ptr_eq(l, &weak));
        listeners.len() != before
    }

    /// Tell every live subscriber that the contents changed.
    pub fn notify(&self) {
        let live: Vec<Arc<dyn ContentChangeListener>> = {
            let mut listeners = self.table();
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            listener.content_changed(self);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.table().iter().filter(|l| l.strong_count() > 0).count()
    }

    fn table(&self) -> MutexGuard<'_, Vec<Weak<dyn ContentChangeListener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ContentChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
