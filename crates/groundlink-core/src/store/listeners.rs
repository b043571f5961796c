// ── Listener sets ──
//
// Ordered callback registry shared by component stores and value holders.
// Notification walks a snapshot taken under the lock, then calls each
// callback with no lock held, skipping entries removed in the meantime.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;

pub(crate) type Callback = Arc<dyn Fn() + Send + Sync>;

/// Process-unique listener identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Default)]
pub(crate) struct ListenerSet {
    entries: Mutex<IndexMap<ListenerId, Callback>>,
}

impl ListenerSet {
    /// Adds a callback. Returns its id and whether the set was empty before.
    pub(crate) fn insert(&self, callback: Callback) -> (ListenerId, bool) {
        let id = ListenerId::next();
        let mut entries = self.entries.lock();
        let was_empty = entries.is_empty();
        entries.insert(id, callback);
        (id, was_empty)
    }

    /// Removes a callback. Returns `Some(true)` when the set became empty,
    /// `None` when the id was not registered.
    pub(crate) fn remove(&self, id: ListenerId) -> Option<bool> {
        let mut entries = self.entries.lock();
        entries.shift_remove(&id)?;
        Some(entries.is_empty())
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Calls every listener registered when the call starts, in
    /// registration order. Listeners unregistered by an earlier callback
    /// are skipped; listeners added meanwhile wait for the next round.
    pub(crate) fn notify(&self) {
        let snapshot: Vec<(ListenerId, Callback)> = self
            .entries
            .lock()
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        for (id, callback) in snapshot {
            if self.contains(id) {
                callback();
            }
        }
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (
            count,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn insert_reports_first_listener() {
        let set = ListenerSet::default();
        let (_, cb) = counter();
        let (_, first) = set.insert(Arc::clone(&cb));
        let (_, second) = set.insert(cb);
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn remove_reports_last_listener() {
        let set = ListenerSet::default();
        let (_, cb) = counter();
        let (a, _) = set.insert(Arc::clone(&cb));
        let (b, _) = set.insert(cb);
        assert_eq!(set.remove(a), Some(false));
        assert_eq!(set.remove(b), Some(true));
        assert_eq!(set.remove(b), None);
    }

    #[test]
    fn listener_removed_during_notify_is_skipped() {
        let set = Arc::new(ListenerSet::default());
        let (count, cb) = counter();
        let victim = Arc::new(Mutex::new(None));

        let remover = {
            let set = Arc::clone(&set);
            let victim = Arc::clone(&victim);
            Arc::new(move || {
                if let Some(id) = victim.lock().take() {
                    set.remove(id);
                }
            })
        };
        set.insert(remover);
        let (id, _) = set.insert(cb);
        *victim.lock() = Some(id);

        set.notify();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_added_during_notify_waits_for_next_round() {
        let set = Arc::new(ListenerSet::default());
        let (count, cb) = counter();
        let pending = Arc::new(Mutex::new(Some(cb)));

        let adder = {
            let set = Arc::clone(&set);
            let pending = Arc::clone(&pending);
            Arc::new(move || {
                if let Some(cb) = pending.lock().take() {
                    set.insert(cb);
                }
            })
        };
        set.insert(adder);

        set.notify();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        set.notify();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
