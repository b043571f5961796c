// ── Value holders ──
//
// Observable single-value cell, used for device names and device states.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::listeners::ListenerSet;
use crate::reference::Ref;

struct HolderInner<T> {
    value: RwLock<Option<Arc<T>>>,
    listeners: ListenerSet,
}

/// Shared, observable slot holding an optional snapshot.
///
/// `set` replaces the value and notifies observers synchronously; `clear`
/// empties the slot and drops observers without notifying them.
pub struct ValueHolder<T: Send + Sync + 'static> {
    inner: Arc<HolderInner<T>>,
}

impl<T: Send + Sync + 'static> ValueHolder<T> {
    pub fn new(initial: Option<T>) -> Self {
        Self {
            inner: Arc::new(HolderInner {
                value: RwLock::new(initial.map(Arc::new)),
                listeners: ListenerSet::default(),
            }),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.inner.value.read().clone()
    }

    /// Replaces the value and notifies every observer.
    pub fn set(&self, value: Arc<T>) {
        *self.inner.value.write() = Some(value);
        self.inner.listeners.notify();
    }

    /// Empties the slot and forgets all observers, silently.
    pub fn clear(&self) {
        *self.inner.value.write() = None;
        self.inner.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Observes the slot. The observer is called right away with the
    /// current value.
    pub fn observe(&self, observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static) -> Ref<T> {
        let weak: Weak<HolderInner<T>> = Arc::downgrade(&self.inner);
        Ref::new(
            move || weak.upgrade().and_then(|inner| inner.value.read().clone()),
            |callback| {
                let (id, _) = self.inner.listeners.insert(callback);
                let weak = Arc::downgrade(&self.inner);
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.listeners.remove(id);
                    }
                })
            },
            observer,
        )
    }
}

impl<T: PartialEq + Send + Sync + 'static> ValueHolder<T> {
    /// Sets and notifies only when the value differs. Returns whether it did.
    pub fn set_if_changed(&self, value: T) -> bool {
        {
            let mut slot = self.inner.value.write();
            if slot.as_deref() == Some(&value) {
                return false;
            }
            *slot = Some(Arc::new(value));
        }
        self.inner.listeners.notify();
        true
    }
}

impl<T: Send + Sync + 'static> Clone for ValueHolder<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Default for ValueHolder<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T: fmt::Debug + Send + Sync + 'static> fmt::Debug for ValueHolder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueHolder")
            .field("value", &self.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn set_if_changed_suppresses_equal_values() {
        let holder = ValueHolder::new(Some(String::from("a")));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _reference = holder.observe(move |v| s.lock().push(v.map(|v| v.to_string())));

        assert!(!holder.set_if_changed(String::from("a")));
        assert!(holder.set_if_changed(String::from("b")));

        assert_eq!(
            *seen.lock(),
            vec![Some(String::from("a")), Some(String::from("b"))]
        );
    }

    #[test]
    fn clear_is_silent() {
        let holder = ValueHolder::new(Some(1_u8));
        let calls = Arc::new(Mutex::new(0));
        let c = Arc::clone(&calls);
        let reference = holder.observe(move |_| *c.lock() += 1);

        holder.clear();
        holder.set(Arc::new(2));

        assert_eq!(*calls.lock(), 1);
        assert!(holder.get().is_some());
        assert!(reference.value().is_none());
    }

    #[test]
    fn reference_outliving_holder_reads_absent() {
        let holder = ValueHolder::new(Some(1_u8));
        let reference = holder.observe(|_| {});
        assert_eq!(*reference.value().unwrap(), 1);

        drop(holder);

        assert!(reference.value().is_none());
    }

    #[test]
    fn dropping_reference_unregisters() {
        let holder = ValueHolder::<u8>::default();
        let reference = holder.observe(|_| {});
        assert_eq!(holder.listener_count(), 1);
        drop(reference);
        assert_eq!(holder.listener_count(), 0);
    }
}
