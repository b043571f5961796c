// ── Component store ──
//
// One slot per component kind, keyed by `ComponentUid`. Slots hold
// immutable snapshots; listeners are registered per kind and survive the
// kind being published, replaced or removed.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::trace;

use super::listeners::{Callback, ListenerId, ListenerSet};
use crate::component::{Component, ComponentDescriptor, ComponentUid};
use crate::reference::{Cancel, Ref};

/// Identity of the `ComponentCore` instance that inserted a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct OwnerId(u64);

impl OwnerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Callbacks fired when a published kind gains its first listener or loses
/// its last one.
pub(crate) struct ListenerHooks {
    first: Hook,
    last: Hook,
}

impl ListenerHooks {
    pub(crate) fn new(first: Hook, last: Hook) -> Self {
        Self { first, last }
    }
}

#[derive(Clone)]
struct StoredComponent {
    owner: OwnerId,
    component: Arc<dyn Component>,
    any: Arc<dyn Any + Send + Sync>,
    hooks: Option<Arc<ListenerHooks>>,
}

#[derive(Default)]
struct StoreInner {
    components: DashMap<ComponentUid, StoredComponent>,
    listeners: DashMap<ComponentUid, Arc<ListenerSet>>,
}

/// Handle returned by [`ComponentStoreCore::register`].
///
/// Dropping the token does not unregister; pass it back to
/// [`ComponentStoreCore::unregister`]. Use [`ComponentStoreCore::observe`]
/// for a self-unregistering [`Ref`].
#[must_use = "the listener stays registered until the token is passed to `unregister`"]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ListenerToken {
    uid: ComponentUid,
    id: ListenerId,
}

impl ListenerToken {
    pub fn uid(&self) -> ComponentUid {
        self.uid
    }
}

/// Registry of the components published by one device, plus per-kind
/// change listeners.
///
/// Cloning yields another handle on the same store. No lock is held while a
/// listener runs, so listeners may read the store, register or unregister.
#[derive(Clone, Default)]
pub struct ComponentStoreCore {
    inner: Arc<StoreInner>,
}

/// Non-owning store handle held by components and references.
#[derive(Clone, Default)]
pub(crate) struct WeakComponentStore(Weak<StoreInner>);

impl WeakComponentStore {
    pub(crate) fn upgrade(&self) -> Option<ComponentStoreCore> {
        self.0.upgrade().map(|inner| ComponentStoreCore { inner })
    }
}

impl fmt::Debug for WeakComponentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakComponentStore")
            .field(&(self.0.strong_count() > 0))
            .finish()
    }
}

impl ComponentStoreCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn downgrade(&self) -> WeakComponentStore {
        WeakComponentStore(Arc::downgrade(&self.inner))
    }

    // ── Reads ──

    /// Published snapshot for the descriptor's kind, if any.
    pub fn get<T: Component>(&self, descriptor: ComponentDescriptor<T>) -> Option<Arc<T>> {
        let any = self
            .inner
            .components
            .get(&descriptor.uid())
            .map(|entry| Arc::clone(&entry.any))?;
        any.downcast::<T>().ok()
    }

    /// Published snapshot for a raw kind uid, type-erased.
    pub fn get_by_uid(&self, uid: impl Into<ComponentUid>) -> Option<Arc<dyn Component>> {
        self.inner
            .components
            .get(&uid.into())
            .map(|entry| Arc::clone(&entry.component))
    }

    pub fn contains(&self, uid: impl Into<ComponentUid>) -> bool {
        self.inner.components.contains_key(&uid.into())
    }

    /// Uids of every published component, ascending.
    pub fn uids(&self) -> Vec<ComponentUid> {
        let mut uids: Vec<_> = self.inner.components.iter().map(|e| *e.key()).collect();
        uids.sort_unstable();
        uids
    }

    pub fn len(&self) -> usize {
        self.inner.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.components.is_empty()
    }

    /// Number of listeners registered for a kind.
    pub fn listener_count(&self, uid: impl Into<ComponentUid>) -> usize {
        self.listener_set(uid.into()).map_or(0, |set| set.len())
    }

    // ── Listeners ──

    /// Registers a listener called after every change of the kind's slot.
    pub fn register(
        &self,
        uid: impl Into<ComponentUid>,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> ListenerToken {
        self.register_callback(uid.into(), Arc::new(listener))
    }

    /// Unregisters a listener. Unknown or already removed tokens are ignored.
    pub fn unregister(&self, token: ListenerToken) {
        let Some(set) = self.listener_set(token.uid) else {
            return;
        };
        if set.remove(token.id) == Some(true) {
            if let Some(hooks) = self.hooks(token.uid) {
                (hooks.last)();
            }
        }
    }

    /// Observes a typed component slot.
    pub fn observe<T: Component>(
        &self,
        descriptor: ComponentDescriptor<T>,
        observer: impl Fn(Option<Arc<T>>) + Send + Sync + 'static,
    ) -> Ref<T> {
        let weak = self.downgrade();
        Ref::new(
            move || weak.upgrade().and_then(|store| store.get(descriptor)),
            |callback| self.subscribe(descriptor.uid(), callback),
            observer,
        )
    }

    /// Observes a slot by raw uid, type-erased.
    pub fn observe_uid(
        &self,
        uid: impl Into<ComponentUid>,
        observer: impl Fn(Option<Arc<dyn Component>>) + Send + Sync + 'static,
    ) -> Ref<dyn Component> {
        let uid = uid.into();
        let weak = self.downgrade();
        Ref::new(
            move || weak.upgrade().and_then(|store| store.get_by_uid(uid)),
            |callback| self.subscribe(uid, callback),
            observer,
        )
    }

    /// Drops every component and listener without notifying anyone.
    pub fn clear(&self) {
        self.inner.components.clear();
        for entry in self.inner.listeners.iter() {
            entry.value().clear();
        }
        self.inner.listeners.clear();
    }

    // ── Component side ──

    /// Inserts or replaces the slot of `component`'s kind and notifies.
    pub(crate) fn add<T: Component>(
        &self,
        owner: OwnerId,
        component: Arc<T>,
        hooks: Option<Arc<ListenerHooks>>,
    ) {
        let uid = component.uid();
        let any = Arc::clone(&component) as Arc<dyn Any + Send + Sync>;
        self.inner.components.insert(
            uid,
            StoredComponent {
                owner,
                component,
                any,
                hooks: hooks.clone(),
            },
        );
        if let Some(hooks) = hooks {
            if self.listener_count(uid) > 0 {
                (hooks.first)();
            }
        }
        self.notify(uid);
    }

    /// Removes the slot if `owner` inserted it. Returns whether it did.
    pub(crate) fn remove(&self, owner: OwnerId, uid: ComponentUid) -> bool {
        let removed = self
            .inner
            .components
            .remove_if(&uid, |_, entry| entry.owner == owner)
            .is_some();
        if removed {
            self.notify(uid);
        }
        removed
    }

    /// Swaps in a new snapshot if `owner` holds the slot, then notifies.
    pub(crate) fn update<T: Component>(&self, owner: OwnerId, component: Arc<T>) -> bool {
        let uid = component.uid();
        let replaced = if let Some(mut entry) = self.inner.components.get_mut(&uid) {
            if entry.owner == owner {
                entry.component = Arc::clone(&component) as Arc<dyn Component>;
                entry.any = component;
                true
            } else {
                false
            }
        } else {
            false
        };
        if replaced {
            self.notify(uid);
        }
        replaced
    }

    fn notify(&self, uid: ComponentUid) {
        if let Some(set) = self.listener_set(uid) {
            trace!(%uid, listeners = set.len(), "notifying component listeners");
            set.notify();
        }
    }

    fn register_callback(&self, uid: ComponentUid, callback: Callback) -> ListenerToken {
        let set = Arc::clone(self.inner.listeners.entry(uid).or_default().value());
        let (id, was_empty) = set.insert(callback);
        if was_empty {
            if let Some(hooks) = self.hooks(uid) {
                (hooks.first)();
            }
        }
        ListenerToken { uid, id }
    }

    fn subscribe(&self, uid: ComponentUid, callback: Callback) -> Cancel {
        let token = self.register_callback(uid, callback);
        let weak = self.downgrade();
        Box::new(move || {
            if let Some(store) = weak.upgrade() {
                store.unregister(token);
            }
        })
    }

    fn listener_set(&self, uid: ComponentUid) -> Option<Arc<ListenerSet>> {
        self.inner
            .listeners
            .get(&uid)
            .map(|set| Arc::clone(set.value()))
    }

    fn hooks(&self, uid: ComponentUid) -> Option<Arc<ListenerHooks>> {
        self.inner
            .components
            .get(&uid)
            .and_then(|entry| entry.hooks.clone())
    }
}

impl fmt::Debug for ComponentStoreCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentStoreCore")
            .field("components", &self.uids())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::store::test_support::{PROBE, Probe};

    fn probe(value: u32) -> Arc<Probe> {
        Arc::new(Probe {
            value,
            label: String::new(),
        })
    }

    fn counting(store: &ComponentStoreCore) -> (Arc<AtomicUsize>, ListenerToken) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let token = store.register(PROBE.uid(), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, token)
    }

    #[test]
    fn get_returns_typed_snapshot() {
        let store = ComponentStoreCore::new();
        assert!(store.get(PROBE).is_none());

        store.add(OwnerId::next(), probe(7), None);

        assert_eq!(store.get(PROBE).unwrap().value, 7);
        assert_eq!(store.get_by_uid(PROBE.uid()).unwrap().uid(), PROBE.uid());
        assert_eq!(store.uids(), vec![PROBE.uid()]);
    }

    #[test]
    fn second_publisher_replaces_first_and_owns_slot() {
        let store = ComponentStoreCore::new();
        let (count, _token) = counting(&store);
        let first = OwnerId::next();
        let second = OwnerId::next();

        store.add(first, probe(1), None);
        store.add(second, probe(2), None);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert!(!store.update(first, probe(3)));
        assert!(!store.remove(first, PROBE.uid()));
        assert_eq!(store.get(PROBE).unwrap().value, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert!(store.remove(second, PROBE.uid()));
        assert!(store.get(PROBE).is_none());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unregister_stops_notifications() {
        let store = ComponentStoreCore::new();
        let owner = OwnerId::next();
        let (count, token) = counting(&store);

        store.add(owner, probe(1), None);
        store.unregister(token);
        store.update(owner, probe(2));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(PROBE.uid()), 0);
    }

    #[test]
    fn listener_may_unregister_itself_during_notification() {
        let store = ComponentStoreCore::new();
        let owner = OwnerId::next();
        let count = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<ListenerToken>>> = Arc::new(Mutex::new(None));

        let token = {
            let handle = store.clone();
            let count = Arc::clone(&count);
            let slot = Arc::clone(&slot);
            store.register(PROBE.uid(), move || {
                count.fetch_add(1, Ordering::SeqCst);
                if let Some(token) = slot.lock().take() {
                    handle.unregister(token);
                }
            })
        };
        *slot.lock() = Some(token);

        store.add(owner, probe(1), None);
        store.update(owner, probe(2));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_hooks_fire_on_first_and_last_listener() {
        let store = ComponentStoreCore::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let hooks = {
            let first = Arc::clone(&events);
            let last = Arc::clone(&events);
            Arc::new(ListenerHooks::new(
                Box::new(move || first.lock().push("first")),
                Box::new(move || last.lock().push("last")),
            ))
        };

        store.add(OwnerId::next(), probe(1), Some(hooks));
        let (_, a) = counting(&store);
        let (_, b) = counting(&store);
        store.unregister(a);
        store.unregister(b);

        assert_eq!(*events.lock(), vec!["first", "last"]);
    }

    #[test]
    fn hooks_fire_when_published_with_existing_listener() {
        let store = ComponentStoreCore::new();
        let (_, _token) = counting(&store);
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let hooks = Arc::new(ListenerHooks::new(
            Box::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(|| {}),
        ));

        store.add(OwnerId::next(), probe(1), Some(hooks));

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_drops_everything_silently() {
        let store = ComponentStoreCore::new();
        let (count, _token) = counting(&store);
        store.add(OwnerId::next(), probe(1), None);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.listener_count(PROBE.uid()), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observe_calls_back_immediately_even_when_absent() {
        let store = ComponentStoreCore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);

        let reference = store.observe(PROBE, move |value| {
            s.lock().push(value.map(|p| p.value));
        });
        store.add(OwnerId::next(), probe(5), None);

        assert_eq!(*seen.lock(), vec![None, Some(5)]);
        assert_eq!(reference.value().unwrap().value, 5);
    }

    #[test]
    fn dropped_reference_is_never_called_again() {
        let store = ComponentStoreCore::new();
        let owner = OwnerId::next();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);

        let mut reference = store.observe(PROBE, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        store.add(owner, probe(1), None);
        reference.unregister();
        reference.unregister();
        store.update(owner, probe(2));
        drop(reference);
        store.remove(owner, PROBE.uid());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.listener_count(PROBE.uid()), 0);
    }

    #[test]
    fn observe_uid_sees_type_erased_component() {
        let store = ComponentStoreCore::new();
        let reference = store.observe_uid(PROBE.uid(), |_| {});
        assert!(reference.value().is_none());

        store.add(OwnerId::next(), probe(9), None);

        assert_eq!(reference.value().unwrap().uid(), PROBE.uid());
    }

    #[test]
    fn reference_outliving_store_reads_absent() {
        let store = ComponentStoreCore::new();
        store.add(OwnerId::next(), probe(1), None);
        let mut reference = store.observe(PROBE, |_| {});
        assert_eq!(reference.value().unwrap().value, 1);

        drop(store);

        assert!(reference.value().is_none());
        reference.unregister();
        assert!(!reference.is_registered());
    }

    #[test]
    fn reference_reads_absent_after_clear() {
        let store = ComponentStoreCore::new();
        store.add(OwnerId::next(), probe(1), None);
        let typed = store.observe(PROBE, |_| {});
        let erased = store.observe_uid(PROBE.uid(), |_| {});

        store.clear();

        assert!(store.get(PROBE).is_none());
        assert!(typed.value().is_none());
        assert!(erased.value().is_none());
    }

    #[test]
    fn unregistered_reference_reads_absent() {
        let store = ComponentStoreCore::new();
        store.add(OwnerId::next(), probe(1), None);
        let mut reference = store.observe(PROBE, |_| {});

        reference.unregister();

        assert!(store.get(PROBE).is_some());
        assert!(reference.value().is_none());
    }

    #[tokio::test]
    async fn reference_changed_yields_new_value() {
        let store = ComponentStoreCore::new();
        let owner = OwnerId::next();
        store.add(owner, probe(1), None);
        let mut reference = store.observe(PROBE, |_| {});

        store.update(owner, probe(2));

        let value = reference.changed().await.unwrap();
        assert_eq!(value.unwrap().value, 2);
    }

    #[tokio::test]
    async fn reference_stream_ends_after_clear() {
        use futures_util::StreamExt;

        let store = ComponentStoreCore::new();
        store.add(OwnerId::next(), probe(1), None);
        let mut stream = store.observe(PROBE, |_| {}).into_stream();

        let first = stream.next().await.unwrap();
        assert_eq!(first.unwrap().value, 1);

        store.clear();
        assert!(stream.next().await.is_none());
    }
}
