// ── Component lifecycle ──
//
// Mutable side of a component. The owner edits a private draft through
// `update_*` calls, then `notify_updated` commits one snapshot to the store
// if anything actually changed.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::Component;
use crate::store::{ComponentStoreCore, ListenerHooks, OwnerId, WeakComponentStore};

/// Draft, dirty flag and publication state of one component instance.
pub struct ComponentCore<T: Component + Clone> {
    owner: OwnerId,
    store: WeakComponentStore,
    value: T,
    changed: bool,
    published: bool,
    hooks: Option<Arc<ListenerHooks>>,
}

impl<T: Component + Clone> ComponentCore<T> {
    /// Creates a detached component bound to `store`.
    pub fn new(store: &ComponentStoreCore, value: T) -> Self {
        Self {
            owner: OwnerId::next(),
            store: store.downgrade(),
            value,
            changed: false,
            published: false,
            hooks: None,
        }
    }

    /// Installs callbacks run when the kind gains its first listener and
    /// loses its last one while this instance is published.
    pub fn with_listener_hooks(
        mut self,
        on_first: impl Fn() + Send + Sync + 'static,
        on_last: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.hooks = Some(Arc::new(ListenerHooks::new(
            Box::new(on_first),
            Box::new(on_last),
        )));
        self
    }

    /// Current draft, including uncommitted changes.
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn has_pending_changes(&self) -> bool {
        self.changed
    }

    /// Writes `new` into the field selected by `field` and marks the draft
    /// dirty if it differs. Returns whether it changed.
    pub fn update_field<V: PartialEq>(
        &mut self,
        field: impl FnOnce(&mut T) -> &mut V,
        new: V,
    ) -> bool {
        let slot = field(&mut self.value);
        if *slot == new {
            return false;
        }
        *slot = new;
        self.changed = true;
        true
    }

    /// Mutable draft access for multi-field edits. The caller decides
    /// whether the edit is a change through the closure's return value.
    pub fn edit(&mut self, edit: impl FnOnce(&mut T) -> bool) -> bool {
        let changed = edit(&mut self.value);
        self.changed |= changed;
        changed
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Inserts the current draft into the store, replacing any other
    /// component of the same kind, and notifies its listeners.
    pub fn publish(&mut self) {
        let Some(store) = self.store.upgrade() else {
            debug!(uid = %self.value.uid(), "store dropped, component not published");
            return;
        };
        self.changed = false;
        self.published = true;
        debug!(uid = %self.value.uid(), "publishing component");
        store.add(self.owner, Arc::new(self.value.clone()), self.hooks.clone());
    }

    /// Removes this instance from the store. No-op if not published.
    pub fn unpublish(&mut self) {
        if !self.published {
            return;
        }
        self.published = false;
        if let Some(store) = self.store.upgrade() {
            debug!(uid = %self.value.uid(), "unpublishing component");
            store.remove(self.owner, self.value.uid());
        }
    }

    /// Commits pending changes. Exactly one notification when dirty and
    /// published, none otherwise.
    pub fn notify_updated(&mut self) {
        if !self.changed {
            return;
        }
        self.changed = false;
        if !self.published {
            return;
        }
        let Some(store) = self.store.upgrade() else {
            return;
        };
        if !store.update(self.owner, Arc::new(self.value.clone())) {
            debug!(uid = %self.value.uid(), "component slot taken over, update dropped");
        }
    }
}

impl<T: Component + Clone> fmt::Debug for ComponentCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCore")
            .field("value", &self.value)
            .field("changed", &self.changed)
            .field("published", &self.published)
            .finish_non_exhaustive()
    }
}

/// Publication verbs shared by every feature core.
///
/// Implementors only expose their `ComponentCore`; update methods stay on
/// the concrete type and return `&mut Self` so calls chain into
/// `notify_updated()`.
pub trait ComponentLifecycle {
    type Snapshot: Component + Clone;

    fn core(&self) -> &ComponentCore<Self::Snapshot>;

    fn core_mut(&mut self) -> &mut ComponentCore<Self::Snapshot>;

    fn publish(&mut self) {
        self.core_mut().publish();
    }

    fn unpublish(&mut self) {
        self.core_mut().unpublish();
    }

    fn notify_updated(&mut self) {
        self.core_mut().notify_updated();
    }

    fn is_published(&self) -> bool {
        self.core().is_published()
    }

    /// The draft as it would be published now.
    fn snapshot(&self) -> &Self::Snapshot {
        self.core().value()
    }
}
