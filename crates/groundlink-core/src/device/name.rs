// ── Device name holder ──

use std::sync::Arc;

use crate::reference::Ref;
use crate::store::ValueHolder;

/// Observable device name.
#[derive(Debug, Clone, Default)]
pub struct NameHolderCore {
    holder: ValueHolder<String>,
}

impl NameHolderCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            holder: ValueHolder::new(Some(name.into())),
        }
    }

    pub fn name(&self) -> Option<Arc<String>> {
        self.holder.get()
    }

    /// Sets the name, notifying observers only when it differs.
    pub fn update(&self, name: impl Into<String>) -> bool {
        self.holder.set_if_changed(name.into())
    }

    pub fn observe(
        &self,
        observer: impl Fn(Option<Arc<String>>) + Send + Sync + 'static,
    ) -> Ref<String> {
        self.holder.observe(observer)
    }

    pub fn clear(&self) {
        self.holder.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn update_notifies_on_change_only() {
        let name = NameHolderCore::new("ANAFI-001");
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _reference = name.observe(move |n| s.lock().push(n.unwrap().to_string()));

        assert!(!name.update("ANAFI-001"));
        assert!(name.update("Backyard"));

        assert_eq!(*seen.lock(), vec!["ANAFI-001", "Backyard"]);
    }
}
