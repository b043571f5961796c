// ── Observable storage ──
//
// Per-device component stores and single-value holders, both built on the
// same ordered listener sets.

mod component_store;
mod holder;
pub(crate) mod listeners;

pub(crate) use component_store::{ListenerHooks, OwnerId, WeakComponentStore};
pub use component_store::{ComponentStoreCore, ListenerToken};
pub use holder::ValueHolder;
