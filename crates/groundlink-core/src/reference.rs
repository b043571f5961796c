// ── Observer references ──
//
// A `Ref` keeps one observer registered against a store slot or a value
// holder, mirrors the latest value into a `watch` channel for async
// consumers, and unregisters itself when dropped.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::store::listeners::Callback;
use crate::stream::RefStream;

pub(crate) type Cancel = Box<dyn FnOnce() + Send + Sync>;

/// Error returned by [`Ref::changed`] once no further update can arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("reference no longer receives updates")]
pub struct RefClosed;

/// Unregisters a listener exactly once, at the latest on drop.
pub(crate) struct Registration(Option<Cancel>);

impl Registration {
    pub(crate) fn new(cancel: Cancel) -> Self {
        Self(Some(cancel))
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(cancel) = self.0.take() {
            cancel();
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A live, cancelable view on an observable value.
///
/// The observer passed at creation is called once right away with the
/// current value (which may be absent) and again after every committed
/// change, until [`unregister`](Ref::unregister) is called or the `Ref` is
/// dropped.
pub struct Ref<T: ?Sized + Send + Sync + 'static> {
    receiver: watch::Receiver<Option<Arc<T>>>,
    registration: Registration,
}

impl<T: ?Sized + Send + Sync + 'static> Ref<T> {
    /// Wires an observer between a value source and its listener registry.
    ///
    /// `fetch` reads the current value, `subscribe` registers the change
    /// callback and hands back the matching unregister action.
    pub(crate) fn new<F, S, O>(fetch: F, subscribe: S, observer: O) -> Self
    where
        F: Fn() -> Option<Arc<T>> + Send + Sync + 'static,
        S: FnOnce(Callback) -> Cancel,
        O: Fn(Option<Arc<T>>) + Send + Sync + 'static,
    {
        let initial = fetch();
        let (sender, receiver) = watch::channel(initial.clone());
        let observer = Arc::new(observer);

        let on_change: Callback = {
            let observer = Arc::clone(&observer);
            Arc::new(move || {
                let value = fetch();
                sender.send_replace(value.clone());
                observer(value);
            })
        };
        let registration = Registration::new(subscribe(on_change));

        observer(initial);

        Self {
            receiver,
            registration,
        }
    }

    /// Latest value seen by this reference.
    ///
    /// Absent once the source is gone: the observed store or holder was
    /// cleared or dropped, or the reference was unregistered.
    pub fn value(&self) -> Option<Arc<T>> {
        // The sender lives in the registered callback.
        if self.receiver.has_changed().is_err() {
            return None;
        }
        self.receiver.borrow().clone()
    }

    /// Stops observing. Idempotent; the observer is never called again.
    pub fn unregister(&mut self) {
        self.registration.cancel();
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_active()
    }

    /// Waits for the next committed change and returns the new value.
    pub async fn changed(&mut self) -> Result<Option<Arc<T>>, RefClosed> {
        self.receiver.changed().await.map_err(|_| RefClosed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// Converts into a `Stream` yielding the current value, then each change.
    pub fn into_stream(self) -> RefStream<T> {
        let Self {
            receiver,
            registration,
        } = self;
        RefStream::new(receiver, registration)
    }
}

impl<T: ?Sized + Send + Sync + fmt::Debug + 'static> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.value())
            .field("registered", &self.is_registered())
            .finish()
    }
}
