// ── Reference streams ──
//
// `Stream` adapter over a `Ref`'s watch channel. The registration travels
// with the stream so the underlying listener stays alive while polled.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::reference::Registration;

/// Yields the current value, then one item per committed change.
///
/// Ends once the reference is unregistered, i.e. when the stream is the
/// last owner of the registration and gets dropped, or when the observed
/// source goes away.
pub struct RefStream<T: ?Sized + Send + Sync + 'static> {
    inner: WatchStream<Option<Arc<T>>>,
    _registration: Registration,
}

impl<T: ?Sized + Send + Sync + 'static> RefStream<T> {
    pub(crate) fn new(
        receiver: watch::Receiver<Option<Arc<T>>>,
        registration: Registration,
    ) -> Self {
        Self {
            inner: WatchStream::new(receiver),
            _registration: registration,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Stream for RefStream<T> {
    type Item = Option<Arc<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream boxes its future, so it is Unpin.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
