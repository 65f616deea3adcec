//! Cooperative cancellation for playback threads.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

// Nothing is ever sent on the channel. Cancelling drops the sender, which
// disconnects the receiver and wakes every waiter at once.
struct TokenInner {
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
    children: Mutex<Vec<Weak<TokenInner>>>,
}

impl Default for TokenInner {
    fn default() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            children: Mutex::new(Vec::new()),
        }
    }
}

impl TokenInner {
    fn is_cancelled(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn cancel(&self) {
        if self.sender.lock().take().is_none() {
            return;
        }

        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }
}

/// A shareable cancellation signal.
///
/// Clones observe the same signal. A child token is cancelled together with
/// its parent, but cancelling a child leaves the parent running.
///
/// ```
/// use mass::CancellationToken;
/// use std::time::Duration;
///
/// let token = CancellationToken::new();
/// let child = token.child_token();
///
/// token.cancel();
/// assert!(child.is_cancelled());
/// assert!(child.sleep(Duration::from_secs(60))); // returns at once
/// ```
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and all of its children. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    pub fn child_token(&self) -> CancellationToken {
        let child = Arc::new(TokenInner::default());
        let mut children = self.inner.children.lock();
        if self.is_cancelled() {
            child.cancel();
        } else {
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&child));
        }
        CancellationToken { inner: child }
    }

    /// Block for `duration` or until cancelled, whichever comes first.
    ///
    /// Returns `true` if the sleep ended because of cancellation.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.inner.receiver.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Block until cancelled.
    pub fn wait(&self) {
        let _ = self.inner.receiver.recv();
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
