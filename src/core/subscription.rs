//! Handle for a live collection listener.

use tokio::task::JoinHandle;

/// Keeps a collection listener alive; dropping it stops the listener.
#[derive(Debug)]
#[must_use = "dropping a Subscription stops the listener immediately"]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) const fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Stops the listener. No callback runs after the task is cancelled.
    pub fn unsubscribe(self) {
        self.handle.abort();
    }

    /// False once the listener has stopped, e.g. because the change feed failed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Resolves once the listener has stopped on its own.
    pub async fn closed(&mut self) {
        if !self.handle.is_finished() {
            let _ = (&mut self.handle).await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
