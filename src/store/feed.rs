//! Broadcast-backed change feeds for stores that observe their own writes.

use crate::store::{ChangeFeed, segments};
use futures::stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, trace};

/// Marker broadcast when the whole tree changed.
const ROOT: &str = "/";

/// Fans write notifications out to every open [`ChangeFeed`].
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<String>,
}

impl ChangeNotifier {
    /// Creates a notifier that buffers up to `capacity` unread notifications per feed.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Announces a write at `path`.
    pub fn notify(&self, path: &str) {
        let collection = segments(path).first().map_or(ROOT, |s| *s).to_string();
        trace!(%collection, "change notification");
        // No open feeds is not an error.
        let _ = self.sender.send(collection);
    }

    /// Opens a feed that ticks whenever `collection` (or the whole tree) changes.
    pub fn feed(&self, collection: &str) -> ChangeFeed {
        let receiver = self.sender.subscribe();
        let collection = collection.to_string();

        let ticks = stream::unfold(receiver, move |mut receiver| {
            let collection = collection.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(changed) if changed == collection || changed == ROOT => {
                            return Some((Ok(()), receiver));
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            // Missed notifications collapse into a single re-read.
                            debug!(%collection, skipped, "change feed lagged");
                            return Some((Ok(()), receiver));
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Box::pin(ticks)
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}
