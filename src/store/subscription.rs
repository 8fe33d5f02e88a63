//! Change notification plumbing between score stores and their observers

use crate::types::{ChangeNotice, StoreTable};
use crate::utils::current_timestamp;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, trace};

/// Default buffered notices per subscriber before it starts lagging
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// Sending half of a store's change notifications
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeNotice>,
}

impl ChangeFeed {
    /// Create a feed buffering up to `capacity` notices per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce that rows of `table` changed
    pub fn publish(&self, table: StoreTable) {
        let notice = ChangeNotice {
            table,
            timestamp: current_timestamp(),
        };

        match self.sender.send(notice) {
            Ok(receivers) => trace!("Change on {:?} delivered to {} subscribers", table, receivers),
            Err(_) => debug!("Change on {:?} dropped, no subscribers", table),
        }
    }

    /// Open a new subscription
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription::new(self.sender.subscribe())
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// Receiving half: a stream of opaque "rows changed" signals
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: broadcast::Receiver<ChangeNotice>,
}

impl ChangeSubscription {
    pub fn new(receiver: broadcast::Receiver<ChangeNotice>) -> Self {
        Self { receiver }
    }

    /// Adapt into a stream. A lagged receiver yields an error item instead of
    /// the notices it missed.
    pub fn into_stream(self) -> BroadcastStream<ChangeNotice> {
        BroadcastStream::new(self.receiver)
    }
}
