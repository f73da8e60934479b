use log::debug;
use tokio::sync::broadcast::{self, Receiver, Sender};

/// Values a store publishes for sibling stores.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Hash of the newest transaction known to the transaction store.
    TransactionHash(String),
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish to all current subscribers, returning how many received it.
    pub fn publish(&self, event: StoreEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(e) => {
                debug!("no subscribers for event: {:?}", e.0);
                0
            }
        }
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}
