use log::{debug, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::{
    events::{EventBus, StoreEvent},
    types::ArcMut,
};

#[derive(Debug, Default, Clone)]
struct ChainState {
    transaction_hash: Option<String>,
}

/// Chain-wide values other stores publish, such as the newest transaction
/// hash.
#[derive(Clone)]
pub struct ChainStore {
    state: ArcMut<ChainState>,
}

impl ChainStore {
    pub fn new() -> Self {
        Self {
            state: ArcMut::new(ChainState::default()),
        }
    }

    pub fn apply(&self, event: &StoreEvent) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match event {
            StoreEvent::TransactionHash(hash) => {
                debug!("chain: transaction hash set to {hash}");
                state.transaction_hash = Some(hash.clone());
            }
        }
    }

    /// Spawn a task applying every event published on `bus`.
    pub fn listen(&self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let store = self.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => store.apply(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("chain: listener lagged, skipped {skipped} events")
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn transaction_hash(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .transaction_hash
            .clone()
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}
