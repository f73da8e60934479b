use std::sync::Arc;

use log::{info, warn};

use crate::{
    config::StoreConfig,
    lock,
    sdk::{types::Transaction, ExplorerSdk, TransactionPages},
};

use super::{
    error::StoreError,
    events::{EventBus, StoreEvent},
    subscription::{Subscription, TaskListener},
    timeline::{Timeline, TimelineSnapshot},
    types::ArcMut,
};

/// Latest and paged transactions, kept current by a live feed.
#[derive(Clone)]
pub struct TransactionStore {
    sdk: Arc<dyn ExplorerSdk>,
    timeline: Timeline<Transaction>,
    subscription: ArcMut<Subscription>,
    events: EventBus,
}

impl TransactionStore {
    pub fn new(sdk: Arc<dyn ExplorerSdk>, config: &StoreConfig, events: EventBus) -> Self {
        let pages = Arc::new(TransactionPages::new(sdk.clone()));

        Self {
            sdk,
            timeline: Timeline::new("transaction", pages, config.page_size),
            subscription: ArcMut::new(Subscription::new("transaction")),
            events,
        }
    }

    /// Fetch the first page, then subscribe to new transactions.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.initialize_page().await?;
        self.subscribe().await
    }

    pub fn uninitialize(&self) -> Result<(), StoreError> {
        self.unsubscribe()
    }

    /// Open the SDK feed and add every pushed transaction to the latest list.
    /// An existing subscription is closed first.
    pub async fn subscribe(&self) -> Result<(), StoreError> {
        self.unsubscribe()?;

        let feed = self.sdk.listen_transactions().await.map_err(|e| {
            StoreError::Subscription(format!("unable to open transaction feed: {e}"))
        })?;
        let mut items = feed.items;
        // the task holds no handle on the subscription slot
        let timeline = self.timeline.clone();
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            while let Some(tx) = items.recv().await {
                if let Err(e) = push_latest(&timeline, &events, tx) {
                    warn!("transaction: unable to add transaction from feed: {e}");
                }
            }
            info!("transaction: feed closed");
        });

        lock!(self.subscription)?.replace(feed.connection, Box::new(TaskListener::new(handle)));
        Ok(())
    }

    pub fn unsubscribe(&self) -> Result<(), StoreError> {
        lock!(self.subscription)?.unsubscribe();
        Ok(())
    }

    /// Add a live transaction and publish its hash as the newest known one.
    pub fn add(&self, tx: Transaction) -> Result<(), StoreError> {
        push_latest(&self.timeline, &self.events, tx)
    }

    pub async fn initialize_page(&self) -> Result<(), StoreError> {
        self.timeline.initial_fetch().await?;

        if let Some(hash) = self.timeline.top_key() {
            self.events.publish(StoreEvent::TransactionHash(hash));
        }
        Ok(())
    }

    pub async fn fetch_next_page(&self) -> Result<(), StoreError> {
        self.timeline.fetch_next_page().await
    }

    pub async fn fetch_previous_page(&self) -> Result<(), StoreError> {
        self.timeline.fetch_previous_page().await
    }

    pub fn reset_page(&self) -> Result<(), StoreError> {
        self.timeline.reset_page()
    }

    pub fn latest_list(&self) -> Vec<Transaction> {
        self.timeline.latest_list()
    }

    pub fn recent_list(&self, len: usize) -> Vec<Transaction> {
        self.timeline.recent_list(len)
    }

    pub fn page_list(&self) -> Vec<Transaction> {
        self.timeline.page_list()
    }

    pub fn page_index(&self) -> usize {
        self.timeline.page_index()
    }

    pub fn loading(&self) -> bool {
        self.timeline.loading()
    }

    pub fn subscribed(&self) -> bool {
        self.subscription
            .lock()
            .map(|sub| sub.is_active())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> TimelineSnapshot<Transaction> {
        self.timeline.snapshot()
    }
}

fn push_latest(
    timeline: &Timeline<Transaction>,
    events: &EventBus,
    tx: Transaction,
) -> Result<(), StoreError> {
    events.publish(StoreEvent::TransactionHash(tx.transaction_hash.clone()));
    timeline.add(tx)?;
    Ok(())
}
