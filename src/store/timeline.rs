use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::lock;

use super::{
    error::StoreError,
    page::PagedList,
    types::{ArcMut, Fetch, Keyed, PageSource},
};

pub struct TimelineState<T> {
    latest_list: PagedList<T>,
    page_list: PagedList<T>,
    page_index: usize,
    top: Option<T>,
    loading: bool,
}

/// Serializable view of a timeline, for callers rendering the state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot<T> {
    pub name: String,
    pub page_index: usize,
    pub loading: bool,
    pub page_list: Vec<T>,
    pub latest_list: Vec<T>,
}

/// Key-ordered paginated cache over a [`PageSource`].
///
/// The timeline caches the latest page separately from the page being
/// viewed, so returning to page 0 never refetches. Every fetch takes a request
/// token; a response is only applied if no newer request (or reset) has been
/// issued since, and only that request clears `loading`.
pub struct Timeline<T: Keyed> {
    name: String,
    page_size: usize,
    source: Arc<dyn PageSource<T>>,
    state: ArcMut<TimelineState<T>>,
    sequence: Arc<AtomicU64>,
}

impl<T: Keyed> Clone for Timeline<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            page_size: self.page_size,
            source: self.source.clone(),
            state: self.state.clone(),
            sequence: self.sequence.clone(),
        }
    }
}

impl<T> Timeline<T>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    pub fn new(name: &str, source: Arc<dyn PageSource<T>>, page_size: usize) -> Self {
        let state = TimelineState {
            latest_list: PagedList::new(page_size),
            page_list: PagedList::new(page_size),
            page_index: 0,
            top: None,
            loading: false,
        };

        Self {
            name: name.to_string(),
            page_size,
            source,
            state: ArcMut::new(state),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Load the latest page, cache it and make it the current page.
    pub async fn initial_fetch(&self) -> Result<(), StoreError> {
        let (token, list) = self.request(self.source.latest(self.page_size)).await?;

        self.settle(token, |state| {
            state.latest_list.replace(list.clone());
            state.page_list.replace(list);
            state.page_index = 0;
            state.top = state.latest_list.head(1).pop();
            info!(
                "{}: initialized timeline with {} items, top {}: {:?}",
                self.name,
                state.latest_list.len(),
                T::KEY_NAME,
                state.latest_list.first_key()
            );
        })?;

        Ok(())
    }

    /// Fetch the page older than the current one. No-op on an empty page.
    pub async fn fetch_next_page(&self) -> Result<(), StoreError> {
        let (key, page_index) = {
            let state = lock!(self.state)?;
            match state.page_list.last_key() {
                Some(key) => (key, state.page_index),
                None => {
                    debug!("{}: current page is empty, nothing to fetch", self.name);
                    return Ok(());
                }
            }
        };

        debug!(
            "{}: fetching page {} before {}: {key}",
            self.name,
            page_index + 1,
            T::KEY_NAME
        );
        let (token, list) = self
            .request(self.source.before(key, self.page_size))
            .await?;

        self.settle(token, |state| {
            state.page_list.replace(list);
            state.page_index = page_index + 1;
        })?;

        Ok(())
    }

    /// Fetch the page newer than the current one.
    ///
    /// From page 1 the cached latest list is restored instead of fetched.
    pub async fn fetch_previous_page(&self) -> Result<(), StoreError> {
        let (key, page_index) = {
            let state = lock!(self.state)?;
            let page_index = state.page_index;
            match page_index {
                0 => return Ok(()),
                1 => {
                    drop(state);
                    return self.restore_latest();
                }
                index => match state.page_list.first_key() {
                    Some(key) => (key, index),
                    None => {
                        warn!("{}: page {index} is empty, cannot page back", self.name);
                        return Ok(());
                    }
                },
            }
        };

        debug!(
            "{}: fetching page {} after {}: {key}",
            self.name,
            page_index - 1,
            T::KEY_NAME
        );
        let (token, list) = self
            .request(self.source.after(key, self.page_size))
            .await?;

        self.settle(token, |state| {
            state.page_list.replace(list);
            state.page_index = page_index - 1;
        })?;

        Ok(())
    }

    /// Return to the cached latest page without fetching. No-op on page 0.
    pub fn reset_page(&self) -> Result<(), StoreError> {
        if self.page_index() > 0 {
            self.restore_latest()?;
        }
        Ok(())
    }

    /// Prepend a live item to the latest list. Returns false if an item with
    /// the same key is already cached.
    pub fn add(&self, item: T) -> Result<bool, StoreError> {
        let mut state = lock!(self.state)?;
        let key = item.key();

        if !state.latest_list.prepend_unique(item.clone()) {
            debug!("{}: {} {key} already cached", self.name, T::KEY_NAME);
            return Ok(false);
        }

        state.top = Some(item);
        if state.page_index == 0 {
            let latest = state.latest_list.to_vec();
            state.page_list.replace(latest);
        }

        Ok(true)
    }

    /// Drop all cached pages and invalidate in-flight requests.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut state = lock!(self.state)?;
        state.latest_list.clear();
        state.page_list.clear();
        state.page_index = 0;
        state.top = None;
        state.loading = false;

        info!("{}: cleared timeline", self.name);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn latest_list(&self) -> Vec<T> {
        self.read(|state| state.latest_list.to_vec())
    }

    pub fn recent_list(&self, len: usize) -> Vec<T> {
        self.read(|state| state.latest_list.head(len))
    }

    pub fn page_list(&self) -> Vec<T> {
        self.read(|state| state.page_list.to_vec())
    }

    pub fn page_index(&self) -> usize {
        self.read(|state| state.page_index)
    }

    pub fn loading(&self) -> bool {
        self.read(|state| state.loading)
    }

    /// Key of the newest item seen, from the initial fetch or a live add.
    pub fn top_key(&self) -> Option<T::Key> {
        self.read(|state| state.top.as_ref().map(Keyed::key))
    }

    pub fn snapshot(&self) -> TimelineSnapshot<T>
    where
        T: Serialize,
    {
        self.read(|state| TimelineSnapshot {
            name: self.name.clone(),
            page_index: state.page_index,
            loading: state.loading,
            page_list: state.page_list.to_vec(),
            latest_list: state.latest_list.to_vec(),
        })
    }

    // ---
    // Private Methods
    // ---

    fn read<R>(&self, f: impl FnOnce(&TimelineState<T>) -> R) -> R {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&*state)
    }

    fn restore_latest(&self) -> Result<(), StoreError> {
        self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut state = lock!(self.state)?;
        let latest = state.latest_list.to_vec();
        state.page_list.replace(latest);
        state.page_index = 0;
        state.loading = false;

        debug!("{}: restored latest page", self.name);
        Ok(())
    }

    async fn request(&self, fetch: Fetch<'_, Vec<T>>) -> Result<(u64, Vec<T>), StoreError> {
        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        lock!(self.state)?.loading = true;

        match fetch.await {
            Ok(mut list) => {
                list.truncate(self.page_size);
                Ok((token, list))
            }
            Err(e) => {
                warn!("{}: fetch failed for request {token}: {e}", self.name);
                self.settle(token, |_| {})?;
                Err(e)
            }
        }
    }

    /// Apply a response if `token` is still the latest request.
    fn settle(
        &self,
        token: u64,
        apply: impl FnOnce(&mut TimelineState<T>),
    ) -> Result<bool, StoreError> {
        let mut state = lock!(self.state)?;

        if token != self.sequence.load(Ordering::SeqCst) {
            debug!("{}: discarding stale response for request {token}", self.name);
            return Ok(false);
        }

        apply(&mut *state);
        state.loading = false;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use futures_util::FutureExt;
    use tokio::sync::oneshot;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Block(u64);

    impl Keyed for Block {
        type Key = u64;
        const KEY_NAME: &'static str = "height";

        fn key(&self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Latest,
        Before(u64),
        After(u64),
    }

    /// Heights `1..=len`, newest first, recording every call.
    struct Chain {
        heights: Vec<u64>,
        calls: Mutex<Vec<Call>>,
        fail: Mutex<bool>,
    }

    impl Chain {
        fn new(len: u64) -> Arc<Self> {
            Arc::new(Self {
                heights: (1..=len).rev().collect(),
                calls: Mutex::new(vec![]),
                fail: Mutex::new(false),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(&self, call: Call, blocks: Vec<u64>) -> Result<Vec<Block>, StoreError> {
            self.calls.lock().unwrap().push(call);
            if *self.fail.lock().unwrap() {
                return Err(StoreError::Fetch("node unreachable".to_string()));
            }
            Ok(blocks.into_iter().map(Block).collect())
        }
    }

    impl PageSource<Block> for Chain {
        fn latest(&self, page_size: usize) -> Fetch<'_, Vec<Block>> {
            let blocks = self.heights.iter().take(page_size).copied().collect();
            async move { self.respond(Call::Latest, blocks) }.boxed()
        }

        fn before(&self, key: u64, page_size: usize) -> Fetch<'_, Vec<Block>> {
            let blocks = self
                .heights
                .iter()
                .filter(|&&h| h < key)
                .take(page_size)
                .copied()
                .collect();
            async move { self.respond(Call::Before(key), blocks) }.boxed()
        }

        fn after(&self, key: u64, page_size: usize) -> Fetch<'_, Vec<Block>> {
            let newer: Vec<u64> = self.heights.iter().filter(|&&h| h > key).copied().collect();
            let start = newer.len().saturating_sub(page_size);
            let blocks = newer[start..].to_vec();
            async move { self.respond(Call::After(key), blocks) }.boxed()
        }
    }

    fn timeline(chain: &Arc<Chain>, page_size: usize) -> Timeline<Block> {
        Timeline::new("blocks", chain.clone(), page_size)
    }

    fn heights(blocks: &[Block]) -> Vec<u64> {
        blocks.iter().map(|b| b.0).collect()
    }

    #[tokio::test]
    async fn test_initial_fetch() {
        let chain = Chain::new(10);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();

        assert_eq!(timeline.page_index(), 0);
        assert_eq!(heights(&timeline.page_list()), vec![10, 9, 8]);
        assert_eq!(timeline.latest_list(), timeline.page_list());
        assert_eq!(timeline.top_key(), Some(10));
        assert!(!timeline.loading());
    }

    #[tokio::test]
    async fn test_initial_fetch_empty() {
        let chain = Chain::new(0);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();

        assert!(timeline.page_list().is_empty());
        assert_eq!(timeline.top_key(), None);
        assert!(!timeline.loading());

        // empty page, nothing to fetch
        timeline.fetch_next_page().await.unwrap();
        assert_eq!(timeline.page_index(), 0);
        assert_eq!(chain.calls(), vec![Call::Latest]);
    }

    #[tokio::test]
    async fn test_next_page_requests_older_than_last_key() {
        let chain = Chain::new(10);
        let timeline = timeline(&chain, 2);

        timeline.initial_fetch().await.unwrap();
        timeline.fetch_next_page().await.unwrap();

        assert_eq!(chain.calls(), vec![Call::Latest, Call::Before(9)]);
        assert_eq!(timeline.page_index(), 1);
        assert_eq!(heights(&timeline.page_list()), vec![8, 7]);
    }

    #[tokio::test]
    async fn test_page_back_and_forth() {
        let chain = Chain::new(20);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();
        let latest = timeline.latest_list();

        for _ in 0..4 {
            timeline.fetch_next_page().await.unwrap();
        }
        assert_eq!(timeline.page_index(), 4);
        assert_eq!(heights(&timeline.page_list()), vec![8, 7, 6]);

        timeline.fetch_previous_page().await.unwrap();
        assert_eq!(timeline.page_index(), 3);
        assert_eq!(heights(&timeline.page_list()), vec![11, 10, 9]);

        timeline.fetch_previous_page().await.unwrap();
        timeline.fetch_previous_page().await.unwrap();
        assert_eq!(timeline.page_index(), 1);
        assert_eq!(heights(&timeline.page_list()), vec![17, 16, 15]);

        let calls = chain.calls().len();

        // page 1 -> 0 restores the cached latest page without a fetch
        timeline.fetch_previous_page().await.unwrap();
        assert_eq!(timeline.page_index(), 0);
        assert_eq!(timeline.page_list(), latest);
        assert_eq!(chain.calls().len(), calls);

        // already on the latest page
        timeline.fetch_previous_page().await.unwrap();
        assert_eq!(timeline.page_index(), 0);
        assert_eq!(chain.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_reset_page() {
        let chain = Chain::new(20);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();
        timeline.fetch_next_page().await.unwrap();
        timeline.fetch_next_page().await.unwrap();

        let calls = chain.calls().len();
        timeline.reset_page().unwrap();

        assert_eq!(timeline.page_index(), 0);
        assert_eq!(timeline.page_list(), timeline.latest_list());
        assert_eq!(chain.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_reset_after_add_restores_full_latest_page() {
        let chain = Chain::new(20);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();
        timeline.add(Block(21)).unwrap();
        timeline.add(Block(22)).unwrap();
        timeline.fetch_next_page().await.unwrap();
        timeline.reset_page().unwrap();

        assert_eq!(heights(&timeline.latest_list()), vec![22, 21, 20]);
        assert_eq!(timeline.page_list(), timeline.latest_list());

        timeline.fetch_next_page().await.unwrap();
        timeline.fetch_previous_page().await.unwrap();
        assert_eq!(timeline.page_list(), timeline.latest_list());
        assert_eq!(timeline.page_list().len(), 3);
    }

    #[tokio::test]
    async fn test_add() {
        let chain = Chain::new(5);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();

        assert!(timeline.add(Block(6)).unwrap());
        assert_eq!(heights(&timeline.latest_list()), vec![6, 5, 4]);
        assert_eq!(timeline.page_list(), timeline.latest_list());
        assert_eq!(timeline.top_key(), Some(6));

        // duplicate key
        assert!(!timeline.add(Block(5)).unwrap());
        assert_eq!(timeline.latest_list().len(), 3);

        // live items don't disturb an older page being viewed
        timeline.fetch_next_page().await.unwrap();
        let page = timeline.page_list();
        assert!(timeline.add(Block(7)).unwrap());
        assert_eq!(timeline.page_list(), page);
        assert_eq!(heights(&timeline.latest_list()), vec![7, 6, 5]);
    }

    #[tokio::test]
    async fn test_fetch_error_clears_loading() {
        let chain = Chain::new(10);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();
        *chain.fail.lock().unwrap() = true;

        let res = timeline.fetch_next_page().await;

        assert!(matches!(res, Err(StoreError::Fetch(_))));
        assert!(!timeline.loading());
        assert_eq!(timeline.page_index(), 0);
        assert_eq!(heights(&timeline.page_list()), vec![10, 9, 8]);
    }

    #[tokio::test]
    async fn test_clear() {
        let chain = Chain::new(10);
        let timeline = timeline(&chain, 3);

        timeline.initial_fetch().await.unwrap();
        timeline.fetch_next_page().await.unwrap();
        timeline.clear().unwrap();

        assert!(timeline.latest_list().is_empty());
        assert!(timeline.page_list().is_empty());
        assert_eq!(timeline.page_index(), 0);
        assert_eq!(timeline.top_key(), None);
    }

    /// Source whose responses are released by the test, in any order.
    struct Gated {
        gates: Mutex<HashMap<u64, oneshot::Receiver<Vec<Block>>>>,
    }

    impl PageSource<Block> for Gated {
        fn latest(&self, _page_size: usize) -> Fetch<'_, Vec<Block>> {
            let gate = self.gates.lock().unwrap().remove(&0);
            async move {
                match gate {
                    Some(rx) => rx
                        .await
                        .map_err(|e| StoreError::Fetch(format!("gate dropped: {e}"))),
                    None => Err(StoreError::Fetch("no gate".to_string())),
                }
            }
            .boxed()
        }

        fn before(&self, key: u64, _page_size: usize) -> Fetch<'_, Vec<Block>> {
            let gate = self.gates.lock().unwrap().remove(&key);
            async move {
                match gate {
                    Some(rx) => rx
                        .await
                        .map_err(|e| StoreError::Fetch(format!("gate dropped: {e}"))),
                    None => Err(StoreError::Fetch("no gate".to_string())),
                }
            }
            .boxed()
        }

        fn after(&self, _key: u64, _page_size: usize) -> Fetch<'_, Vec<Block>> {
            async { Err(StoreError::Fetch("unused".to_string())) }.boxed()
        }
    }

    async fn wait_loading<T: Keyed + Clone + Send + Sync + 'static>(timeline: &Timeline<T>) {
        while !timeline.loading() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_stale_response_discarded() {
        let (latest_tx, latest_rx) = oneshot::channel();
        let (page_tx, page_rx) = oneshot::channel();
        let (next_tx, next_rx) = oneshot::channel();
        let gated = Arc::new(Gated {
            gates: Mutex::new(HashMap::from([(0, latest_rx), (8, page_rx), (5, next_rx)])),
        });
        let timeline = Timeline::new("gated", gated, 3);

        latest_tx.send(vec![Block(10), Block(9), Block(8)]).unwrap();
        timeline.initial_fetch().await.unwrap();
        page_tx.send(vec![Block(7), Block(6), Block(5)]).unwrap();
        timeline.fetch_next_page().await.unwrap();
        assert_eq!(timeline.page_index(), 1);

        // a slow next page request is overtaken by a reset
        let pending = {
            let timeline = timeline.clone();
            tokio::spawn(async move { timeline.fetch_next_page().await })
        };
        wait_loading(&timeline).await;

        timeline.reset_page().unwrap();
        assert!(!timeline.loading());

        next_tx.send(vec![Block(4), Block(3), Block(2)]).unwrap();
        pending.await.unwrap().unwrap();

        assert_eq!(timeline.page_index(), 0);
        assert_eq!(heights(&timeline.page_list()), vec![10, 9, 8]);
        assert!(!timeline.loading());
    }

    #[tokio::test]
    async fn test_reset_during_initial_fetch_keeps_first_page() {
        let (latest_tx, latest_rx) = oneshot::channel();
        let gated = Arc::new(Gated {
            gates: Mutex::new(HashMap::from([(0, latest_rx)])),
        });
        let timeline = Timeline::new("gated", gated, 3);

        let pending = {
            let timeline = timeline.clone();
            tokio::spawn(async move { timeline.initial_fetch().await })
        };
        wait_loading(&timeline).await;

        // nothing to reset on page 0
        timeline.reset_page().unwrap();
        assert!(timeline.loading());

        latest_tx.send(vec![Block(10), Block(9), Block(8)]).unwrap();
        pending.await.unwrap().unwrap();

        assert_eq!(timeline.page_index(), 0);
        assert_eq!(heights(&timeline.latest_list()), vec![10, 9, 8]);
        assert_eq!(timeline.page_list(), timeline.latest_list());
        assert_eq!(timeline.top_key(), Some(10));
        assert!(!timeline.loading());
    }

    #[tokio::test]
    async fn test_snapshot() {
        let chain = Chain::new(4);
        let timeline = timeline(&chain, 2);

        timeline.initial_fetch().await.unwrap();

        let json = serde_json::to_value(timeline.snapshot()).unwrap();
        assert_eq!(json["name"], "blocks");
        assert_eq!(json["pageIndex"], 0);
        assert_eq!(json["pageList"], serde_json::json!([4, 3]));
    }
}
