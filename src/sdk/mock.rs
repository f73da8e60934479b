use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use futures_util::FutureExt;
use log::debug;
use tokio::sync::mpsc::{self, Sender};

use crate::{
    lock,
    store::{
        error::StoreError,
        subscription::Connection,
        types::{ArcMut, Fetch},
    },
};

use super::{
    types::{
        Metadata, Mosaic, MosaicInfo, MosaicInfoRecord, MosaicRestriction, MosaicRestrictionInfo,
        Transaction, TransactionFeed,
    },
    ExplorerSdk,
};

const SIGNER: &str = "50B14146D48F931788F3ADAEE6B5C05CF2A09B75FB3FC2ACF8E9C95AF1393024";
const OWNER: &str = "907201499665FB8835086760365556EA5BC0553921B89BD48D";
const FEED_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    Transactions(usize),
    TransactionsBefore(String, usize),
    TransactionsAfter(String, usize),
    Mosaics(usize),
    MosaicsBefore(u64, usize),
    MosaicsAfter(u64, usize),
    MosaicInfo(String),
    ListenTransactions,
}

/// In-memory SDK serving fixed lists, recording every call it receives.
pub struct MockSdk {
    transactions: Vec<Transaction>,
    mosaics: Vec<Mosaic>,
    infos: HashMap<String, MosaicInfoRecord>,
    calls: Mutex<Vec<SdkCall>>,
    fail_next: AtomicBool,
    feed: ArcMut<Option<(usize, Sender<Transaction>)>>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl MockSdk {
    /// Lists are sorted newest first on construction.
    pub fn new(mut transactions: Vec<Transaction>, mut mosaics: Vec<Mosaic>) -> Self {
        transactions.sort_by(|a, b| b.height.cmp(&a.height));
        mosaics.sort_by(|a, b| b.height.cmp(&a.height));

        let infos = mosaics
            .iter()
            .map(|m| (m.mosaic_id.clone(), info_record(m, None)))
            .collect();

        Self {
            transactions,
            mosaics,
            infos,
            calls: Mutex::new(vec![]),
            fail_next: AtomicBool::new(false),
            feed: ArcMut::new(None),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Three transactions and three mosaics, the first mosaic aliased to the
    /// `cat.currency` namespace.
    pub fn fixtures() -> Self {
        let transactions = vec![
            fixture_tx(
                "90F1F645D6AEA45D750BA1ECFEF686619C7C149C9B8096D3D34C2F3346372E8E",
                "Transfer",
                3,
            ),
            fixture_tx(
                "979ACF8EB76B756B8B465F0F09D72777931260E20810E51F211B3CA61CFB4CE6",
                "Namespace registration",
                2,
            ),
            fixture_tx(
                "BE1D71891D24A0AC9FA20913B6B34B21C68536D95CF83E6C6482B522F513DFB6",
                "Mosaic definition",
                1,
            ),
        ];
        let mosaics = vec![
            fixture_mosaic("85BBEA6CC462B244", 1, 8_999_999_998_000_000, 6),
            fixture_mosaic("941299B2B7E1291C", 2, 3_750_000, 3),
            fixture_mosaic("519FC24B9223E0B4", 3, 1_000_000, 0),
        ];

        let mut sdk = Self::new(transactions, mosaics);
        if let Some(m) = sdk.mosaics.iter().find(|m| m.mosaic_id == "85BBEA6CC462B244") {
            let record = info_record(m, Some("cat.currency"));
            sdk.infos.insert(m.mosaic_id.clone(), record);
        }
        sdk
    }

    /// `txs` random transactions and `mosaics` random mosaics at heights
    /// `1..=n`.
    pub fn random(txs: u64, mosaics: u64) -> Self {
        Self::new(
            (1..=txs).map(random_tx).collect(),
            (1..=mosaics).map(random_mosaic).collect(),
        )
    }

    pub fn transaction_list(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn mosaic_list(&self) -> &[Mosaic] {
        &self.mosaics
    }

    pub fn calls(&self) -> Vec<SdkCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Fail the next request with `StoreError::Fetch`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Push a transaction into the open feed. Returns false if no feed is
    /// open.
    pub fn push(&self, tx: Transaction) -> bool {
        let sender = match self.feed.lock() {
            Ok(feed) => feed.as_ref().map(|(_, sender)| sender.clone()),
            Err(_) => None,
        };

        match sender {
            Some(sender) => sender.try_send(tx).is_ok(),
            None => false,
        }
    }

    /// Number of feed connections closed so far.
    pub fn closed_connections(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    // ---
    // Private Methods
    // ---

    fn respond<T>(
        &self,
        call: SdkCall,
        value: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        debug!("mock sdk: {call:?}");
        lock!(self.calls)?.push(call);

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Fetch("mock sdk: request failed".to_string()));
        }
        value()
    }

    fn position(&self, hash: &str) -> Result<usize, StoreError> {
        self.transactions
            .iter()
            .position(|tx| tx.transaction_hash == hash)
            .ok_or_else(|| StoreError::NotFound(format!("transaction with hash: {hash} not found")))
    }
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::fixtures()
    }
}

impl ExplorerSdk for MockSdk {
    fn transactions(&self, page_size: usize) -> Fetch<'_, Vec<Transaction>> {
        async move {
            self.respond(SdkCall::Transactions(page_size), || {
                Ok(self.transactions.iter().take(page_size).cloned().collect())
            })
        }
        .boxed()
    }

    fn transactions_before(&self, hash: String, page_size: usize) -> Fetch<'_, Vec<Transaction>> {
        async move {
            let call = SdkCall::TransactionsBefore(hash.clone(), page_size);
            self.respond(call, || {
                let idx = self.position(&hash)?;
                Ok(self.transactions[idx + 1..]
                    .iter()
                    .take(page_size)
                    .cloned()
                    .collect())
            })
        }
        .boxed()
    }

    fn transactions_after(&self, hash: String, page_size: usize) -> Fetch<'_, Vec<Transaction>> {
        async move {
            let call = SdkCall::TransactionsAfter(hash.clone(), page_size);
            self.respond(call, || {
                let idx = self.position(&hash)?;
                let start = idx.saturating_sub(page_size);
                Ok(self.transactions[start..idx].to_vec())
            })
        }
        .boxed()
    }

    fn mosaics(&self, page_size: usize) -> Fetch<'_, Vec<Mosaic>> {
        async move {
            self.respond(SdkCall::Mosaics(page_size), || {
                Ok(self.mosaics.iter().take(page_size).cloned().collect())
            })
        }
        .boxed()
    }

    fn mosaics_before(&self, height: u64, page_size: usize) -> Fetch<'_, Vec<Mosaic>> {
        async move {
            self.respond(SdkCall::MosaicsBefore(height, page_size), || {
                Ok(self
                    .mosaics
                    .iter()
                    .filter(|m| m.height < height)
                    .take(page_size)
                    .cloned()
                    .collect())
            })
        }
        .boxed()
    }

    fn mosaics_after(&self, height: u64, page_size: usize) -> Fetch<'_, Vec<Mosaic>> {
        async move {
            self.respond(SdkCall::MosaicsAfter(height, page_size), || {
                let newer: Vec<Mosaic> = self
                    .mosaics
                    .iter()
                    .filter(|m| m.height > height)
                    .cloned()
                    .collect();
                let start = newer.len().saturating_sub(page_size);
                Ok(newer[start..].to_vec())
            })
        }
        .boxed()
    }

    fn mosaic_info(&self, id: String) -> Fetch<'_, MosaicInfoRecord> {
        async move {
            self.respond(SdkCall::MosaicInfo(id.clone()), || {
                self.infos
                    .get(&id)
                    .or_else(|| {
                        self.infos
                            .values()
                            .find(|r| r.mosaic_info.namespace.as_deref() == Some(id.as_str()))
                    })
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound(format!("mosaic: {id} not found")))
            })
        }
        .boxed()
    }

    fn listen_transactions(&self) -> Fetch<'_, TransactionFeed> {
        async move {
            self.respond(SdkCall::ListenTransactions, || {
                let (tx, rx) = mpsc::channel(FEED_CAPACITY);
                let id = self.opened.fetch_add(1, Ordering::SeqCst);
                *lock!(self.feed)? = Some((id, tx));

                Ok(TransactionFeed {
                    connection: Box::new(MockConnection {
                        id,
                        feed: self.feed.clone(),
                        closed: self.closed.clone(),
                    }),
                    items: rx,
                })
            })
        }
        .boxed()
    }
}

struct MockConnection {
    id: usize,
    feed: ArcMut<Option<(usize, Sender<Transaction>)>>,
    closed: Arc<AtomicUsize>,
}

impl Connection for MockConnection {
    fn close(&mut self) {
        // dropping the sender ends the feed, unless a newer feed replaced it
        let mut feed = self
            .feed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if matches!(feed.as_ref(), Some((id, _)) if *id == self.id) {
            feed.take();
        }
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn fixture_tx(hash: &str, kind: &str, height: u64) -> Transaction {
    Transaction {
        transaction_hash: hash.to_string(),
        transaction_type: kind.to_string(),
        height,
        signer: SIGNER.to_string(),
        deadline: "2019-09-16 14:07:37".to_string(),
        fee: 0,
    }
}

fn fixture_mosaic(id: &str, height: u64, supply: u64, divisibility: u8) -> Mosaic {
    Mosaic {
        mosaic_id: id.to_string(),
        height,
        supply,
        divisibility,
        owner_address: OWNER.to_string(),
    }
}

fn info_record(mosaic: &Mosaic, namespace: Option<&str>) -> MosaicInfoRecord {
    let restriction = MosaicRestriction {
        restriction_key: "KYC".to_string(),
        restriction_type: "EQ".to_string(),
        restriction_value: 1,
    };

    MosaicInfoRecord {
        mosaic_info: MosaicInfo {
            mosaic_id: mosaic.mosaic_id.clone(),
            namespace: namespace.map(str::to_string),
            supply: mosaic.supply,
            divisibility: mosaic.divisibility,
            owner_address: mosaic.owner_address.clone(),
            start_height: mosaic.height,
            duration: 0,
            supply_mutable: false,
            transferable: true,
            restrictable: true,
        },
        metadata_list: vec![Metadata {
            composite_hash: random_hash(),
            scoped_metadata_key: "0000000000000001".to_string(),
            sender_address: mosaic.owner_address.clone(),
            target_address: mosaic.owner_address.clone(),
            value: format!("mosaic {}", mosaic.mosaic_id),
        }],
        mosaic_restriction_list: vec![restriction.clone()],
        mosaic_restriction_info: MosaicRestrictionInfo {
            entry_type: "GLOBAL".to_string(),
            composite_hash: random_hash(),
            target_address: None,
            restrictions: vec![restriction],
        },
    }
}


pub fn random_hash() -> String {
    sha256::digest(&rand::random::<[u8; 32]>()[..]).to_uppercase()
}

pub fn random_tx(height: u64) -> Transaction {
    fixture_tx(&random_hash(), "Transfer", height)
}

pub fn random_mosaic(height: u64) -> Mosaic {
    let id = hex::encode_upper(rand::random::<[u8; 8]>());
    fixture_mosaic(&id, height, rand::random::<u32>() as u64, 6)
}
