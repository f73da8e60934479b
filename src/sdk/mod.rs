pub mod mock;
pub mod types;

use std::sync::Arc;

use crate::store::types::{Fetch, PageSource};

use types::{Mosaic, MosaicInfoRecord, Transaction, TransactionFeed};

/// Blockchain SDK consumed by the stores.
///
/// Lists come back newest first and already in the shape the stores cache.
/// `*_before` returns items strictly older than the key, `*_after` items
/// strictly newer.
pub trait ExplorerSdk: Send + Sync {
    fn transactions(&self, page_size: usize) -> Fetch<'_, Vec<Transaction>>;
    fn transactions_before(&self, hash: String, page_size: usize) -> Fetch<'_, Vec<Transaction>>;
    fn transactions_after(&self, hash: String, page_size: usize) -> Fetch<'_, Vec<Transaction>>;

    fn mosaics(&self, page_size: usize) -> Fetch<'_, Vec<Mosaic>>;
    fn mosaics_before(&self, height: u64, page_size: usize) -> Fetch<'_, Vec<Mosaic>>;
    fn mosaics_after(&self, height: u64, page_size: usize) -> Fetch<'_, Vec<Mosaic>>;

    /// Detail record by hex mosaic id or namespace name.
    fn mosaic_info(&self, id: String) -> Fetch<'_, MosaicInfoRecord>;

    fn listen_transactions(&self) -> Fetch<'_, TransactionFeed>;
}

pub struct TransactionPages {
    sdk: Arc<dyn ExplorerSdk>,
}

impl TransactionPages {
    pub fn new(sdk: Arc<dyn ExplorerSdk>) -> Self {
        Self { sdk }
    }
}

impl PageSource<Transaction> for TransactionPages {
    fn latest(&self, page_size: usize) -> Fetch<'_, Vec<Transaction>> {
        self.sdk.transactions(page_size)
    }

    fn before(&self, key: String, page_size: usize) -> Fetch<'_, Vec<Transaction>> {
        self.sdk.transactions_before(key, page_size)
    }

    fn after(&self, key: String, page_size: usize) -> Fetch<'_, Vec<Transaction>> {
        self.sdk.transactions_after(key, page_size)
    }
}

pub struct MosaicPages {
    sdk: Arc<dyn ExplorerSdk>,
}

impl MosaicPages {
    pub fn new(sdk: Arc<dyn ExplorerSdk>) -> Self {
        Self { sdk }
    }
}

impl PageSource<Mosaic> for MosaicPages {
    fn latest(&self, page_size: usize) -> Fetch<'_, Vec<Mosaic>> {
        self.sdk.mosaics(page_size)
    }

    fn before(&self, key: u64, page_size: usize) -> Fetch<'_, Vec<Mosaic>> {
        self.sdk.mosaics_before(key, page_size)
    }

    fn after(&self, key: u64, page_size: usize) -> Fetch<'_, Vec<Mosaic>> {
        self.sdk.mosaics_after(key, page_size)
    }
}
