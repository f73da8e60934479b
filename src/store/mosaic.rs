use std::sync::Arc;

use futures_util::FutureExt;

use crate::{
    config::StoreConfig,
    sdk::{
        types::{
            Metadata, Mosaic, MosaicInfo, MosaicInfoRecord, MosaicRestriction,
            MosaicRestrictionInfo,
        },
        ExplorerSdk, MosaicPages,
    },
};

use super::{
    dataset::DataSet,
    error::StoreError,
    lock::InitLock,
    timeline::Timeline,
    types::Fetch,
};

/// Mosaics ordered by height, plus the detail record of one selected mosaic.
#[derive(Clone)]
pub struct MosaicStore {
    timeline: Timeline<Mosaic>,
    info: DataSet<String, MosaicInfoRecord>,
    lock: Arc<InitLock>,
}

impl MosaicStore {
    pub fn new(sdk: Arc<dyn ExplorerSdk>, config: &StoreConfig) -> Self {
        let pages = Arc::new(MosaicPages::new(sdk.clone()));
        let fetch_info = move |id: String| -> Fetch<'static, MosaicInfoRecord> {
            let sdk = sdk.clone();
            async move { sdk.mosaic_info(id).await }.boxed()
        };

        Self {
            timeline: Timeline::new("timeline", pages, config.page_size),
            info: DataSet::new("info", Arc::new(fetch_info)),
            lock: Arc::new(InitLock::new("mosaic")),
        }
    }

    /// Load the first page, once for all concurrent callers.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.lock.initialize(move || self.initialize_page()).await?;
        Ok(())
    }

    /// Release this caller; the last one clears the cached state.
    pub async fn uninitialize(&self) -> Result<(), StoreError> {
        self.lock
            .uninitialize(move || async move {
                self.timeline.clear()?;
                self.info.reset()
            })
            .await?;
        Ok(())
    }

    pub async fn initialize_page(&self) -> Result<(), StoreError> {
        self.timeline.initial_fetch().await
    }

    /// Fetch the detail record by hex mosaic id or namespace name.
    pub async fn fetch_mosaic_info(&self, mosaic_hex_or_namespace: &str) -> Result<(), StoreError> {
        self.info
            .initial_fetch(mosaic_hex_or_namespace.to_string())
            .await
    }

    pub fn timeline(&self) -> &Timeline<Mosaic> {
        &self.timeline
    }

    pub fn info(&self) -> &DataSet<String, MosaicInfoRecord> {
        &self.info
    }

    pub fn initialized(&self) -> bool {
        self.lock.initialized()
    }

    pub fn mosaic_info(&self) -> MosaicInfo {
        self.info.field(|r| r.mosaic_info.clone())
    }

    pub fn metadata_list(&self) -> Vec<Metadata> {
        self.info.field(|r| r.metadata_list.clone())
    }

    pub fn mosaic_restriction_list(&self) -> Vec<MosaicRestriction> {
        self.info.field(|r| r.mosaic_restriction_list.clone())
    }

    pub fn mosaic_restriction_info(&self) -> MosaicRestrictionInfo {
        self.info.field(|r| r.mosaic_restriction_info.clone())
    }
}
