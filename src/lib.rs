pub mod config;
pub mod sdk;
pub mod store;
pub mod util;

use std::sync::{Arc, Once};

use log::info;

use crate::config::StoreConfig;
use crate::sdk::ExplorerSdk;
use crate::store::{
    chain::ChainStore, error::StoreError, events::EventBus, mosaic::MosaicStore,
    transaction::TransactionStore,
};

/// All store modules of the explorer, sharing one SDK and event bus.
pub struct Explorer {
    pub events: EventBus,
    pub chain: ChainStore,
    pub transactions: TransactionStore,
    pub mosaics: MosaicStore,
}

pub fn build_explorer(
    sdk: Arc<dyn ExplorerSdk>,
    config: StoreConfig,
) -> Result<Explorer, StoreError> {
    config.validate()?;

    let events = EventBus::new(config.event_capacity);
    let explorer = Explorer {
        chain: ChainStore::new(),
        transactions: TransactionStore::new(sdk.clone(), &config, events.clone()),
        mosaics: MosaicStore::new(sdk, &config),
        events,
    };

    info!("explorer stores built with page size: {}", config.page_size);
    Ok(explorer)
}

static INIT: Once = Once::new();

/// Setup function that is only run once, even if called multiple times.
pub fn logger_init() {
    INIT.call_once(|| {
        pretty_env_logger::init();
    });
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::sdk::mock::MockSdk;

    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_build_explorer_rejects_bad_config() {
        init();
        let config = StoreConfig {
            page_size: 0,
            ..StoreConfig::default()
        };

        let res = build_explorer(Arc::new(MockSdk::fixtures()), config);
        assert!(matches!(res, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_chain_follows_transactions() {
        init();
        let sdk = Arc::new(MockSdk::fixtures());
        let explorer = build_explorer(sdk.clone(), StoreConfig::default()).unwrap();
        let listener = explorer.chain.listen(&explorer.events);

        explorer.transactions.initialize().await.unwrap();

        let newest = sdk.transaction_list()[0].transaction_hash.clone();
        for _ in 0..200 {
            if explorer.chain.transaction_hash().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(explorer.chain.transaction_hash(), Some(newest));

        explorer.transactions.uninitialize().unwrap();
        listener.abort();
    }
}
