use std::{error::Error, sync::Arc, time::Duration};

use log::{info, warn};

use explorer_store::{
    build_explorer,
    config::StoreConfig,
    logger_init,
    sdk::mock::{random_tx, MockSdk},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logger_init();

    let config = match std::env::args().nth(1) {
        Some(path) => StoreConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => StoreConfig {
            page_size: 2,
            ..StoreConfig::default()
        },
    };

    let sdk = Arc::new(MockSdk::fixtures());
    let explorer = build_explorer(sdk.clone(), config)?;
    let listener = explorer.chain.listen(&explorer.events);

    let transactions = &explorer.transactions;
    transactions.initialize().await?;
    transactions.fetch_next_page().await?;
    info!("transaction page {}", transactions.page_index());
    transactions.fetch_previous_page().await?;

    // push a transaction through the live feed
    if !sdk.push(random_tx(4)) {
        warn!("transaction feed is not open");
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mosaics = &explorer.mosaics;
    mosaics.initialize().await?;
    mosaics.fetch_mosaic_info("cat.currency").await?;

    println!("{}", serde_json::to_string_pretty(&transactions.snapshot())?);
    println!("{}", serde_json::to_string_pretty(&mosaics.timeline().snapshot())?);
    println!("{}", serde_json::to_string_pretty(&mosaics.mosaic_info())?);
    info!(
        "chain transaction hash: {}",
        explorer.chain.transaction_hash().unwrap_or_default()
    );

    transactions.uninitialize()?;
    mosaics.uninitialize().await?;
    listener.abort();

    Ok(())
}
