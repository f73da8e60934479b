use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Receiver;

use crate::store::{subscription::Connection, types::Keyed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_hash: String,
    pub transaction_type: String,
    pub height: u64,
    pub signer: String,
    pub deadline: String,
    pub fee: u64,
}

impl Keyed for Transaction {
    type Key = String;
    const KEY_NAME: &'static str = "hash";

    fn key(&self) -> String {
        self.transaction_hash.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mosaic {
    pub mosaic_id: String,
    pub height: u64,
    pub supply: u64,
    pub divisibility: u8,
    pub owner_address: String,
}

impl Keyed for Mosaic {
    type Key = u64;
    const KEY_NAME: &'static str = "height";

    fn key(&self) -> u64 {
        self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicInfo {
    pub mosaic_id: String,
    pub namespace: Option<String>,
    pub supply: u64,
    pub divisibility: u8,
    pub owner_address: String,
    pub start_height: u64,
    pub duration: u64,
    pub supply_mutable: bool,
    pub transferable: bool,
    pub restrictable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub composite_hash: String,
    pub scoped_metadata_key: String,
    pub sender_address: String,
    pub target_address: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicRestriction {
    pub restriction_key: String,
    pub restriction_type: String,
    pub restriction_value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicRestrictionInfo {
    pub entry_type: String,
    pub composite_hash: String,
    pub target_address: Option<String>,
    pub restrictions: Vec<MosaicRestriction>,
}

/// Detail record of a mosaic with its associated metadata and restrictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosaicInfoRecord {
    pub mosaic_info: MosaicInfo,
    pub metadata_list: Vec<Metadata>,
    pub mosaic_restriction_list: Vec<MosaicRestriction>,
    pub mosaic_restriction_info: MosaicRestrictionInfo,
}

/// Live feed of new transactions. Items stop once the connection is closed.
pub struct TransactionFeed {
    pub connection: Box<dyn Connection>,
    pub items: Receiver<Transaction>,
}
