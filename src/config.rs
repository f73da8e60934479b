use serde::{Deserialize, Serialize};

use crate::store::error::StoreError;

pub const PAGE_SIZE: usize = 25;
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Items per fetched page, also the bound of the cached latest list.
    pub page_size: usize,
    /// Buffer of the event bus shared between stores.
    pub event_capacity: usize,
}

impl StoreConfig {
    pub fn from_json(data: &str) -> Result<Self, StoreError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.page_size == 0 {
            return Err(StoreError::Config("page size must be positive".to_string()));
        }
        if self.event_capacity == 0 {
            return Err(StoreError::Config(
                "event capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            event_capacity: EVENT_CAPACITY,
        }
    }
}
