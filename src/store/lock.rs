use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use tokio::sync::Mutex;

use super::error::StoreError;

/// Reference counted guard around a store's setup and teardown.
///
/// Setup runs on the 0 -> 1 transition of the initializer count, teardown on
/// 1 -> 0. The count is held behind an async mutex for the duration of the
/// callback, so concurrent callers wait for setup rather than repeat it.
pub struct InitLock {
    name: String,
    count: Mutex<usize>,
    initialized: AtomicBool,
}

impl InitLock {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            count: Mutex::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// Register an initializer. Returns true if this call ran `setup`.
    ///
    /// A failed setup leaves the count untouched so the next caller retries.
    pub async fn initialize<F, Fut>(&self, setup: F) -> Result<bool, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let mut count = self.count.lock().await;

        let ran = if *count == 0 {
            info!("{}: initializing", self.name);
            setup().await?;
            self.initialized.store(true, Ordering::SeqCst);
            true
        } else {
            false
        };

        *count += 1;
        debug!("{}: {} active initializers", self.name, *count);
        Ok(ran)
    }

    /// Release an initializer. Returns true if this call ran `teardown`.
    pub async fn uninitialize<F, Fut>(&self, teardown: F) -> Result<bool, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let mut count = self.count.lock().await;

        match *count {
            0 => {
                warn!("{}: uninitialize called without an initializer", self.name);
                Ok(false)
            }
            1 => {
                *count = 0;
                self.initialized.store(false, Ordering::SeqCst);
                info!("{}: uninitializing", self.name);
                teardown().await?;
                Ok(true)
            }
            _ => {
                *count -= 1;
                debug!("{}: {} active initializers", self.name, *count);
                Ok(false)
            }
        }
    }

    pub fn initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn count(&self) -> usize {
        *self.count.lock().await
    }
}
