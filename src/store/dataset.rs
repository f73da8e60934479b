use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::lock;

use super::{
    error::StoreError,
    types::{ArcMut, RecordSource},
};

struct DataSetState<K, R> {
    key: Option<K>,
    data: Option<R>,
    loading: bool,
}

/// Caches one detail record fetched by an external identifier.
pub struct DataSet<K, R> {
    name: String,
    source: Arc<dyn RecordSource<K, R>>,
    state: ArcMut<DataSetState<K, R>>,
    sequence: Arc<AtomicU64>,
}

impl<K, R> Clone for DataSet<K, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            source: self.source.clone(),
            state: self.state.clone(),
            sequence: self.sequence.clone(),
        }
    }
}

impl<K, R> DataSet<K, R>
where
    K: Clone + Display + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn new(name: &str, source: Arc<dyn RecordSource<K, R>>) -> Self {
        Self {
            name: name.to_string(),
            source,
            state: ArcMut::new(DataSetState {
                key: None,
                data: None,
                loading: false,
            }),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fetch the record for `key` and make it the current record.
    pub async fn initial_fetch(&self, key: K) -> Result<(), StoreError> {
        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = lock!(self.state)?;
            state.key = Some(key.clone());
            state.loading = true;
        }

        debug!("{}: fetching record for key: {key}", self.name);
        let res = self.source.fetch(key.clone()).await;

        let mut state = lock!(self.state)?;
        if token != self.sequence.load(Ordering::SeqCst) {
            debug!("{}: discarding stale record for key: {key}", self.name);
            return res.map(|_| ());
        }
        state.loading = false;

        match res {
            Ok(record) => {
                state.data = Some(record);
                info!("{}: loaded record for key: {key}", self.name);
                Ok(())
            }
            Err(e) => {
                warn!("{}: unable to fetch record for key: {key}: {e}", self.name);
                Err(e)
            }
        }
    }

    /// Forget the current record and invalidate in-flight requests.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut state = lock!(self.state)?;
        state.key = None;
        state.data = None;
        state.loading = false;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Option<R> {
        self.read(|state| state.data.clone())
    }

    /// Project a field out of the current record, or its default when no
    /// record is loaded.
    pub fn field<V: Default>(&self, f: impl FnOnce(&R) -> V) -> V {
        self.read(|state| state.data.as_ref().map(f).unwrap_or_default())
    }

    pub fn key(&self) -> Option<K> {
        self.read(|state| state.key.clone())
    }

    pub fn loading(&self) -> bool {
        self.read(|state| state.loading)
    }

    fn read<V>(&self, f: impl FnOnce(&DataSetState<K, R>) -> V) -> V {
        let state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&*state)
    }
}
