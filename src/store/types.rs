use std::fmt::{Debug, Display};
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;

use super::error::StoreError;

pub type Fetch<'a, T> = BoxFuture<'a, Result<T, StoreError>>;

pub struct ArcMut<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> ArcMut<T> {
    pub fn new(data: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(data)),
        }
    }
}

impl<T> Clone for ArcMut<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Deref for ArcMut<T> {
    type Target = Arc<Mutex<T>>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// An entity that is ordered by a domain key, eg. a transaction by hash or a
/// mosaic by block height. Pages are cursored on this key.
pub trait Keyed {
    type Key: Clone + PartialEq + Display + Debug + Send + Sync + 'static;

    /// Name of the ordering field, used in log output.
    const KEY_NAME: &'static str;

    fn key(&self) -> Self::Key;
}

/// Paginated fetches backing a [`Timeline`](super::timeline::Timeline).
///
/// Lists are returned newest first. `before` returns items strictly older
/// than `key`, `after` items strictly newer than `key`.
pub trait PageSource<T: Keyed>: Send + Sync {
    fn latest(&self, page_size: usize) -> Fetch<'_, Vec<T>>;
    fn before(&self, key: T::Key, page_size: usize) -> Fetch<'_, Vec<T>>;
    fn after(&self, key: T::Key, page_size: usize) -> Fetch<'_, Vec<T>>;
}

/// Single record fetch backing a [`DataSet`](super::dataset::DataSet).
pub trait RecordSource<K, R>: Send + Sync {
    fn fetch(&self, key: K) -> Fetch<'_, R>;
}

impl<K, R, F> RecordSource<K, R> for F
where
    F: Fn(K) -> Fetch<'static, R> + Send + Sync,
{
    fn fetch(&self, key: K) -> Fetch<'_, R> {
        self(key)
    }
}
