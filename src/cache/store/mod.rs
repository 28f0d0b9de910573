use std::any::{type_name, Any};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use redis::RedisResult;

use crate::cache::{CacheType, Error};

#[cfg(test)]
pub(crate) mod fake;
mod redis_client;

/// Blocking access to a remote key/value service.
#[cfg_attr(test, mockall::automock)]
pub trait SyncStore: Send {
    fn get(&mut self, key: &[u8]) -> RedisResult<Option<Vec<u8>>>;

    /// Insert or overwrite `key`, expiring it after `ttl` when given.
    fn set(&mut self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> RedisResult<()>;

    fn keys(&mut self) -> RedisResult<Vec<Vec<u8>>>;

    /// Drop every key of the selected database.
    fn flush(&mut self) -> RedisResult<()>;
}

/// Non-blocking access to a remote key/value service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AsyncStore: Send + Sync {
    async fn get(&self, key: &[u8]) -> RedisResult<Option<Vec<u8>>>;

    /// Insert or overwrite `key`, expiring it after `ttl` when given.
    async fn set(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> RedisResult<()>;

    async fn keys(&self) -> RedisResult<Vec<Vec<u8>>>;

    /// Drop every key of the selected database.
    async fn flush(&self) -> RedisResult<()>;
}

pub type SharedSyncStore = Arc<Mutex<Box<dyn SyncStore>>>;

pub fn shared_sync<S: SyncStore + 'static>(store: S) -> SharedSyncStore {
    let store: Box<dyn SyncStore> = Box::new(store);
    Arc::new(Mutex::new(store))
}

pub(crate) fn lock_sync(store: &SharedSyncStore) -> MutexGuard<'_, Box<dyn SyncStore>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A handle on the remote key/value service backing a cache.
///
/// The variant decides the facade's mode: a blocking client gives
/// [`CacheType::SyncRemote`], a non-blocking one [`CacheType::AsyncRemote`].
#[derive(Clone)]
pub enum RemoteHandle {
    Sync(SharedSyncStore),
    Async(Arc<dyn AsyncStore>),
}

impl RemoteHandle {
    pub fn blocking<S: SyncStore + 'static>(store: S) -> Self {
        RemoteHandle::Sync(shared_sync(store))
    }

    pub fn non_blocking<S: AsyncStore + 'static>(store: S) -> Self {
        RemoteHandle::Async(Arc::new(store))
    }

    /// Classifies an arbitrary value as a remote handle.
    ///
    /// Accepts a `redis::Connection`, a `redis::aio::MultiplexedConnection`,
    /// or an already built `RemoteHandle`.
    ///
    /// # Errors
    ///
    /// * `Error::UnexpectedType` naming the accepted clients if `value` is anything else
    pub fn classify<T: Any + Send>(value: T) -> Result<Self, Error> {
        let value: Box<dyn Any + Send> = Box::new(value);

        let value = match value.downcast::<RemoteHandle>() {
            Ok(handle) => return Ok(*handle),
            Err(value) => value,
        };
        let value = match value.downcast::<redis::Connection>() {
            Ok(connection) => return Ok(Self::blocking(*connection)),
            Err(value) => value,
        };
        match value.downcast::<redis::aio::MultiplexedConnection>() {
            Ok(connection) => Ok(Self::non_blocking(*connection)),
            Err(_) => Err(Error::unexpected_type(
                ["redis::Connection", "redis::aio::MultiplexedConnection"],
                type_name::<T>(),
            )),
        }
    }

    pub fn cache_type(&self) -> CacheType {
        match self {
            RemoteHandle::Sync(_) => CacheType::SyncRemote,
            RemoteHandle::Async(_) => CacheType::AsyncRemote,
        }
    }
}

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RemoteHandle::Sync(_) => f.write_str("RemoteHandle::Sync"),
            RemoteHandle::Async(_) => f.write_str("RemoteHandle::Async"),
        }
    }
}
