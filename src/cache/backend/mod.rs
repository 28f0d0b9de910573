use std::time::Duration;

use crate::cache::{CacheType, MaybeAsync, RemoteHandle, Scheduler, Snapshot, Value};

mod async_remote;
mod dict;
mod sync_remote;

pub use async_remote::AsyncRemoteBackend;
pub use dict::DictBackend;
pub use sync_remote::SyncRemoteBackend;

/// The operation set every cache backend provides.
///
/// Implementations agree on results; they differ in whether the returned
/// [`MaybeAsync`] is already complete.
pub trait CacheBackend {
    fn cache_type(&self) -> CacheType;

    /// Every stored key with its current value.
    fn snapshot(&self) -> MaybeAsync<Snapshot>;

    /// The value under `key`, `None` if absent.
    fn get(&self, key: &Value) -> MaybeAsync<Option<Value>>;

    fn keys(&self) -> MaybeAsync<Vec<Value>>;

    fn values(&self) -> MaybeAsync<Vec<Value>>;

    /// Insert or overwrite `key`, removing it after `delete_after` when given.
    fn set(&self, key: Value, value: Value, delete_after: Option<Duration>) -> MaybeAsync<()>;

    /// Capture a snapshot, then empty the backend.
    fn take(&self) -> MaybeAsync<Snapshot>;

    /// Empty the backend.
    fn flush(&self) -> MaybeAsync<()>;
}

#[derive(Debug)]
pub enum Backend {
    Dict(DictBackend),
    SyncRemote(SyncRemoteBackend),
    AsyncRemote(AsyncRemoteBackend),
}

impl Backend {
    pub fn new(remote: Option<&RemoteHandle>, scheduler: &Scheduler) -> Self {
        match remote {
            None => Backend::Dict(DictBackend::new(scheduler.clone())),
            Some(RemoteHandle::Sync(store)) => {
                Backend::SyncRemote(SyncRemoteBackend::new(store.clone()))
            }
            Some(RemoteHandle::Async(store)) => {
                Backend::AsyncRemote(AsyncRemoteBackend::new(store.clone()))
            }
        }
    }

    pub fn as_dyn(&self) -> &dyn CacheBackend {
        match self {
            Backend::Dict(backend) => backend,
            Backend::SyncRemote(backend) => backend,
            Backend::AsyncRemote(backend) => backend,
        }
    }

    pub fn as_dict(&self) -> Option<&DictBackend> {
        match self {
            Backend::Dict(backend) => Some(backend),
            _ => None,
        }
    }
}
