use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, instrument};

pub mod backend;
mod cache_type;
mod error;
mod maybe_async;
mod scheduler;
pub mod store;
mod value;


use backend::Backend;
pub use cache_type::CacheType;
pub use error::Error;
pub use maybe_async::MaybeAsync;
pub use scheduler::{ExpiryHandle, Scheduler};
pub use store::{AsyncStore, RemoteHandle, SyncStore};
pub use value::{Kind, Value, REMOTE_KEY_KINDS, REMOTE_VALUE_KINDS};

/// Every stored key with its value at the time it was read.
pub type Snapshot = HashMap<Value, Value>;

/// A cache with one interface over an in-process map or a remote
/// Redis-compatible store.
///
/// The mode is fixed from the remote handle at construction: no handle
/// gives [`CacheType::Dict`], a blocking client [`CacheType::SyncRemote`]
/// and a non-blocking client [`CacheType::AsyncRemote`]. Operations return
/// [`MaybeAsync`], which is already complete unless the mode is
/// `AsyncRemote`.
///
/// Remote snapshots (`cache`, `values`, `clear`) are assembled from one KEYS
/// and one GET per key, so concurrent writers may produce a torn view.
///
/// # Example
///
/// ```rust,ignore
/// let cache = Cache::local(Scheduler::current()?);
/// cache.set("greeting", "hello", Some(Duration::from_secs(5))).await?;
/// assert_eq!(cache.get("greeting").await?, Some(Value::from("hello")));
/// ```
#[derive(Debug)]
pub struct Cache {
    backend: Backend,
    remote: Option<RemoteHandle>,
    scheduler: Scheduler,
}

impl Cache {
    pub fn new(remote: Option<RemoteHandle>, scheduler: Scheduler) -> Self {
        let backend = Backend::new(remote.as_ref(), &scheduler);
        info!("Using {} cache", backend.as_dyn().cache_type());
        Cache {
            backend,
            remote,
            scheduler,
        }
    }

    pub fn local(scheduler: Scheduler) -> Self {
        Self::new(None, scheduler)
    }

    pub fn cache_type(&self) -> CacheType {
        self.backend.as_dyn().cache_type()
    }

    /// Switches the active backend.
    ///
    /// Switching to `Dict` detaches the remote handle: it stays reachable for
    /// [`Cache::clear_all`] but is no longer used. Switching back to a remote
    /// mode requires a retained handle of the matching kind. Any switch
    /// starts from an empty in-process map.
    ///
    /// # Errors
    ///
    /// * `Error::UnexpectedType` if no retained handle serves `cache_type`
    pub fn set_cache_type(&mut self, cache_type: CacheType) -> Result<(), Error> {
        if cache_type == self.cache_type() {
            return Ok(());
        }

        let remote = match (cache_type, &self.remote) {
            (CacheType::Dict, _) => None,
            (_, Some(remote)) if remote.cache_type() == cache_type => Some(remote),
            (_, remote) => {
                let available = remote.as_ref().map(RemoteHandle::cache_type);
                let expected = std::iter::once(CacheType::Dict).chain(available);
                return Err(Error::unexpected_type(expected, cache_type));
            }
        };

        debug!("Switching cache from {} to {cache_type}", self.cache_type());
        self.backend = Backend::new(remote, &self.scheduler);
        Ok(())
    }

    pub fn remote(&self) -> Option<&RemoteHandle> {
        self.remote.as_ref()
    }

    /// Replaces the remote handle and re-derives the mode from it.
    ///
    /// Entries held by the in-process map are dropped, not migrated.
    pub fn set_remote(&mut self, remote: Option<RemoteHandle>) {
        self.backend = Backend::new(remote.as_ref(), &self.scheduler);
        self.remote = remote;
        info!("Using {} cache", self.cache_type());
    }

    /// Classifies `client` and attaches it as the remote handle.
    ///
    /// # Errors
    ///
    /// * `Error::UnexpectedType` if `client` is not a supported Redis client
    pub fn attach<T: std::any::Any + Send>(&mut self, client: T) -> Result<(), Error> {
        let remote = RemoteHandle::classify(client)?;
        self.set_remote(Some(remote));
        Ok(())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Every key with its current value.
    #[instrument(skip(self))]
    pub fn cache(&self) -> MaybeAsync<Snapshot> {
        self.backend.as_dyn().snapshot()
    }

    /// The value stored under `key`, `None` if there is none.
    #[instrument(skip(self, key))]
    pub fn get(&self, key: impl Into<Value>) -> MaybeAsync<Option<Value>> {
        self.backend.as_dyn().get(&key.into())
    }

    #[instrument(skip(self))]
    pub fn keys(&self) -> MaybeAsync<Vec<Value>> {
        self.backend.as_dyn().keys()
    }

    #[instrument(skip(self))]
    pub fn values(&self) -> MaybeAsync<Vec<Value>> {
        self.backend.as_dyn().values()
    }

    /// Stores `value` under `key`, removing it after `delete_after` if given.
    ///
    /// On the in-process map the removal is a detached timer on the
    /// scheduler; remote backends pass `delete_after` as the entry's TTL.
    ///
    /// # Errors
    ///
    /// * `Error::UnexpectedType` if a remote backend does not accept the key or value kind
    #[instrument(skip(self, key, value))]
    pub fn set(
        &self,
        key: impl Into<Value>,
        value: impl Into<Value>,
        delete_after: Option<Duration>,
    ) -> MaybeAsync<()> {
        self.backend
            .as_dyn()
            .set(key.into(), value.into(), delete_after)
    }

    /// Stores `value` under `key` in the in-process map and returns the
    /// handle of its deletion timer. `None` outside `Dict` mode or without
    /// `delete_after`.
    pub fn set_local(
        &self,
        key: impl Into<Value>,
        value: impl Into<Value>,
        delete_after: Option<Duration>,
    ) -> Option<ExpiryHandle> {
        let dict = self.backend.as_dict()?;
        dict.insert(key.into(), value.into(), delete_after)
    }

    /// Empties the active backend and returns what it held.
    ///
    /// A remote backend is emptied with a full database flush.
    #[instrument(skip(self))]
    pub fn clear(&self) -> MaybeAsync<Snapshot> {
        self.backend.as_dyn().take()
    }

    /// Empties the in-process map and flushes the remote handle's database,
    /// whichever mode is active.
    ///
    /// The flush also covers a handle detached with [`Cache::set_cache_type`].
    #[instrument(skip(self))]
    pub fn clear_all(&self) -> MaybeAsync<()> {
        if let Some(dict) = self.backend.as_dict() {
            dict.clear();
        }

        match &self.remote {
            None => MaybeAsync::ok(()),
            Some(remote) => {
                info!("Flushing remote {} keyspace", remote.cache_type());
                Backend::new(Some(remote), &self.scheduler).as_dyn().flush()
            }
        }
    }
}
