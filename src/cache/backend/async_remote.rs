use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::cache::store::AsyncStore;
use crate::cache::value::{REMOTE_KEY_KINDS, REMOTE_VALUE_KINDS};
use crate::cache::{CacheType, Error, MaybeAsync, Snapshot, Value};

/// Remote store reached through a non-blocking client.
///
/// Every operation returns a pending completion; each call into the store
/// is a suspension point. Arguments are validated before the completion is
/// built, so a rejected key or value never reaches the store.
pub struct AsyncRemoteBackend {
    store: Arc<dyn AsyncStore>,
}

impl AsyncRemoteBackend {
    pub fn new(store: Arc<dyn AsyncStore>) -> Self {
        AsyncRemoteBackend { store }
    }
}

impl fmt::Debug for AsyncRemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AsyncRemoteBackend").finish_non_exhaustive()
    }
}

async fn collect(store: &dyn AsyncStore) -> Result<Snapshot, Error> {
    let mut snapshot = Snapshot::new();
    for key in store.keys().await? {
        if let Some(value) = store.get(&key).await? {
            snapshot.insert(Value::from_remote(key), Value::from_remote(value));
        }
    }
    Ok(snapshot)
}

async fn fetch(store: Arc<dyn AsyncStore>, key: Vec<u8>) -> Result<Option<Value>, Error> {
    let value = store.get(&key).await?;
    Ok(value.map(Value::from_remote))
}

async fn list_keys(store: Arc<dyn AsyncStore>) -> Result<Vec<Value>, Error> {
    let keys = store.keys().await?;
    Ok(keys.into_iter().map(Value::from_remote).collect())
}

async fn store_value(
    store: Arc<dyn AsyncStore>,
    key: Vec<u8>,
    value: Vec<u8>,
    ttl: Option<Duration>,
) -> Result<(), Error> {
    Ok(store.set(&key, &value, ttl).await?)
}

async fn take(store: Arc<dyn AsyncStore>) -> Result<Snapshot, Error> {
    let snapshot = collect(store.as_ref()).await?;
    store.flush().await?;
    debug!("Flushed remote keyspace ({} keys)", snapshot.len());
    Ok(snapshot)
}

async fn flush(store: Arc<dyn AsyncStore>) -> Result<(), Error> {
    Ok(store.flush().await?)
}

impl CacheBackend for AsyncRemoteBackend {
    fn cache_type(&self) -> CacheType {
        CacheType::AsyncRemote
    }

    fn snapshot(&self) -> MaybeAsync<Snapshot> {
        let store = self.store.clone();
        MaybeAsync::pending(async move { collect(store.as_ref()).await })
    }

    fn get(&self, key: &Value) -> MaybeAsync<Option<Value>> {
        match key.to_remote(&REMOTE_KEY_KINDS) {
            Ok(key) => MaybeAsync::pending(fetch(self.store.clone(), key)),
            Err(err) => MaybeAsync::err(err),
        }
    }

    fn keys(&self) -> MaybeAsync<Vec<Value>> {
        MaybeAsync::pending(list_keys(self.store.clone()))
    }

    fn values(&self) -> MaybeAsync<Vec<Value>> {
        self.snapshot()
            .map(|snapshot| snapshot.into_values().collect())
    }

    fn set(&self, key: Value, value: Value, delete_after: Option<Duration>) -> MaybeAsync<()> {
        let key = match key.to_remote(&REMOTE_KEY_KINDS) {
            Ok(key) => key,
            Err(err) => return MaybeAsync::err(err),
        };
        let value = match value.to_remote(&REMOTE_VALUE_KINDS) {
            Ok(value) => value,
            Err(err) => return MaybeAsync::err(err),
        };

        MaybeAsync::pending(store_value(self.store.clone(), key, value, delete_after))
    }

    fn take(&self) -> MaybeAsync<Snapshot> {
        MaybeAsync::pending(take(self.store.clone()))
    }

    fn flush(&self) -> MaybeAsync<()> {
        MaybeAsync::pending(flush(self.store.clone()))
    }
}
