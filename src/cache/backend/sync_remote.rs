use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::cache::store::{lock_sync, SharedSyncStore, SyncStore};
use crate::cache::value::{REMOTE_KEY_KINDS, REMOTE_VALUE_KINDS};
use crate::cache::{CacheType, Error, MaybeAsync, Snapshot, Value};

/// Remote store reached through a blocking client. Every call blocks the
/// current thread until the service answers.
pub struct SyncRemoteBackend {
    store: SharedSyncStore,
}

impl SyncRemoteBackend {
    pub fn new(store: SharedSyncStore) -> Self {
        SyncRemoteBackend { store }
    }
}

impl fmt::Debug for SyncRemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SyncRemoteBackend").finish_non_exhaustive()
    }
}

fn collect(store: &mut dyn SyncStore) -> Result<Snapshot, Error> {
    let mut snapshot = Snapshot::new();
    for key in store.keys()? {
        // A key may disappear between KEYS and GET
        if let Some(value) = store.get(&key)? {
            snapshot.insert(Value::from_remote(key), Value::from_remote(value));
        }
    }
    Ok(snapshot)
}

impl CacheBackend for SyncRemoteBackend {
    fn cache_type(&self) -> CacheType {
        CacheType::SyncRemote
    }

    fn snapshot(&self) -> MaybeAsync<Snapshot> {
        collect(&mut **lock_sync(&self.store)).into()
    }

    fn get(&self, key: &Value) -> MaybeAsync<Option<Value>> {
        let result = key.to_remote(&REMOTE_KEY_KINDS).and_then(|key| {
            let value = lock_sync(&self.store).get(&key)?;
            Ok(value.map(Value::from_remote))
        });
        result.into()
    }

    fn keys(&self) -> MaybeAsync<Vec<Value>> {
        let result = lock_sync(&self.store).keys();
        result
            .map(|keys| keys.into_iter().map(Value::from_remote).collect())
            .map_err(Error::from)
            .into()
    }

    fn values(&self) -> MaybeAsync<Vec<Value>> {
        collect(&mut **lock_sync(&self.store))
            .map(|snapshot| snapshot.into_values().collect())
            .into()
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

        lock_sync(&self.store)
            .set(&key, &value, delete_after)
            .map_err(Error::from)
            .into()
    }

    fn take(&self) -> MaybeAsync<Snapshot> {
        let mut store = lock_sync(&self.store);
        let result = collect(&mut **store).and_then(|snapshot| {
            store.flush()?;
            debug!("Flushed remote keyspace ({} keys)", snapshot.len());
            Ok(snapshot)
        });
        result.into()
    }

    fn flush(&self) -> MaybeAsync<()> {
        lock_sync(&self.store).flush().map_err(Error::from).into()
    }
}
