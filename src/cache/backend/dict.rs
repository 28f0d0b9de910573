use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::cache::{CacheType, ExpiryHandle, MaybeAsync, Scheduler, Snapshot, Value};

type Store = Arc<Mutex<HashMap<Value, Value>>>;

fn lock(store: &Store) -> MutexGuard<'_, HashMap<Value, Value>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process map. Every operation completes before returning.
#[derive(Debug)]
pub struct DictBackend {
    store: Store,
    scheduler: Scheduler,
}

impl DictBackend {
    pub fn new(scheduler: Scheduler) -> Self {
        DictBackend {
            store: Arc::new(Mutex::new(HashMap::new())),
            scheduler,
        }
    }

    /// Inserts `key`, returning the handle of its deletion timer if `delete_after` is set.
    ///
    /// The timer removes whatever sits under `key` when it fires, including a
    /// value written after this call.
    pub fn insert(
        &self,
        key: Value,
        value: Value,
        delete_after: Option<Duration>,
    ) -> Option<ExpiryHandle> {
        lock(&self.store).insert(key.clone(), value);

        let delete_after = delete_after?;
        let store = Arc::downgrade(&self.store);
        let handle = self.scheduler.run_after(delete_after, move || {
            let Some(store) = store.upgrade() else {
                return;
            };
            if lock(&store).remove(&key).is_some() {
                debug!("Expired cache entry {key}");
            }
        });
        Some(handle)
    }

    pub fn clear(&self) {
        lock(&self.store).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.store).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for DictBackend {
    fn cache_type(&self) -> CacheType {
        CacheType::Dict
    }

    fn snapshot(&self) -> MaybeAsync<Snapshot> {
        MaybeAsync::ok(lock(&self.store).clone())
    }

    fn get(&self, key: &Value) -> MaybeAsync<Option<Value>> {
        MaybeAsync::ok(lock(&self.store).get(key).cloned())
    }

    fn keys(&self) -> MaybeAsync<Vec<Value>> {
        MaybeAsync::ok(lock(&self.store).keys().cloned().collect())
    }

    fn values(&self) -> MaybeAsync<Vec<Value>> {
        MaybeAsync::ok(lock(&self.store).values().cloned().collect())
    }

    fn set(&self, key: Value, value: Value, delete_after: Option<Duration>) -> MaybeAsync<()> {
        self.insert(key, value, delete_after);
        MaybeAsync::ok(())
    }

    fn take(&self) -> MaybeAsync<Snapshot> {
        MaybeAsync::ok(mem::take(&mut *lock(&self.store)))
    }

    fn flush(&self) -> MaybeAsync<()> {
        self.clear();
        MaybeAsync::ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> DictBackend {
        DictBackend::new(Scheduler::current().unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let dict = backend();
        assert!(dict.insert("key".into(), 5.into(), None).is_none());

        assert_eq!(
            dict.get(&"key".into()).into_ready().unwrap(),
            Some(Value::Int(5))
        );
        assert_eq!(dict.get(&"other".into()).into_ready().unwrap(), None);
        assert_eq!(dict.len(), 1);
    }

    #[tokio::test]
    async fn test_expiry_removes_entry() {
        let dict = backend();
        let handle = dict.insert("key".into(), "value".into(), Some(Duration::from_millis(30)));
        assert!(handle.is_some());

        assert!(!dict.is_empty());
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(dict.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_expiry_keeps_entry() {
        let dict = backend();
        let handle = dict
            .insert("key".into(), "value".into(), Some(Duration::from_millis(30)))
            .unwrap();
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(
            dict.get(&"key".into()).into_ready().unwrap(),
            Some(Value::from("value"))
        );
    }

    #[tokio::test]
    async fn test_expiry_of_missing_key_is_ignored() {
        let dict = backend();
        dict.insert("key".into(), "value".into(), Some(Duration::from_millis(30)));
        dict.flush().into_ready().unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(dict.is_empty());
    }

    #[tokio::test]
    async fn test_take_empties_store() {
        let dict = backend();
        dict.insert("a".into(), 1.into(), None);
        dict.insert("b".into(), 2.into(), None);

        let taken = dict.take().into_ready().unwrap();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.get(&"a".into()), Some(&Value::Int(1)));
        assert!(dict.is_empty());
    }
}
