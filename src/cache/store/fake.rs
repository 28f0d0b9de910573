use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use redis::RedisResult;

use crate::cache::store::{AsyncStore, SyncStore};

#[derive(Debug, Default)]
struct FakeStorage {
    data: HashMap<Vec<u8>, Vec<u8>>,
    ttls: HashMap<Vec<u8>, Duration>,
    fail_with: Option<String>,
}

/// In-memory stand-in for a Redis server. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct FakeStore {
    storage: Arc<Mutex<FakeStorage>>,
    calls: Arc<AtomicUsize>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &[u8], value: &[u8]) {
        let mut storage = self.storage.lock().unwrap();
        storage.data.insert(key.to_vec(), value.to_vec());
    }

    pub fn raw(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.storage.lock().unwrap().data.get(key).cloned()
    }

    pub fn ttl(&self, key: &[u8]) -> Option<Duration> {
        self.storage.lock().unwrap().ttls.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.storage.lock().unwrap().data.len()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, message: &str) {
        self.storage.lock().unwrap().fail_with = Some(message.to_string());
    }

    fn check(&self) -> RedisResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.storage.lock().unwrap().fail_with {
            Some(message) => Err(redis::RedisError::from((
                redis::ErrorKind::TryAgain,
                "fake store failure",
                message.clone(),
            ))),
            None => Ok(()),
        }
    }

    fn do_get(&self, key: &[u8]) -> RedisResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.raw(key))
    }

    fn do_set(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        self.check()?;
        let mut storage = self.storage.lock().unwrap();
        storage.data.insert(key.to_vec(), value.to_vec());
        match ttl {
            Some(ttl) => storage.ttls.insert(key.to_vec(), ttl),
            None => storage.ttls.remove(key),
        };
        Ok(())
    }

    fn do_keys(&self) -> RedisResult<Vec<Vec<u8>>> {
        self.check()?;
        Ok(self.storage.lock().unwrap().data.keys().cloned().collect())
    }

    fn do_flush(&self) -> RedisResult<()> {
        self.check()?;
        let mut storage = self.storage.lock().unwrap();
        storage.data.clear();
        storage.ttls.clear();
        Ok(())
    }
}

impl SyncStore for FakeStore {
    fn get(&mut self, key: &[u8]) -> RedisResult<Option<Vec<u8>>> {
        self.do_get(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        self.do_set(key, value, ttl)
    }

    fn keys(&mut self) -> RedisResult<Vec<Vec<u8>>> {
        self.do_keys()
    }

    fn flush(&mut self) -> RedisResult<()> {
        self.do_flush()
    }
}

#[async_trait]
impl AsyncStore for FakeStore {
    async fn get(&self, key: &[u8]) -> RedisResult<Option<Vec<u8>>> {
        tokio::task::yield_now().await;
        self.do_get(key)
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        tokio::task::yield_now().await;
        self.do_set(key, value, ttl)
    }

    async fn keys(&self) -> RedisResult<Vec<Vec<u8>>> {
        tokio::task::yield_now().await;
        self.do_keys()
    }

    async fn flush(&self) -> RedisResult<()> {
        tokio::task::yield_now().await;
        self.do_flush()
    }
}
