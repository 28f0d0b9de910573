use std::fs;
use std::path::Path;

use serde::{de, Deserialize, Deserializer};
use tracing::info;

use crate::cache::{Cache, RemoteHandle, Scheduler};

mod error;

pub use error::Error;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GlobalConfig {
    #[serde(
        default = "GlobalConfig::default_worker_threads",
        deserialize_with = "GlobalConfig::deserialize_worker_threads"
    )]
    pub worker_threads: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            worker_threads: GlobalConfig::default_worker_threads(),
        }
    }
}

impl GlobalConfig {
    fn default_worker_threads() -> usize {
        2
    }

    fn deserialize_worker_threads<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        match usize::deserialize(deserializer)? {
            0 => Err(de::Error::custom("worker_threads must be at least 1")),
            threads => Ok(threads),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub enum CacheConfig {
    #[default]
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "redis")]
    Redis(RedisConfig),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default)]
    pub client: RedisClientKind,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RedisClientKind {
    Sync,
    #[default]
    Async,
}

impl CacheConfig {
    /// Connects the configured backend and builds a cache over it.
    pub async fn build(&self, scheduler: Scheduler) -> Result<Cache, Error> {
        let remote = match self {
            CacheConfig::Memory => None,
            CacheConfig::Redis(config) => Some(config.connect().await?),
        };
        Ok(Cache::new(remote, scheduler))
    }
}

impl RedisConfig {
    pub async fn connect(&self) -> Result<RemoteHandle, Error> {
        info!("Connecting to Redis ({:?} client)", self.client);
        let client = redis::Client::open(self.url.as_str())?;
        let remote = match self.client {
            RedisClientKind::Sync => RemoteHandle::blocking(client.get_connection()?),
            RedisClientKind::Async => {
                RemoteHandle::non_blocking(client.get_multiplexed_async_connection().await?)
            }
        };
        Ok(remote)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ObservabilityConfig {
    pub tracing: Option<TracingConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TracingConfig {
    pub endpoint: String,
    pub sampling_rate: f64,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_str = fs::read_to_string(path)?;
        Self::load_from_str(&config_str)
    }

    pub fn load_from_str(slice: &str) -> Result<Self, Error> {
        Ok(toml::from_str(slice)?)
    }
}
