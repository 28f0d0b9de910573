use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Cmd, Connection, RedisResult};

use crate::cache::store::{AsyncStore, SyncStore};

fn set_command(key: &[u8], value: &[u8], ttl: Option<Duration>) -> Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if let Some(ttl) = ttl {
        // PX 0 is rejected, so partial milliseconds round up
        let millis = u64::try_from(ttl.as_nanos().div_ceil(1_000_000))
            .unwrap_or(u64::MAX)
            .max(1);
        cmd.arg("PX").arg(millis);
    }
    cmd
}

impl SyncStore for Connection {
    fn get(&mut self, key: &[u8]) -> RedisResult<Option<Vec<u8>>> {
        redis::cmd("GET").arg(key).query(self)
    }

    fn set(&mut self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        set_command(key, value, ttl).query(self)
    }

    fn keys(&mut self) -> RedisResult<Vec<Vec<u8>>> {
        redis::cmd("KEYS").arg("*").query(self)
    }

    fn flush(&mut self) -> RedisResult<()> {
        redis::cmd("FLUSHDB").query(self)
    }
}

// Commands run on a clone, which shares the underlying multiplexed socket.
#[async_trait]
impl AsyncStore for MultiplexedConnection {
    async fn get(&self, key: &[u8]) -> RedisResult<Option<Vec<u8>>> {
        let mut conn = self.clone();
        redis::cmd("GET").arg(key).query_async(&mut conn).await
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl: Option<Duration>) -> RedisResult<()> {
        let mut conn = self.clone();
        set_command(key, value, ttl).query_async(&mut conn).await
    }

    async fn keys(&self) -> RedisResult<Vec<Vec<u8>>> {
        let mut conn = self.clone();
        redis::cmd("KEYS").arg("*").query_async(&mut conn).await
    }

    async fn flush(&self) -> RedisResult<()> {
        let mut conn = self.clone();
        redis::cmd("FLUSHDB").query_async(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_command_with_ttl() {
        let cmd = set_command(b"key", b"value", Some(Duration::from_millis(1500)));
        let args: Vec<Vec<u8>> = cmd
            .args_iter()
            .filter_map(|arg| match arg {
                redis::Arg::Simple(bytes) => Some(bytes.to_vec()),
                _ => None,
            })
            .collect();

        assert_eq!(
            args,
            vec![
                b"SET".to_vec(),
                b"key".to_vec(),
                b"value".to_vec(),
                b"PX".to_vec(),
                b"1500".to_vec(),
            ]
        );
    }

    #[test]
    fn test_set_command_sub_millisecond_ttl() {
        for (ttl, expected) in [
            (Duration::ZERO, b"1".to_vec()),
            (Duration::from_micros(500), b"1".to_vec()),
            (Duration::from_micros(1500), b"2".to_vec()),
        ] {
            let cmd = set_command(b"key", b"value", Some(ttl));
            let last = cmd.args_iter().last().map(|arg| match arg {
                redis::Arg::Simple(bytes) => bytes.to_vec(),
                _ => Vec::new(),
            });
            assert_eq!(last, Some(expected), "ttl {ttl:?}");
        }
    }

    #[test]
    fn test_set_command_without_ttl() {
        let cmd = set_command(b"key", b"value", None);
        assert_eq!(cmd.args_iter().count(), 3);
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_multiplexed_connection_round_trip() {
        let client = redis::Client::open("redis://localhost:6379/0").unwrap();
        let conn = client.get_multiplexed_async_connection().await.unwrap();

        AsyncStore::set(&conn, b"store_test_key", b"value", Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(
            AsyncStore::get(&conn, b"store_test_key").await.unwrap(),
            Some(b"value".to_vec())
        );

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(AsyncStore::get(&conn, b"store_test_key").await.unwrap(), None);
    }
}
