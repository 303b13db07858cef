use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::KeyValueStore;
use crate::error::AppError;

/// Durable store backed by a Redis connection manager.
///
/// `ConnectionManager` is cheap to clone and reconnects on its own, so each call
/// works on a clone instead of holding a lock across awaits.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

/// Redis refuses NaN scores; fail before the round trip with the same kind the
/// in-process store uses.
fn reject_nan(key: &str, score: f64) -> Result<(), AppError> {
    if score.is_nan() {
        return Err(AppError::InvalidInput(format!(
            "score for key '{}' is not a number (NaN)",
            key
        )));
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        match ttl {
            // PX keeps sub-second TTLs exact
            Some(ttl) => {
                let _: () = redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("PX")
                    .arg(ttl.as_millis().max(1) as u64)
                    .query_async(&mut conn)
                    .await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl.as_millis().max(1) as u64);
        }
        // "OK" when written, nil when the key already existed
        let result: Option<String> = cmd.query_async(&mut conn).await?;
        Ok(result.is_some())
    }

    async fn del(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let removed: usize = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn lpush(&self, key: &str, values: &[String]) -> Result<usize, AppError> {
        let mut conn = self.conn.clone();
        if values.is_empty() {
            return Ok(conn.llen(key).await?);
        }
        Ok(conn.lpush(key, values).await?)
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: () = conn.ltrim(key, start, stop).await?;
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, start, stop).await?)
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool, AppError> {
        reject_nan(key, score)?;
        let mut conn = self.conn.clone();
        let added: usize = conn.zadd(key, member, score).await?;
        Ok(added > 0)
    }

    async fn zincrby(&self, key: &str, delta: f64, member: &str) -> Result<f64, AppError> {
        reject_nan(key, delta)?;
        let mut conn = self.conn.clone();
        Ok(conn.zincr(key, member, delta).await?)
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn.zrange(key, start, stop).await?)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize, AppError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        Ok(conn.sadd(key, members).await?)
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<usize, AppError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        Ok(conn.srem(key, members).await?)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn.smembers(key).await?)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        Ok(conn.sismember(key, member).await?)
    }
}
