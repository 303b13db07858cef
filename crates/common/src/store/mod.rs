//! Key-value store abstraction.
//!
//! One contract, two backends: `RedisStore` for durable state and `MemoryStore`
//! as the in-process fallback. Both follow Redis semantics (inclusive and
//! negative range indices, LPUSH ordering, sorted-set tie-breaking by member) so
//! callers cannot tell which one they were handed.

mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Uniform interface over the durable store and the in-process fallback.
///
/// Missing keys are never an error: reads return `None`, empty collections or
/// `false`, and removals return a zero count.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for logs ("redis" or "memory").
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Set a scalar. With `ttl`, the key reads as absent once `ttl` has elapsed.
    /// Without it, any previous expiry is cleared.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AppError>;

    /// Set a scalar only if the key does not exist. Returns whether it was written.
    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool, AppError>;

    /// Delete a key of any kind. Returns whether something was removed.
    async fn del(&self, key: &str) -> Result<bool, AppError>;

    /// Push each value onto the head of the list in turn. Returns the new length.
    async fn lpush(&self, key: &str, values: &[String]) -> Result<usize, AppError>;

    /// Keep only the inclusive index range `start..=stop`.
    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), AppError>;

    /// Elements in the inclusive index range `start..=stop`, head first.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError>;

    /// Upsert `member` with `score`. Returns `true` if the member is new.
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool, AppError>;

    /// Add `delta` to the member's score, creating it at `delta` if absent.
    async fn zincrby(&self, key: &str, delta: f64, member: &str) -> Result<f64, AppError>;

    /// Members in the inclusive rank range, ascending by score.
    async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError>;

    /// Returns the number of members that were not already present.
    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize, AppError>;

    /// Returns the number of members actually removed.
    async fn srem(&self, key: &str, members: &[String]) -> Result<usize, AppError>;

    /// All members, in no particular order.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, AppError>;

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, AppError>;
}

/// Resolve a Redis-style inclusive range against a collection of length `len`.
///
/// Negative indices count from the end. Returns `None` when the range selects
/// nothing.
pub(crate) fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    if len == 0 {
        return None;
    }

    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
