use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{KeyValueStore, resolve_range};
use crate::error::AppError;

/// Typed value held under a key, mirroring the Redis data types we use.
#[derive(Debug, Clone)]
enum Value {
    Scalar(String),
    List(VecDeque<String>),
    SortedSet(HashMap<String, f64>),
    Set(HashSet<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "string",
            Value::List(_) => "list",
            Value::SortedSet(_) => "zset",
            Value::Set(_) => "set",
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process fallback store.
///
/// All state sits behind one mutex, so every operation is atomic on its own.
/// Expiry is lazy: an expired key is dropped the next time it is touched.
/// Time comes from `tokio::time`, which lets tests drive TTLs with a paused clock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Slot>>,
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> AppError {
    AppError::Internal(format!(
        "WRONGTYPE key '{}' holds a {}, expected a {}",
        key,
        found.kind(),
        expected
    ))
}

fn not_a_number(key: &str) -> AppError {
    AppError::InvalidInput(format!("score for key '{}' is not a number (NaN)", key))
}

/// Drop `key` if it has expired, then hand back whatever is left.
fn live<'a>(slots: &'a mut HashMap<String, Slot>, key: &str) -> Option<&'a mut Slot> {
    let now = Instant::now();
    if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
        slots.remove(key);
    }
    slots.get_mut(key)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys (for tests and monitoring).
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| !slot.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut slots = self.slots.lock().await;
        match live(&mut slots, key) {
            None => Ok(None),
            Some(Slot {
                value: Value::Scalar(v),
                ..
            }) => Ok(Some(v.clone())),
            Some(slot) => Err(wrong_type(key, "string", &slot.value)),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AppError> {
        let mut slots = self.slots.lock().await;
        slots.insert(
            key.to_string(),
            Slot {
                value: Value::Scalar(value.to_string()),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool, AppError> {
        let mut slots = self.slots.lock().await;
        if live(&mut slots, key).is_some() {
            return Ok(false);
        }
        slots.insert(
            key.to_string(),
            Slot {
                value: Value::Scalar(value.to_string()),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn del(&self, key: &str) -> Result<bool, AppError> {
        let mut slots = self.slots.lock().await;
        let existed = live(&mut slots, key).is_some();
        slots.remove(key);
        Ok(existed)
    }

    async fn lpush(&self, key: &str, values: &[String]) -> Result<usize, AppError> {
        let mut slots = self.slots.lock().await;
        if live(&mut slots, key).is_none() {
            if values.is_empty() {
                return Ok(0);
            }
            slots.insert(
                key.to_string(),
                Slot {
                    value: Value::List(VecDeque::new()),
                    expires_at: None,
                },
            );
        }

        match slots.get_mut(key) {
            Some(Slot {
                value: Value::List(list),
                ..
            }) => {
                for value in values {
                    list.push_front(value.clone());
                }
                Ok(list.len())
            }
            Some(slot) => Err(wrong_type(key, "list", &slot.value)),
            None => Ok(0),
        }
    }

    async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<(), AppError> {
        let mut slots = self.slots.lock().await;
        let now_empty = match live(&mut slots, key) {
            None => return Ok(()),
            Some(Slot {
                value: Value::List(list),
                ..
            }) => match resolve_range(list.len(), start, stop) {
                Some((from, to)) => {
                    list.truncate(to + 1);
                    list.drain(..from);
                    list.is_empty()
                }
                None => true,
            },
            Some(slot) => return Err(wrong_type(key, "list", &slot.value)),
        };

        if now_empty {
            slots.remove(key);
        }
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError> {
        let mut slots = self.slots.lock().await;
        match live(&mut slots, key) {
            None => Ok(Vec::new()),
            Some(Slot {
                value: Value::List(list),
                ..
            }) => Ok(match resolve_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(slot) => Err(wrong_type(key, "list", &slot.value)),
        }
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool, AppError> {
        if score.is_nan() {
            return Err(not_a_number(key));
        }
        let mut slots = self.slots.lock().await;
        if live(&mut slots, key).is_none() {
            slots.insert(
                key.to_string(),
                Slot {
                    value: Value::SortedSet(HashMap::new()),
                    expires_at: None,
                },
            );
        }

        match slots.get_mut(key) {
            Some(Slot {
                value: Value::SortedSet(zset),
                ..
            }) => Ok(zset.insert(member.to_string(), score).is_none()),
            Some(slot) => Err(wrong_type(key, "zset", &slot.value)),
            None => Ok(false),
        }
    }

    async fn zincrby(&self, key: &str, delta: f64, member: &str) -> Result<f64, AppError> {
        if delta.is_nan() {
            return Err(not_a_number(key));
        }
        let mut slots = self.slots.lock().await;
        if live(&mut slots, key).is_none() {
            slots.insert(
                key.to_string(),
                Slot {
                    value: Value::SortedSet(HashMap::new()),
                    expires_at: None,
                },
            );
        }

        match slots.get_mut(key) {
            Some(Slot {
                value: Value::SortedSet(zset),
                ..
            }) => {
                // inf + -inf leaves the member untouched, as Redis does
                let score = zset.get(member).copied().unwrap_or(0.0) + delta;
                if score.is_nan() {
                    return Err(not_a_number(key));
                }
                zset.insert(member.to_string(), score);
                Ok(score)
            }
            Some(slot) => Err(wrong_type(key, "zset", &slot.value)),
            None => Ok(delta),
        }
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError> {
        let mut slots = self.slots.lock().await;
        match live(&mut slots, key) {
            None => Ok(Vec::new()),
            Some(Slot {
                value: Value::SortedSet(zset),
                ..
            }) => {
                let mut ranked: Vec<(&String, f64)> =
                    zset.iter().map(|(member, score)| (member, *score)).collect();
                ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

                Ok(match resolve_range(ranked.len(), start, stop) {
                    Some((from, to)) => ranked[from..=to]
                        .iter()
                        .map(|(member, _)| (*member).clone())
                        .collect(),
                    None => Vec::new(),
                })
            }
            Some(slot) => Err(wrong_type(key, "zset", &slot.value)),
        }
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize, AppError> {
        if members.is_empty() {
            return Ok(0);
        }

        let mut slots = self.slots.lock().await;
        if live(&mut slots, key).is_none() {
            slots.insert(
                key.to_string(),
                Slot {
                    value: Value::Set(HashSet::new()),
                    expires_at: None,
                },
            );
        }

        match slots.get_mut(key) {
            Some(Slot {
                value: Value::Set(set),
                ..
            }) => Ok(members
                .iter()
                .filter(|member| set.insert((*member).clone()))
                .count()),
            Some(slot) => Err(wrong_type(key, "set", &slot.value)),
            None => Ok(0),
        }
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<usize, AppError> {
        let mut slots = self.slots.lock().await;
        let (removed, now_empty) = match live(&mut slots, key) {
            None => return Ok(0),
            Some(Slot {
                value: Value::Set(set),
                ..
            }) => {
                let removed = members.iter().filter(|member| set.remove(*member)).count();
                (removed, set.is_empty())
            }
            Some(slot) => return Err(wrong_type(key, "set", &slot.value)),
        };

        if now_empty {
            slots.remove(key);
        }
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, AppError> {
        let mut slots = self.slots.lock().await;
        match live(&mut slots, key) {
            None => Ok(Vec::new()),
            Some(Slot {
                value: Value::Set(set),
                ..
            }) => Ok(set.iter().cloned().collect()),
            Some(slot) => Err(wrong_type(key, "set", &slot.value)),
        }
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool, AppError> {
        let mut slots = self.slots.lock().await;
        match live(&mut slots, key) {
            None => Ok(false),
            Some(Slot {
                value: Value::Set(set),
                ..
            }) => Ok(set.contains(member)),
            Some(slot) => Err(wrong_type(key, "set", &slot.value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_with_ttl_expires() {
        let store = MemoryStore::new();
        store
            .set("pumpfun:trending", "[]", Some(Duration::from_secs(900)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(899)).await;
        assert_eq!(store.get("pumpfun:trending").await.unwrap().as_deref(), Some("[]"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("pumpfun:trending").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_without_ttl_clears_expiry() {
        let store = MemoryStore::new();
        store.set("k", "a", Some(Duration::from_secs(10))).await.unwrap();
        store.set("k", "b", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_nx_respects_existing_key() {
        let store = MemoryStore::new();
        assert!(store.set_nx("lock", "1", Some(Duration::from_secs(60))).await.unwrap());
        assert!(!store.set_nx("lock", "2", Some(Duration::from_secs(60))).await.unwrap());
        assert_eq!(store.get("lock").await.unwrap().as_deref(), Some("1"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(store.set_nx("lock", "3", None).await.unwrap());
        assert_eq!(store.get("lock").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_lpush_prepends_each_value() {
        let store = MemoryStore::new();
        assert_eq!(store.lpush("l", &strings(&["a", "b"])).await.unwrap(), 2);
        assert_eq!(store.lpush("l", &strings(&["c"])).await.unwrap(), 3);
        assert_eq!(
            store.lrange("l", 0, -1).await.unwrap(),
            strings(&["c", "b", "a"])
        );
    }

    #[tokio::test]
    async fn test_ltrim_to_nothing_deletes_key() {
        let store = MemoryStore::new();
        store.lpush("l", &strings(&["a", "b", "c"])).await.unwrap();
        store.ltrim("l", 5, 10).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.lrange("l", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type_is_rejected() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        let err = store.sadd("k", &strings(&["m"])).await.unwrap_err();
        assert_eq!(err.kind(), "internal");
        assert!(err.to_string().contains("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_srem_last_member_deletes_key() {
        let store = MemoryStore::new();
        store.sadd("s", &strings(&["a"])).await.unwrap();
        assert_eq!(store.srem("s", &strings(&["a"])).await.unwrap(), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_del_reports_existence() {
        let store = MemoryStore::new();
        assert!(!store.del("missing").await.unwrap());
        store.zadd("z", 1.0, "m").await.unwrap();
        assert!(store.del("z").await.unwrap());
        assert!(store.zrange("z", 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nan_scores_are_rejected() {
        let store = MemoryStore::new();
        let err = store.zadd("z", f64::NAN, "m").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(store.is_empty().await);

        let err = store.zincrby("z", f64::NAN, "m").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_zincrby_to_nan_leaves_score() {
        let store = MemoryStore::new();
        store.zadd("z", f64::INFINITY, "m").await.unwrap();

        let err = store.zincrby("z", f64::NEG_INFINITY, "m").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert_eq!(store.zincrby("z", 1.0, "m").await.unwrap(), f64::INFINITY);
    }
}
