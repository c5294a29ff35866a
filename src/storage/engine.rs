//! Thread-Safe Storage Engine with Lazy Expiry
//!
//! Every key maps to one [`Entry`]: a tagged [`Value`] (string, list or sorted
//! set) plus an optional absolute expiry instant.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐            │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │            │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │            │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │            │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A key always hashes to the same shard, so all writes to one key are
//! serialized by that shard's lock and a reader can never observe a
//! half-applied mutation. Operations on keys in different shards proceed in
//! parallel. There is no atomicity across keys.
//!
//! Entries never leave the engine by reference: readers get clones, and typed
//! operations run a closure against the entry while the shard lock is held.
//!
//! ## Expiry
//!
//! An entry whose expiry instant has passed is treated as absent by every
//! operation and is removed the first time it is touched.

use crate::storage::clamp_range;
use crate::storage::sorted_set::SortedSet;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

/// Number of shards for the storage engine.
const NUM_SHARDS: usize = 64;

/// Errors surfaced by typed accessors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The key holds a value of a different type than the operation expects
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The payload stored under a key. Exactly one kind at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    SortedSet(SortedSet),
}

impl Value {
    /// The name reported by `TYPE`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::SortedSet(_) => "zset",
        }
    }

    /// Collections that become empty are deleted rather than kept around.
    fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(list) => list.is_empty(),
            Value::SortedSet(set) => set.is_empty(),
        }
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::String(value)
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::String(Bytes::from_static(value.as_bytes()))
    }
}

impl From<VecDeque<Bytes>> for Value {
    fn from(value: VecDeque<Bytes>) -> Self {
        Value::List(value)
    }
}

impl From<SortedSet> for Value {
    fn from(value: SortedSet) -> Self {
        Value::SortedSet(value)
    }
}

/// A stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Expires after `ttl`. A TTL too large to represent never expires.
    pub fn with_ttl(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    pub fn with_deadline(value: Value, deadline: Instant) -> Self {
        Self {
            value,
            expires_at: Some(deadline),
        }
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() >= exp)
            .unwrap_or(false)
    }
}

type Shard = RwLock<HashMap<Bytes, Entry>>;

fn read_shard(shard: &Shard) -> RwLockReadGuard<'_, HashMap<Bytes, Entry>> {
    shard.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_shard(shard: &Shard) -> RwLockWriteGuard<'_, HashMap<Bytes, Entry>> {
    shard.write().unwrap_or_else(PoisonError::into_inner)
}

/// The shared key space.
///
/// Constructed once by the server and handed to every connection through an
/// `Arc`; there is no global instance.
///
/// # Example
///
/// ```
/// use coralkv::storage::{StorageEngine, StorageError, Value};
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
/// engine.set(Bytes::from("name"), Value::from("coral"));
///
/// let entry = engine.get(b"name").unwrap();
/// assert_eq!(entry.value, Value::from("coral"));
///
/// // Typed accessors refuse to coerce between kinds
/// assert_eq!(engine.llen(b"name"), Err(StorageError::WrongType));
/// assert_eq!(engine.llen(b"missing"), Ok(0));
/// ```
pub struct StorageEngine {
    shards: Vec<Shard>,
    get_count: AtomicU64,
    set_count: AtomicU64,
    del_count: AtomicU64,
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("keys", &self.len())
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    pub fn new() -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| RwLock::new(HashMap::new())).collect(),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % NUM_SHARDS]
    }

    /// Runs `f` against the live entry for `key`, if there is one.
    ///
    /// Takes the read lock on the fast path and only upgrades to the write
    /// lock to drop an entry that turned out to be expired.
    fn view<R>(&self, key: &[u8], f: impl FnOnce(&Entry) -> R) -> Option<R> {
        let shard = self.shard(key);
        {
            let data = read_shard(shard);
            match data.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired() => return Some(f(entry)),
                Some(_) => {}
            }
        }

        let mut data = write_shard(shard);
        if data.get(key).is_some_and(Entry::is_expired) {
            data.remove(key);
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            trace!(key = ?key, "lazily expired key");
        }
        None
    }

    /// Runs `f` with exclusive access to the slot for `key`.
    ///
    /// The slot is `None` when the key is absent or expired. Whatever `f`
    /// leaves in the slot is written back; an emptied list or sorted set is
    /// deleted.
    fn update<R>(&self, key: &Bytes, f: impl FnOnce(&mut Option<Entry>) -> R) -> R {
        let mut data = write_shard(self.shard(key));

        let mut slot = data.remove(key);
        if slot.as_ref().is_some_and(Entry::is_expired) {
            slot = None;
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            trace!(key = ?key, "lazily expired key");
        }

        let result = f(&mut slot);

        if let Some(entry) = slot {
            if !entry.value.is_empty_collection() {
                data.insert(key.clone(), entry);
            }
        }
        result
    }

    // ========================================================================
    // Generic key operations
    // ========================================================================

    /// Returns a copy of the live entry for `key`.
    ///
    /// An expired entry is removed as a side effect, so a later `get` keeps
    /// reporting absence until the key is written again.
    pub fn get(&self, key: &[u8]) -> Option<Entry> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        self.view(key, Entry::clone)
    }

    /// Stores `value` under `key` with no expiry, replacing any previous
    /// entry whatever its type.
    ///
    /// Returns `true` if the key did not hold a live value before.
    pub fn set(&self, key: Bytes, value: impl Into<Value>) -> bool {
        self.insert(key, Entry::new(value.into()))
    }

    /// Like [`set`](Self::set), expiring the key after `ttl`.
    pub fn set_with_ttl(&self, key: Bytes, value: impl Into<Value>, ttl: Duration) -> bool {
        self.insert(key, Entry::with_ttl(value.into(), ttl))
    }

    /// Like [`set`](Self::set), expiring the key at `deadline`.
    pub fn set_with_deadline(&self, key: Bytes, value: impl Into<Value>, deadline: Instant) -> bool {
        self.insert(key, Entry::with_deadline(value.into(), deadline))
    }

    fn insert(&self, key: Bytes, entry: Entry) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);
        let mut data = write_shard(self.shard(&key));
        match data.insert(key, entry) {
            Some(previous) => previous.is_expired(),
            None => true,
        }
    }

    /// Removes `key`. Returns whether a live entry was present.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.del_count.fetch_add(1, Ordering::Relaxed);
        let mut data = write_shard(self.shard(key));
        match data.remove(key) {
            Some(entry) if entry.is_expired() => {
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn delete_many(&self, keys: &[Bytes]) -> u64 {
        keys.iter().filter(|key| self.delete(key)).count() as u64
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.view(key, |_| ()).is_some()
    }

    pub fn exists_many(&self, keys: &[Bytes]) -> u64 {
        keys.iter().filter(|key| self.exists(key)).count() as u64
    }

    /// Returns the type of a key: "string", "list", "zset" or "none".
    pub fn key_type(&self, key: &[u8]) -> &'static str {
        self.view(key, |entry| entry.value.type_name())
            .unwrap_or("none")
    }

    // ========================================================================
    // String operations
    // ========================================================================

    pub fn get_string(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        self.get_count.fetch_add(1, Ordering::Relaxed);
        self.view(key, |entry| match &entry.value {
            Value::String(data) => Ok(data.clone()),
            _ => Err(StorageError::WrongType),
        })
        .transpose()
    }

    // ========================================================================
    // List operations
    // ========================================================================

    /// Returns the length of a list, 0 if the key does not exist.
    pub fn llen(&self, key: &[u8]) -> StorageResult<usize> {
        self.view(key, |entry| match &entry.value {
            Value::List(list) => Ok(list.len()),
            _ => Err(StorageError::WrongType),
        })
        .unwrap_or(Ok(0))
    }

    /// Pushes values to the head of a list, creating it if needed.
    ///
    /// `LPUSH key a b c` leaves the list as `[c, b, a]`. Returns the new
    /// length.
    pub fn lpush(&self, key: &Bytes, values: Vec<Bytes>) -> StorageResult<usize> {
        self.push(key, values, VecDeque::push_front)
    }

    /// Pushes values to the tail of a list, creating it if needed.
    pub fn rpush(&self, key: &Bytes, values: Vec<Bytes>) -> StorageResult<usize> {
        self.push(key, values, VecDeque::push_back)
    }

    fn push(
        &self,
        key: &Bytes,
        values: Vec<Bytes>,
        push: fn(&mut VecDeque<Bytes>, Bytes),
    ) -> StorageResult<usize> {
        self.update(key, |slot| {
            let entry = slot.get_or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
            match &mut entry.value {
                Value::List(list) => {
                    for value in values {
                        push(list, value);
                    }
                    Ok(list.len())
                }
                _ => Err(StorageError::WrongType),
            }
        })
    }

    /// Removes and returns the head of a list.
    pub fn lpop(&self, key: &Bytes) -> StorageResult<Option<Bytes>> {
        self.update(key, |slot| match slot {
            None => Ok(None),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(list.pop_front()),
            Some(_) => Err(StorageError::WrongType),
        })
    }

    /// Returns the elements between `start` and `stop`, both inclusive.
    /// Negative indexes count from the tail.
    pub fn lrange(&self, key: &[u8], start: i64, stop: i64) -> StorageResult<Vec<Bytes>> {
        self.view(key, |entry| match &entry.value {
            Value::List(list) => Ok(match clamp_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            _ => Err(StorageError::WrongType),
        })
        .unwrap_or_else(|| Ok(Vec::new()))
    }

    // ========================================================================
    // Sorted set operations
    // ========================================================================

    /// Adds or updates members. Returns how many members were newly added.
    pub fn zadd(&self, key: &Bytes, members: Vec<(f64, Bytes)>) -> StorageResult<usize> {
        self.update(key, |slot| {
            let entry =
                slot.get_or_insert_with(|| Entry::new(Value::SortedSet(SortedSet::new())));
            match &mut entry.value {
                Value::SortedSet(set) => Ok(members
                    .into_iter()
                    .filter(|(score, member)| set.set_score(member.clone(), *score))
                    .count()),
                _ => Err(StorageError::WrongType),
            }
        })
    }

    pub fn zscore(&self, key: &[u8], member: &[u8]) -> StorageResult<Option<f64>> {
        self.with_sorted_set(key, |set| set.score(member))
            .map(Option::flatten)
    }

    pub fn zrank(&self, key: &[u8], member: &[u8]) -> StorageResult<Option<usize>> {
        self.with_sorted_set(key, |set| set.rank(member))
            .map(Option::flatten)
    }

    pub fn zcard(&self, key: &[u8]) -> StorageResult<usize> {
        self.with_sorted_set(key, SortedSet::len)
            .map(|len| len.unwrap_or(0))
    }

    pub fn zrange(&self, key: &[u8], start: i64, stop: i64) -> StorageResult<Vec<(Bytes, f64)>> {
        self.with_sorted_set(key, |set| set.range(start, stop))
            .map(Option::unwrap_or_default)
    }

    /// Removes members. Returns how many were present.
    pub fn zrem(&self, key: &Bytes, members: &[Bytes]) -> StorageResult<usize> {
        self.update(key, |slot| match slot {
            None => Ok(0),
            Some(Entry {
                value: Value::SortedSet(set),
                ..
            }) => Ok(members.iter().filter(|member| set.remove(member)).count()),
            Some(_) => Err(StorageError::WrongType),
        })
    }

    /// Read-only access to a sorted set. `Ok(None)` when the key is absent.
    fn with_sorted_set<R>(
        &self,
        key: &[u8],
        f: impl FnOnce(&SortedSet) -> R,
    ) -> StorageResult<Option<R>> {
        self.view(key, |entry| match &entry.value {
            Value::SortedSet(set) => Ok(f(set)),
            _ => Err(StorageError::WrongType),
        })
        .transpose()
    }

    // ========================================================================
    // Server-level operations
    // ========================================================================

    pub fn flush(&self) {
        for shard in &self.shards {
            write_shard(shard).clear();
        }
    }

    /// Number of stored keys, including expired keys not yet reclaimed.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| read_shard(shard).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len() as u64,
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub get_ops: u64,
    pub set_ops: u64,
    pub del_ops: u64,
    /// Expired keys reclaimed lazily
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn list(items: &[&'static str]) -> Value {
        Value::List(items.iter().map(|s| Bytes::from_static(s.as_bytes())).collect())
    }

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();
        assert!(engine.set(Bytes::from("foo"), "bar"));
        assert_eq!(engine.get(b"foo").unwrap().value, Value::from("bar"));
        assert!(engine.get(b"nope").is_none());
    }

    #[test]
    fn test_set_overwrites_any_type() {
        let engine = StorageEngine::new();
        let key = Bytes::from("k");
        engine.rpush(&key, vec![Bytes::from("a")]).unwrap();
        assert!(!engine.set(key.clone(), "plain"));
        assert_eq!(engine.key_type(b"k"), "string");
        assert_eq!(engine.llen(b"k"), Err(StorageError::WrongType));
    }

    #[test]
    fn test_each_tag_round_trips() {
        let engine = StorageEngine::new();
        let mut set = SortedSet::new();
        set.set_score(Bytes::from("alice"), 3.5);

        let values = [
            Value::from("text"),
            list(&["a", "b"]),
            Value::SortedSet(set),
        ];
        for (i, value) in values.into_iter().enumerate() {
            let key = Bytes::from(format!("key{}", i));
            engine.set(key.clone(), value.clone());
            assert_eq!(engine.get(&key).unwrap().value, value);
        }
    }

    #[test]
    fn test_delete() {
        let engine = StorageEngine::new();
        engine.set(Bytes::from("key"), "value");
        assert!(engine.delete(b"key"));
        assert!(!engine.delete(b"key"));
        assert!(engine.get(b"key").is_none());
    }

    #[test]
    fn test_lazy_expiry() {
        let engine = StorageEngine::new();
        engine.set_with_ttl(Bytes::from("temp"), "value", Duration::from_millis(50));
        assert!(engine.get(b"temp").is_some());

        thread::sleep(Duration::from_millis(80));

        assert_eq!(engine.len(), 1, "entry stays until touched");
        assert!(engine.get(b"temp").is_none());
        assert_eq!(engine.len(), 0, "get removes the expired entry");
        assert!(engine.get(b"temp").is_none());
        assert_eq!(engine.stats().expired, 1);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let engine = StorageEngine::new();
        engine.set_with_ttl(Bytes::from("forever"), "value", Duration::MAX);
        let entry = engine.get(b"forever").unwrap();
        assert_eq!(entry.value, Value::from("value"));
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_set_with_deadline() {
        let engine = StorageEngine::new();
        let deadline = Instant::now() + Duration::from_millis(20);
        engine.set_with_deadline(Bytes::from("soon"), "value", deadline);
        assert!(engine.exists(b"soon"));

        thread::sleep(Duration::from_millis(40));
        assert!(!engine.exists(b"soon"));
    }

    #[test]
    fn test_expired_key_is_absent_for_every_accessor() {
        let engine = StorageEngine::new();
        let key = Bytes::from("gone");
        engine.set_with_ttl(key.clone(), list(&["a"]), Duration::from_millis(10));
        thread::sleep(Duration::from_millis(30));

        assert_eq!(engine.llen(&key), Ok(0));
        assert!(!engine.exists(&key));
        assert!(!engine.delete(&key));
        assert_eq!(engine.rpush(&key, vec![Bytes::from("x")]), Ok(1));
    }

    #[test]
    fn test_list_operations() {
        let engine = StorageEngine::new();
        let key = Bytes::from("list");

        assert_eq!(engine.rpush(&key, vec![Bytes::from("b"), Bytes::from("c")]), Ok(2));
        assert_eq!(engine.lpush(&key, vec![Bytes::from("a")]), Ok(3));
        assert_eq!(engine.llen(&key), Ok(3));
        assert_eq!(
            engine.lrange(&key, 0, -1).unwrap(),
            vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]
        );
        assert_eq!(engine.lrange(&key, -2, 10).unwrap().len(), 2);
        assert_eq!(engine.lpop(&key), Ok(Some(Bytes::from("a"))));
    }

    #[test]
    fn test_emptied_list_is_deleted() {
        let engine = StorageEngine::new();
        let key = Bytes::from("list");
        engine.rpush(&key, vec![Bytes::from("only")]).unwrap();
        assert_eq!(engine.lpop(&key), Ok(Some(Bytes::from("only"))));
        assert_eq!(engine.key_type(&key), "none");
        assert_eq!(engine.lpop(&key), Ok(None));
    }

    #[test]
    fn test_wrong_type_leaves_value_untouched() {
        let engine = StorageEngine::new();
        let key = Bytes::from("str");
        engine.set(key.clone(), "value");

        assert_eq!(engine.lpush(&key, vec![Bytes::from("x")]), Err(StorageError::WrongType));
        assert_eq!(engine.zadd(&key, vec![(1.0, Bytes::from("m"))]), Err(StorageError::WrongType));
        assert_eq!(engine.zscore(&key, b"m"), Err(StorageError::WrongType));
        assert_eq!(engine.get_string(&key), Ok(Some(Bytes::from("value"))));
    }

    #[test]
    fn test_sorted_set_operations() {
        let engine = StorageEngine::new();
        let key = Bytes::from("zkey");

        assert_eq!(engine.zscore(&key, b"alice"), Ok(None));
        assert_eq!(
            engine.zadd(&key, vec![(3.5, Bytes::from("alice")), (1.0, Bytes::from("bob"))]),
            Ok(2)
        );
        assert_eq!(engine.zadd(&key, vec![(0.5, Bytes::from("alice"))]), Ok(0));
        assert_eq!(engine.zscore(&key, b"alice"), Ok(Some(0.5)));
        assert_eq!(engine.zrank(&key, b"bob"), Ok(Some(1)));
        assert_eq!(engine.zcard(&key), Ok(2));

        assert_eq!(engine.zrem(&key, &[Bytes::from("alice"), Bytes::from("nobody")]), Ok(1));
        assert_eq!(engine.zrange(&key, 0, -1).unwrap(), vec![(Bytes::from("bob"), 1.0)]);
        assert_eq!(engine.zrem(&key, &[Bytes::from("bob")]), Ok(1));
        assert_eq!(engine.key_type(&key), "none");
    }

    #[test]
    fn test_concurrent_pushes_are_not_lost() {
        let engine = Arc::new(StorageEngine::new());
        let key = Bytes::from("shared");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let key = key.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        engine.rpush(&key, vec![Bytes::from(i.to_string())]).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.llen(&key), Ok(2000));
    }

    #[test]
    fn test_concurrent_access_to_distinct_keys() {
        let engine = Arc::new(StorageEngine::new());

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for j in 0..100 {
                        let key = Bytes::from(format!("key-{}-{}", i, j));
                        engine.set(key.clone(), "value");
                        assert!(engine.get(&key).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 1000);
    }

    #[test]
    fn test_flush() {
        let engine = StorageEngine::new();
        engine.set(Bytes::from("a"), "1");
        engine.set(Bytes::from("b"), "2");
        engine.flush();
        assert!(engine.is_empty());
    }
}
