//! Storage Engine Module
//!
//! - `engine`: the sharded, lazily-expiring key space and its typed values
//! - `sorted_set`: the score-ordered member set stored under `zset` keys
//!
//! ## Example
//!
//! ```
//! use coralkv::storage::StorageEngine;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let engine = StorageEngine::new();
//!
//! engine.zadd(&Bytes::from("board"), vec![(3.5, Bytes::from("alice"))]).unwrap();
//! assert_eq!(engine.zscore(b"board", b"alice"), Ok(Some(3.5)));
//!
//! engine.set_with_ttl(Bytes::from("session"), Bytes::from("token"), Duration::from_secs(60));
//! assert!(engine.exists(b"session"));
//! ```

pub mod engine;
pub mod sorted_set;

pub use engine::{Entry, StorageEngine, StorageError, StorageResult, StorageStats, Value};
pub use sorted_set::{format_score, SortedSet};

/// Resolves Redis-style inclusive `start..=stop` indexes against a sequence
/// of `len` items. Negative indexes count from the end.
///
/// Returns `None` when the range selects nothing.
pub(crate) fn clamp_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::clamp_range;

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp_range(5, 0, -1), Some((0, 4)));
        assert_eq!(clamp_range(5, -2, -1), Some((3, 4)));
        assert_eq!(clamp_range(5, 3, 100), Some((3, 4)));
        assert_eq!(clamp_range(5, -100, 0), Some((0, 0)));
        assert_eq!(clamp_range(5, 4, 2), None);
        assert_eq!(clamp_range(5, 9, 12), None);
        assert_eq!(clamp_range(0, 0, -1), None);
        assert_eq!(clamp_range(3, 0, -4), None);
    }
}
