//! Sorted set commands.
//!
//! Scores go out as bulk strings in their shortest round-trip decimal form
//! (see [`format_score`]).

use super::{parse_f64, parse_i64, Arity, CommandError, CommandResult, Context, Handler};
use crate::protocol::RespValue;
use crate::storage::format_score;
use bytes::Bytes;

/// ZADD key score member [score member ...]
pub struct ZAdd;

impl Handler for ZAdd {
    fn name(&self) -> &'static str {
        "ZADD"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(3)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let pairs = &args[1..];
        if pairs.len() % 2 != 0 {
            return Err(CommandError::Syntax);
        }

        // All scores are validated before the set is touched.
        let members = pairs
            .chunks_exact(2)
            .map(|pair| parse_f64(&pair[0]).map(|score| (score, pair[1].clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let added = ctx.storage.zadd(&args[0], members)?;
        Ok(RespValue::integer(added as i64))
    }
}

/// ZSCORE key member
///
/// A key holding another type reads as a missing member rather than a type
/// error.
pub struct ZScore;

impl Handler for ZScore {
    fn name(&self) -> &'static str {
        "ZSCORE"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(match ctx.storage.zscore(&args[0], &args[1]) {
            Ok(Some(score)) => RespValue::bulk_string(format_score(score)),
            Ok(None) | Err(_) => RespValue::null(),
        })
    }
}

/// ZRANK key member
pub struct ZRank;

impl Handler for ZRank {
    fn name(&self) -> &'static str {
        "ZRANK"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(match ctx.storage.zrank(&args[0], &args[1])? {
            Some(rank) => RespValue::integer(rank as i64),
            None => RespValue::null(),
        })
    }
}

/// ZRANGE key start stop [WITHSCORES]
pub struct ZRange;

impl Handler for ZRange {
    fn name(&self) -> &'static str {
        "ZRANGE"
    }

    fn arity(&self) -> Arity {
        Arity::Range(3, 4)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let with_scores = match args.get(3) {
            Some(flag) if flag.eq_ignore_ascii_case(b"WITHSCORES") => true,
            Some(_) => return Err(CommandError::Syntax),
            None => false,
        };
        let start = parse_i64(&args[1])?;
        let stop = parse_i64(&args[2])?;

        let range = ctx.storage.zrange(&args[0], start, stop)?;
        let mut items = Vec::with_capacity(if with_scores { range.len() * 2 } else { range.len() });
        for (member, score) in range {
            items.push(RespValue::bulk_string(member));
            if with_scores {
                items.push(RespValue::bulk_string(format_score(score)));
            }
        }
        Ok(RespValue::array(items))
    }
}

/// ZCARD key
pub struct ZCard;

impl Handler for ZCard {
    fn name(&self) -> &'static str {
        "ZCARD"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::integer(ctx.storage.zcard(&args[0])? as i64))
    }
}

/// ZREM key member [member ...]
pub struct ZRem;

impl Handler for ZRem {
    fn name(&self) -> &'static str {
        "ZREM"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let removed = ctx.storage.zrem(&args[0], &args[1..])?;
        Ok(RespValue::integer(removed as i64))
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::test_support::{err, Harness};
    use crate::protocol::RespValue;

    fn bulks(items: &[&'static str]) -> RespValue {
        RespValue::array(items.iter().map(|s| RespValue::bulk_string(*s)).collect())
    }

    #[test]
    fn test_zscore_before_and_after_zadd() {
        let h = Harness::new();
        assert_eq!(h.run("ZSCORE zkey alice"), RespValue::null());
        assert_eq!(h.run("ZADD zkey 3.5 alice"), RespValue::integer(1));
        assert_eq!(h.run("ZSCORE zkey alice"), RespValue::bulk_string("3.5"));
    }

    #[test]
    fn test_zadd_counts_only_new_members() {
        let h = Harness::new();
        assert_eq!(h.run("ZADD board 1 a 2 b"), RespValue::integer(2));
        assert_eq!(h.run("ZADD board 5 a 3 c"), RespValue::integer(1));
        assert_eq!(h.run("ZSCORE board a"), RespValue::bulk_string("5"));
        assert_eq!(h.run("ZCARD board"), RespValue::integer(3));
    }

    #[test]
    fn test_zadd_validates_before_writing() {
        let h = Harness::new();
        assert_eq!(err(h.run("ZADD board 1 a 2")), "ERR syntax error");
        assert_eq!(err(h.run("ZADD board 1 a x b")), "ERR value is not a valid float");
        assert_eq!(h.run("EXISTS board"), RespValue::integer(0));
    }

    #[test]
    fn test_zrange_orders_by_score_then_member() {
        let h = Harness::new();
        h.run("ZADD board 2 carol 1 bob 1 alice 0.5 dave");
        assert_eq!(
            h.run("ZRANGE board 0 -1"),
            bulks(&["dave", "alice", "bob", "carol"])
        );
        assert_eq!(
            h.run("ZRANGE board 0 1 withscores"),
            bulks(&["dave", "0.5", "alice", "1"])
        );
        assert_eq!(h.run("ZRANGE board 10 20"), bulks(&[]));
        assert_eq!(err(h.run("ZRANGE board 0 1 SCORES")), "ERR syntax error");
    }

    #[test]
    fn test_zrank() {
        let h = Harness::new();
        h.run("ZADD board 10 x 20 y");
        assert_eq!(h.run("ZRANK board y"), RespValue::integer(1));
        assert_eq!(h.run("ZRANK board nobody"), RespValue::null());
        assert_eq!(h.run("ZRANK missing x"), RespValue::null());
    }

    #[test]
    fn test_zrem_drops_empty_set() {
        let h = Harness::new();
        h.run("ZADD board 1 a 2 b");
        assert_eq!(h.run("ZREM board a nobody"), RespValue::integer(1));
        assert_eq!(h.run("ZREM board b"), RespValue::integer(1));
        assert_eq!(h.run("TYPE board"), RespValue::simple_string("none"));
    }

    #[test]
    fn test_wrong_type_handling() {
        let h = Harness::new();
        h.run("SET text hello");
        assert_eq!(h.run("ZSCORE text member"), RespValue::null());
        assert!(err(h.run("ZADD text 1 m")).starts_with("WRONGTYPE"));
        assert!(err(h.run("ZCARD text")).starts_with("WRONGTYPE"));
        assert!(err(h.run("ZRANGE text 0 -1")).starts_with("WRONGTYPE"));
        assert_eq!(h.run("GET text"), RespValue::bulk_string("hello"));
    }
}
