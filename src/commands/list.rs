//! List commands: LPUSH, RPUSH, LPOP, LLEN, LRANGE.

use super::{parse_i64, Arity, CommandResult, Context, Handler};
use crate::protocol::RespValue;
use bytes::Bytes;

/// LPUSH / RPUSH key element [element ...]
///
/// Both directions share one handler; `left` picks the end.
pub struct Push {
    left: bool,
}

impl Push {
    pub fn left() -> Self {
        Self { left: true }
    }

    pub fn right() -> Self {
        Self { left: false }
    }
}

impl Handler for Push {
    fn name(&self) -> &'static str {
        if self.left {
            "LPUSH"
        } else {
            "RPUSH"
        }
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let key = &args[0];
        let values = args[1..].to_vec();
        let len = if self.left {
            ctx.storage.lpush(key, values)?
        } else {
            ctx.storage.rpush(key, values)?
        };
        Ok(RespValue::integer(len as i64))
    }
}

/// LPOP key
pub struct LPop;

impl Handler for LPop {
    fn name(&self) -> &'static str {
        "LPOP"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(match ctx.storage.lpop(&args[0])? {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        })
    }
}

/// LLEN key
pub struct LLen;

impl Handler for LLen {
    fn name(&self) -> &'static str {
        "LLEN"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::integer(ctx.storage.llen(&args[0])? as i64))
    }
}

/// LRANGE key start stop
pub struct LRange;

impl Handler for LRange {
    fn name(&self) -> &'static str {
        "LRANGE"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(3)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let start = parse_i64(&args[1])?;
        let stop = parse_i64(&args[2])?;
        let items = ctx
            .storage
            .lrange(&args[0], start, stop)?
            .into_iter()
            .map(RespValue::bulk_string)
            .collect();
        Ok(RespValue::array(items))
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
    fn test_push_and_range() {
        let h = Harness::new();
        assert_eq!(h.run("RPUSH list a b"), RespValue::integer(2));
        assert_eq!(h.run("LPUSH list z y"), RespValue::integer(4));
        assert_eq!(h.run("LRANGE list 0 -1"), bulks(&["y", "z", "a", "b"]));
        assert_eq!(h.run("LRANGE list -2 -1"), bulks(&["a", "b"]));
        assert_eq!(h.run("LRANGE list 5 10"), bulks(&[]));
        assert_eq!(h.run("LRANGE missing 0 -1"), bulks(&[]));
    }

    #[test]
    fn test_llen() {
        let h = Harness::new();
        assert_eq!(h.run("LLEN nosuchkey"), RespValue::integer(0));
        h.run("RPUSH list a b c");
        assert_eq!(h.run("LLEN list"), RespValue::integer(3));
    }

    #[test]
    fn test_llen_wrong_type() {
        let h = Harness::new();
        h.run("SET text hello");
        assert_eq!(
            err(h.run("LLEN text")),
            "WRONGTYPE Operation against a key holding the wrong kind of value"
        );
        assert!(err(h.run("RPUSH text a")).starts_with("WRONGTYPE"));
        assert_eq!(h.run("GET text"), RespValue::bulk_string("hello"));
    }

    #[test]
    fn test_lpop_removes_empty_list() {
        let h = Harness::new();
        h.run("RPUSH list only");
        assert_eq!(h.run("LPOP list"), RespValue::bulk_string("only"));
        assert_eq!(h.run("LPOP list"), RespValue::null());
        assert_eq!(h.run("EXISTS list"), RespValue::integer(0));
    }

    #[test]
    fn test_lrange_requires_integers() {
        let h = Harness::new();
        h.run("RPUSH list a");
        assert_eq!(
            err(h.run("LRANGE list zero -1")),
            "ERR value is not an integer or out of range"
        );
    }
}
