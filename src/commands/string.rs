//! String commands: GET, SET.

use super::{parse_i64, Arity, CommandError, CommandResult, Context, Handler};
use crate::protocol::RespValue;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// GET key
pub struct Get;

impl Handler for Get {
    fn name(&self) -> &'static str {
        "GET"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(match ctx.storage.get_string(&args[0])? {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        })
    }
}

/// SET key value [EX seconds | PX milliseconds]
pub struct Set;

impl Set {
    /// Reads the optional expiry qualifier following `key value` and turns it
    /// into an absolute deadline.
    fn parse_ttl(options: &[Bytes]) -> Result<Option<Instant>, CommandError> {
        let mut deadline = None;
        let mut i = 0;

        while i < options.len() {
            let to_duration: fn(u64) -> Duration = match options[i].to_ascii_uppercase().as_slice() {
                b"EX" => Duration::from_secs,
                b"PX" => Duration::from_millis,
                _ => return Err(CommandError::Syntax),
            };

            // One expiry qualifier at most, and it needs a value
            if deadline.is_some() || i + 1 >= options.len() {
                return Err(CommandError::Syntax);
            }

            let amount = parse_i64(&options[i + 1])?;
            if amount <= 0 {
                return Err(CommandError::InvalidExpireTime("set"));
            }
            // A deadline past what Instant can hold is rejected, not clamped
            let at = Instant::now()
                .checked_add(to_duration(amount as u64))
                .ok_or(CommandError::InvalidExpireTime("set"))?;
            deadline = Some(at);
            i += 2;
        }

        Ok(deadline)
    }
}

impl Handler for Set {
    fn name(&self) -> &'static str {
        "SET"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let key = args[0].clone();
        let value = args[1].clone();

        match Self::parse_ttl(&args[2..])? {
            Some(deadline) => ctx.storage.set_with_deadline(key, value, deadline),
            None => ctx.storage.set(key, value),
        };

        Ok(RespValue::ok())
    }
}
