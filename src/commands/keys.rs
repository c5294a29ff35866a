//! Keyspace commands that work on any value type.

use super::{Arity, CommandResult, Context, Handler};
use crate::protocol::RespValue;
use bytes::Bytes;

/// DEL key [key ...]
pub struct Del;

impl Handler for Del {
    fn name(&self) -> &'static str {
        "DEL"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::integer(ctx.storage.delete_many(args) as i64))
    }
}

/// EXISTS key [key ...]
///
/// Repeated keys are counted once per occurrence.
pub struct Exists;

impl Handler for Exists {
    fn name(&self) -> &'static str {
        "EXISTS"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::integer(ctx.storage.exists_many(args) as i64))
    }
}

/// TYPE key
pub struct Type;

impl Handler for Type {
    fn name(&self) -> &'static str {
        "TYPE"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::simple_string(ctx.storage.key_type(&args[0])))
    }
}
