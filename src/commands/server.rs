//! Connection and server commands: PING, ECHO, INFO, QUIT.

use super::{Arity, CommandError, CommandResult, Context, Handler};
use crate::protocol::RespValue;
use bytes::Bytes;

/// PING [message]
pub struct Ping;

impl Handler for Ping {
    fn name(&self) -> &'static str {
        "PING"
    }

    fn arity(&self) -> Arity {
        Arity::Range(0, 1)
    }

    fn allowed_when_subscribed(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let message = args.first().cloned();

        // Subscribed clients get a push-style reply instead of a status line.
        if ctx.subscribed {
            return Ok(RespValue::array(vec![
                RespValue::bulk_string("pong"),
                RespValue::bulk_string(message.unwrap_or_default()),
            ]));
        }

        Ok(match message {
            Some(message) => RespValue::bulk_string(message),
            None => RespValue::pong(),
        })
    }
}

/// ECHO message
pub struct Echo;

impl Handler for Echo {
    fn name(&self) -> &'static str {
        "ECHO"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        Ok(RespValue::bulk_string(args[0].clone()))
    }
}

/// INFO [replication]
///
/// Only the replication section exists; it is printed as supplied by the
/// replication layer.
pub struct Info;

impl Handler for Info {
    fn name(&self) -> &'static str {
        "INFO"
    }

    fn arity(&self) -> Arity {
        Arity::Range(0, 1)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        if let Some(section) = args.first() {
            if !section.eq_ignore_ascii_case(b"replication") {
                return Err(CommandError::Syntax);
            }
        }
        Ok(RespValue::bulk_string(ctx.replication.status()))
    }
}

/// QUIT. The connection closes itself after sending the reply.
pub struct Quit;

impl Handler for Quit {
    fn name(&self) -> &'static str {
        "QUIT"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(0)
    }

    fn allowed_when_subscribed(&self) -> bool {
        true
    }

    fn execute(&self, _ctx: &Context<'_>, _args: &[Bytes]) -> CommandResult {
        Ok(RespValue::ok())
    }
}
