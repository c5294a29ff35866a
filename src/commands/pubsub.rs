//! Pub/sub commands: SUBSCRIBE, UNSUBSCRIBE, PUBLISH.
//!
//! Subscribing only records the client in the registry. Messages reach the
//! client through its outbox, which the connection task drains alongside the
//! socket.

use super::{Arity, CommandResult, Context, Handler};
use crate::protocol::RespValue;
use bytes::Bytes;

/// SUBSCRIBE channel
pub struct Subscribe;

impl Handler for Subscribe {
    fn name(&self) -> &'static str {
        "SUBSCRIBE"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn allowed_when_subscribed(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let channel = args[0].clone();
        let count = ctx.pubsub.subscribe(ctx.client, channel.clone());
        Ok(RespValue::pubsub_ack("subscribe", channel, count))
    }
}

/// UNSUBSCRIBE channel
pub struct Unsubscribe;

impl Handler for Unsubscribe {
    fn name(&self) -> &'static str {
        "UNSUBSCRIBE"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn allowed_when_subscribed(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let count = ctx.pubsub.unsubscribe(ctx.client.id(), &args[0]);
        Ok(RespValue::pubsub_ack("unsubscribe", args[0].clone(), count))
    }
}

/// PUBLISH channel message
pub struct Publish;

impl Handler for Publish {
    fn name(&self) -> &'static str {
        "PUBLISH"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult {
        let receivers = ctx.pubsub.publish(&args[0], args[1].clone());
        Ok(RespValue::integer(receivers as i64))
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::test_support::{err, Harness};
    use crate::protocol::RespValue;
    use bytes::Bytes;

    #[test]
    fn test_subscribe_acknowledges_with_count() {
        let h = Harness::new();
        assert_eq!(h.run("SUBSCRIBE news"), RespValue::pubsub_ack("subscribe", "news", 1));
        assert_eq!(h.run("SUBSCRIBE sport"), RespValue::pubsub_ack("subscribe", "sport", 2));
        assert_eq!(h.run("SUBSCRIBE news"), RespValue::pubsub_ack("subscribe", "news", 2));
        assert_eq!(
            h.run("UNSUBSCRIBE news"),
            RespValue::pubsub_ack("unsubscribe", "news", 1)
        );
        assert_eq!(
            h.run("UNSUBSCRIBE unknown"),
            RespValue::pubsub_ack("unsubscribe", "unknown", 1)
        );
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let mut h = Harness::new();
        let (other, mut other_inbox) = h.peer();
        let (publisher, _publisher_inbox) = h.peer();

        h.run("SUBSCRIBE news");
        h.run_as(&other, "SUBSCRIBE news");

        assert_eq!(h.run_as(&publisher, "PUBLISH news hello"), RespValue::integer(2));

        for inbox in [&mut h.inbox, &mut other_inbox] {
            let message = inbox.try_recv().unwrap();
            assert_eq!(message.channel, Bytes::from("news"));
            assert_eq!(message.payload, Bytes::from("hello"));
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let h = Harness::new();
        assert_eq!(h.run("PUBLISH empty hello"), RespValue::integer(0));
    }

    #[test]
    fn test_publish_not_allowed_while_subscribed() {
        let h = Harness::new();
        h.run("SUBSCRIBE news");
        assert!(err(h.run("PUBLISH news hi")).contains("'publish'"));
    }

    #[test]
    fn test_subscribe_takes_one_channel() {
        let h = Harness::new();
        assert_eq!(
            err(h.run("SUBSCRIBE a b")),
            "ERR wrong number of arguments for 'subscribe' command"
        );
    }
}
