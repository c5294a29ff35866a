//! Publish/Subscribe
//!
//! The registry tracks which client is subscribed to which channel and fans
//! published messages out to the subscribers' outboxes. Connections drain
//! their own outbox and write the messages to the socket.

pub mod registry;

pub use registry::{Client, ClientId, Message, PubSubRegistry, DEFAULT_OUTBOX_CAPACITY};
