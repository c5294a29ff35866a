//! Channel Subscription Registry
//!
//! ```text
//!   channels:      "news"   -> { client 1 -> outbox, client 7 -> outbox }
//!                  "sports" -> { client 7 -> outbox }
//!   subscriptions: client 1 -> { "news" }
//!                  client 7 -> { "news", "sports" }
//! ```
//!
//! Both maps live behind one `RwLock` and are always updated together, so a
//! client's subscription count is exactly the number of channels that list
//! it. `publish` only takes the read lock, so publishers run in parallel and
//! are held up only while a (un)subscribe is being applied.
//!
//! ## Delivery
//!
//! Each client owns a bounded outbox (`tokio::sync::mpsc`). `publish` uses
//! `try_send` and never waits: when a subscriber's outbox is full the message
//! is dropped for that subscriber only. Messages on one channel reach each
//! subscriber in publish order because a single outbox is FIFO.

use crate::protocol::RespValue;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default outbox capacity per client.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 1024;

/// Identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message published on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: Bytes,
    pub payload: Bytes,
}

impl Message {
    /// The push frame sent to subscribers: `["message", channel, payload]`.
    pub fn to_resp(&self) -> RespValue {
        RespValue::pubsub_message(self.channel.clone(), self.payload.clone())
    }
}

/// A connection as seen by the registry: its id and its outbox.
#[derive(Debug, Clone)]
pub struct Client {
    id: ClientId,
    outbox: mpsc::Sender<Message>,
}

impl Client {
    /// Creates a client with a fresh outbox holding at most `capacity`
    /// undelivered messages.
    pub fn new(id: ClientId, capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (outbox, inbox) = mpsc::channel(capacity.max(1));
        (Self { id, outbox }, inbox)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }
}

#[derive(Debug, Default)]
struct Inner {
    channels: HashMap<Bytes, HashMap<ClientId, mpsc::Sender<Message>>>,
    subscriptions: HashMap<ClientId, HashSet<Bytes>>,
}

impl Inner {
    fn count(&self, id: ClientId) -> usize {
        self.subscriptions.get(&id).map_or(0, HashSet::len)
    }
}

/// Registry of channel subscriptions shared by all connections.
///
/// ```
/// use coralkv::pubsub::PubSubRegistry;
/// use bytes::Bytes;
///
/// let registry = PubSubRegistry::new();
/// let (client, mut inbox) = registry.connect();
///
/// assert_eq!(registry.subscribe(&client, Bytes::from("news")), 1);
/// assert_eq!(registry.publish(b"news", Bytes::from("hello")), 1);
/// assert_eq!(inbox.try_recv().unwrap().payload, Bytes::from("hello"));
///
/// registry.disconnect(client.id());
/// assert_eq!(registry.publish(b"news", Bytes::from("again")), 0);
/// ```
#[derive(Debug)]
pub struct PubSubRegistry {
    inner: RwLock<Inner>,
    next_id: AtomicU64,
    outbox_capacity: usize,
    dropped: AtomicU64,
}

impl Default for PubSubRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PubSubRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }

    /// Creates a registry whose clients get outboxes of `outbox_capacity`.
    pub fn with_capacity(outbox_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicU64::new(1),
            outbox_capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Allocates a new client identity and its outbox.
    pub fn connect(&self) -> (Client, mpsc::Receiver<Message>) {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Client::new(id, self.outbox_capacity)
    }

    /// Subscribes `client` to `channel`.
    ///
    /// Returns the number of distinct channels the client is subscribed to
    /// afterwards. Subscribing twice to the same channel changes nothing.
    pub fn subscribe(&self, client: &Client, channel: Bytes) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        inner
            .channels
            .entry(channel.clone())
            .or_default()
            .entry(client.id)
            .or_insert_with(|| client.outbox.clone());

        let channels = inner.subscriptions.entry(client.id).or_default();
        if channels.insert(channel) {
            debug!(client = %client.id, count = channels.len(), "subscribed");
        }
        channels.len()
    }

    /// Removes `client` from `channel` if it was subscribed.
    ///
    /// Returns the client's remaining subscription count.
    pub fn unsubscribe(&self, client: ClientId, channel: &[u8]) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(subscribers) = inner.channels.get_mut(channel) {
            subscribers.remove(&client);
            if subscribers.is_empty() {
                inner.channels.remove(channel);
            }
        }

        if let Some(channels) = inner.subscriptions.get_mut(&client) {
            channels.remove(channel);
            if channels.is_empty() {
                inner.subscriptions.remove(&client);
            }
        }

        inner.count(client)
    }

    /// Delivers `payload` to every client subscribed to `channel` right now.
    ///
    /// Returns how many subscribers accepted the message. A subscriber whose
    /// outbox is full or closed is skipped and not counted.
    pub fn publish(&self, channel: &[u8], payload: Bytes) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        let Some(subscribers) = inner.channels.get(channel) else {
            return 0;
        };

        let message = Message {
            channel: Bytes::copy_from_slice(channel),
            payload,
        };

        let mut delivered = 0;
        for (id, outbox) in subscribers {
            match outbox.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(client = %id, "subscriber outbox full, dropping message");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(client = %id, "subscriber outbox closed");
                }
            }
        }
        delivered
    }

    /// Removes every subscription held by `client`.
    ///
    /// Once this returns, no later `publish` can reach the client. Returns the
    /// number of channels it was removed from.
    pub fn disconnect(&self, client: ClientId) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let Some(channels) = inner.subscriptions.remove(&client) else {
            return 0;
        };

        for channel in &channels {
            if let Some(subscribers) = inner.channels.get_mut(channel) {
                subscribers.remove(&client);
                if subscribers.is_empty() {
                    inner.channels.remove(channel);
                }
            }
        }
        channels.len()
    }

    /// Number of distinct channels `client` is subscribed to.
    pub fn subscription_count(&self, client: ClientId) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .count(client)
    }

    /// Number of channels with at least one subscriber.
    pub fn channel_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .channels
            .len()
    }

    /// Messages dropped because a subscriber's outbox was full.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
