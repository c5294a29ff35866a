//! Command Execution
//!
//! Decoded requests are looked up by name in a [`CommandTable`] built once at
//! startup. Each entry is a stateless [`Handler`] declaring its arity; the
//! table validates arity before the handler runs, and the handler validates
//! types and qualifiers before it mutates anything. Every path ends in exactly
//! one reply, and a command that replies with an error has changed nothing.
//!
//! ```text
//! Command ──> lookup ──> arity ──> subscribed-mode ──> Handler::execute ──> RespValue
//!               │          │             │                    │
//!               └──────────┴─────────────┴────── CommandError ┘──> -ERR ... reply
//! ```
//!
//! Handlers receive everything they touch through [`Context`]: the storage
//! engine, the pub/sub registry, the replication status and the calling
//! client.

pub mod error;
pub mod keys;
pub mod list;
pub mod pubsub;
pub mod server;
pub mod sorted_set;
pub mod string;

pub use error::CommandError;

use crate::protocol::{Command, RespValue};
use crate::pubsub::{Client, PubSubRegistry};
use crate::replication::ReplicationInfo;
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

pub type CommandResult = Result<RespValue, CommandError>;

/// Number of arguments a command accepts, not counting the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == expected,
            Arity::AtLeast(min) => n >= min,
            Arity::Range(min, max) => (min..=max).contains(&n),
        }
    }
}

/// Shared state a handler may read or mutate.
pub struct Context<'a> {
    pub storage: &'a StorageEngine,
    pub pubsub: &'a PubSubRegistry,
    pub replication: &'a ReplicationInfo,
    pub client: &'a Client,
    /// The client holds at least one subscription.
    pub subscribed: bool,
}

/// One command. Implementations hold no state of their own.
pub trait Handler: Send + Sync {
    /// Upper-case name used for lookup.
    fn name(&self) -> &'static str;

    fn arity(&self) -> Arity;

    /// Whether the command may run while the client is subscribed.
    fn allowed_when_subscribed(&self) -> bool {
        false
    }

    fn execute(&self, ctx: &Context<'_>, args: &[Bytes]) -> CommandResult;
}

/// Name to handler mapping.
pub struct CommandTable {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("CommandTable").field("commands", &names).finish()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTable {
    /// Builds the table with every supported command.
    pub fn new() -> Self {
        let mut table = Self::empty();

        table.register(server::Ping);
        table.register(server::Echo);
        table.register(server::Info);
        table.register(server::Quit);

        table.register(string::Get);
        table.register(string::Set);

        table.register(keys::Del);
        table.register(keys::Exists);
        table.register(keys::Type);

        table.register(list::Push::left());
        table.register(list::Push::right());
        table.register(list::LPop);
        table.register(list::LLen);
        table.register(list::LRange);

        table.register(sorted_set::ZAdd);
        table.register(sorted_set::ZScore);
        table.register(sorted_set::ZRank);
        table.register(sorted_set::ZRange);
        table.register(sorted_set::ZCard);
        table.register(sorted_set::ZRem);

        table.register(pubsub::Subscribe);
        table.register(pubsub::Unsubscribe);
        table.register(pubsub::Publish);

        table
    }

    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: impl Handler + 'static) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Handler> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Validates and runs `command`, turning any failure into an error reply.
    pub fn execute(&self, ctx: &Context<'_>, command: &Command) -> RespValue {
        match self.try_execute(ctx, command) {
            Ok(reply) => reply,
            Err(err) => {
                trace!(client = %ctx.client.id(), command = command.name(), error = %err, "command failed");
                RespValue::error(err.to_string())
            }
        }
    }

    fn try_execute(&self, ctx: &Context<'_>, command: &Command) -> CommandResult {
        let handler = self
            .get(command.key())
            .ok_or_else(|| CommandError::unknown(command.name(), command.args()))?;

        if !handler.arity().accepts(command.args().len()) {
            return Err(CommandError::arity(handler.name()));
        }

        if ctx.subscribed && !handler.allowed_when_subscribed() {
            return Err(CommandError::NotAllowedWhileSubscribed(
                handler.name().to_ascii_lowercase(),
            ));
        }

        handler.execute(ctx, command.args())
    }
}

/// Per-connection front end over the shared state.
///
/// Cloning is cheap; every connection gets its own copy.
///
/// ```
/// use coralkv::commands::CommandHandler;
/// use coralkv::protocol::{Command, RespValue};
/// use bytes::Bytes;
///
/// let handler = CommandHandler::default();
/// let (client, _inbox) = handler.pubsub().connect();
///
/// let set = Command::new("SET", vec![Bytes::from("foo"), Bytes::from("bar")]);
/// assert_eq!(handler.execute(&client, &set), RespValue::ok());
///
/// let get = Command::new("GET", vec![Bytes::from("foo")]);
/// assert_eq!(handler.execute(&client, &get), RespValue::bulk_string("bar"));
/// ```
#[derive(Debug, Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
    pubsub: Arc<PubSubRegistry>,
    replication: Arc<ReplicationInfo>,
    table: Arc<CommandTable>,
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new(
            Arc::new(StorageEngine::new()),
            Arc::new(PubSubRegistry::new()),
            Arc::new(ReplicationInfo::default()),
        )
    }
}

impl CommandHandler {
    pub fn new(
        storage: Arc<StorageEngine>,
        pubsub: Arc<PubSubRegistry>,
        replication: Arc<ReplicationInfo>,
    ) -> Self {
        Self {
            storage,
            pubsub,
            replication,
            table: Arc::new(CommandTable::new()),
        }
    }

    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    pub fn pubsub(&self) -> &Arc<PubSubRegistry> {
        &self.pubsub
    }

    pub fn replication(&self) -> &Arc<ReplicationInfo> {
        &self.replication
    }

    /// Executes one command on behalf of `client`.
    pub fn execute(&self, client: &Client, command: &Command) -> RespValue {
        let ctx = Context {
            storage: &self.storage,
            pubsub: &self.pubsub,
            replication: &self.replication,
            client,
            subscribed: self.pubsub.subscription_count(client.id()) > 0,
        };
        self.table.execute(&ctx, command)
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

pub(crate) fn parse_i64(arg: &[u8]) -> Result<i64, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::NotInteger)
}

/// Parses a score. Accepts `inf`, `+inf` and `-inf`; rejects NaN.
pub(crate) fn parse_f64(arg: &[u8]) -> Result<f64, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|f| !f.is_nan())
        .ok_or(CommandError::NotFloat)
}
