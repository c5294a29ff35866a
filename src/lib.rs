//! # coralkv
//!
//! An in-memory key-value server speaking the Redis serialization protocol
//! (RESP). It stores strings, lists and sorted sets, supports publish /
//! subscribe messaging and reports its replication role through `INFO`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                               coralkv                                │
//! │                                                                      │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────────────┐  │
//! │  │ TCP Server  │───>│ Connection  │───>│ CommandHandler           │  │
//! │  │ (Listener)  │    │  Handler    │    │  CommandTable + Context  │  │
//! │  └─────────────┘    └──────▲──────┘    └───────┬───────────┬──────┘  │
//! │                            │                   │           │         │
//! │                     outbox │                   ▼           ▼         │
//! │  ┌─────────────┐    ┌──────┴────────┐    ┌──────────────────────┐    │
//! │  │ RESP parser │    │ PubSubRegistry│    │    StorageEngine     │    │
//! │  │ + encoder   │    │ channels ⇄    │    │  64 RwLock shards    │    │
//! │  └─────────────┘    │ subscriptions │    │  String|List|ZSet    │    │
//! │                     └───────────────┘    └──────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use coralkv::commands::CommandHandler;
//! use coralkv::connection::{handle_connection, ConnectionStats};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let handler = CommandHandler::default();
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("127.0.0.1:6379").await?;
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await?;
//!         tokio::spawn(handle_connection(stream, addr, handler.clone(), Arc::clone(&stats)));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - Strings: `GET`, `SET key value [EX s | PX ms]`
//! - Keys: `DEL`, `EXISTS`, `TYPE`
//! - Lists: `LPUSH`, `RPUSH`, `LPOP`, `LLEN`, `LRANGE`
//! - Sorted sets: `ZADD`, `ZSCORE`, `ZRANK`, `ZRANGE [WITHSCORES]`, `ZCARD`, `ZREM`
//! - Pub/sub: `SUBSCRIBE`, `UNSUBSCRIBE`, `PUBLISH`
//! - Server: `PING`, `ECHO`, `INFO [replication]`, `QUIT`
//!
//! ## Expiry
//!
//! Keys set with a TTL expire lazily: every read or write that reaches an
//! expired entry treats it as absent and removes it. There is no background
//! sweeper.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod pubsub;
pub mod replication;
pub mod storage;

pub use commands::CommandHandler;
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{Command, ParseError, RespParser, RespValue};
pub use pubsub::PubSubRegistry;
pub use replication::{ReplicationInfo, Role};
pub use storage::StorageEngine;

/// Default port, same as Redis
pub const DEFAULT_PORT: u16 = 6379;

pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
