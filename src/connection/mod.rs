//! Client Connections
//!
//! The accept loop in `main.rs` spawns one task per socket. Each task owns a
//! [`ConnectionHandler`], which decodes frames, runs them through the shared
//! [`CommandHandler`](crate::commands::CommandHandler) and forwards pub/sub
//! messages from the client's outbox.
//!
//! ```text
//!            ┌──────────────┐
//!            │ TcpListener  │
//!            └──────┬───────┘
//!                   │ accept + spawn
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │              ConnectionHandler              │
//! │                                             │
//! │  socket ──> RespParser ──> CommandHandler   │
//! │    ▲                            │           │
//! │    └──────── replies ◄──────────┘           │
//! │    ▲                                        │
//! │    └──────── outbox ◄── PubSubRegistry      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use coralkv::commands::CommandHandler;
//! use coralkv::connection::{handle_connection, ConnectionStats};
//! use std::sync::Arc;
//!
//! let handler = CommandHandler::default();
//! let stats = Arc::new(ConnectionStats::new());
//!
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler.clone(), stats));
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
