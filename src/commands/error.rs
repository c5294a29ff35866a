//! Command-level errors.
//!
//! Every variant's `Display` text is the exact line sent to the client after
//! the `-` prefix. None of them close the connection.

use crate::storage::StorageError;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("ERR unknown command '{name}', with args beginning with: {args}")]
    UnknownCommand { name: String, args: String },

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    #[error("ERR value is not a valid float")]
    NotFloat,

    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(&'static str),

    #[error("ERR Can't execute '{0}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context")]
    NotAllowedWhileSubscribed(String),
}

impl CommandError {
    pub fn unknown(name: &str, args: &[Bytes]) -> Self {
        let args = args
            .iter()
            .map(|arg| format!("'{}' ", printable(arg)))
            .collect::<String>();
        CommandError::UnknownCommand {
            name: printable(name.as_bytes()),
            args,
        }
    }

    pub fn arity(name: &str) -> Self {
        CommandError::WrongNumberOfArguments(name.to_ascii_lowercase())
    }
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::WrongType => CommandError::WrongType,
        }
    }
}

/// Client-supplied text echoed in an error must stay on one line.
fn printable(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
