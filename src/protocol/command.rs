//! Decoded client requests.

use crate::protocol::parser::ParseError;
use crate::protocol::types::RespValue;
use bytes::Bytes;

/// A request decoded from one RESP frame: a command name plus its
/// positional arguments.
///
/// The name keeps the client's spelling for error messages; lookups go
/// through [`Command::key`], which is upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    key: String,
    args: Vec<Bytes>,
}

impl Command {
    /// Builds a command directly, mostly useful in tests.
    pub fn new(name: impl Into<String>, args: Vec<Bytes>) -> Self {
        let name = name.into();
        Self {
            key: name.to_ascii_uppercase(),
            name,
            args,
        }
    }

    /// Converts a decoded frame into a command.
    ///
    /// The frame must be a non-empty array of bulk strings (simple strings are
    /// tolerated as well). Anything else is a framing error.
    pub fn from_frame(frame: RespValue) -> Result<Self, ParseError> {
        let items = match frame {
            RespValue::Array(items) => items,
            other => {
                return Err(ParseError::ProtocolError(format!(
                    "expected an array of bulk strings, got {}",
                    other.kind()
                )))
            }
        };

        let mut parts = items.into_iter().map(|item| match item {
            RespValue::BulkString(b) => Ok(b),
            RespValue::SimpleString(s) => Ok(Bytes::from(s)),
            other => Err(ParseError::ProtocolError(format!(
                "expected bulk string argument, got {}",
                other.kind()
            ))),
        });

        let name = match parts.next() {
            Some(name) => name?,
            None => return Err(ParseError::ProtocolError("empty command".to_string())),
        };
        let name = String::from_utf8(name.to_vec())
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
        let args = parts.collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(name, args))
    }

    /// The command name as the client sent it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The upper-cased name used for dispatch.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }
}
