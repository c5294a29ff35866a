//! RESP (Redis Serialization Protocol) Data Types
//!
//! Every reply the server produces is a [`RespValue`]. Requests arrive as
//! arrays of bulk strings and are decoded by the parser into the same type
//! before being turned into a [`Command`](crate::protocol::Command).
//!
//! ## Wire Format
//!
//! | Kind             | Prefix | Example                     |
//! |------------------|--------|-----------------------------|
//! | Simple string    | `+`    | `+OK\r\n`                   |
//! | Error            | `-`    | `-ERR syntax error\r\n`     |
//! | Integer          | `:`    | `:1000\r\n`                 |
//! | Bulk string      | `$`    | `$5\r\nhello\r\n`           |
//! | Null bulk string | `$`    | `$-1\r\n`                   |
//! | Array            | `*`    | `*1\r\n$4\r\nPING\r\n`      |
//!
//! An empty bulk string (`$0\r\n\r\n`) and the null bulk string are distinct
//! values and never collapse into one another.

use bytes::Bytes;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A single RESP value, used both for decoded requests and encoded replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non binary-safe single line string. Format: `+<string>\r\n`
    SimpleString(String),

    /// Single line error. Format: `-<message>\r\n`
    Error(String),

    /// Signed 64-bit integer. Format: `:<integer>\r\n`
    Integer(i64),

    /// Length-prefixed binary-safe string. Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// The null bulk string: `$-1\r\n`
    Null,

    /// Array of nested values. Format: `*<count>\r\n<element>...`
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates an error reply.
    ///
    /// The message is written on a single line, so it must not contain CR or
    /// LF. Passing one is a bug in the caller.
    pub fn error(s: impl Into<String>) -> Self {
        let s = s.into();
        debug_assert!(
            !s.contains('\r') && !s.contains('\n'),
            "error messages must be single-line"
        );
        RespValue::Error(s)
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a bulk string reply.
    ///
    /// # Example
    /// ```
    /// use coralkv::protocol::types::RespValue;
    /// let bulk = RespValue::bulk_string("hello");
    /// assert_eq!(bulk.serialize(), b"$5\r\nhello\r\n");
    /// ```
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    pub fn null() -> Self {
        RespValue::Null
    }

    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Acknowledges a subscribe or unsubscribe action.
    ///
    /// `count` is the number of channels the client is subscribed to after
    /// the action was applied.
    ///
    /// ```
    /// use coralkv::protocol::types::RespValue;
    /// let ack = RespValue::pubsub_ack("subscribe", "news", 1);
    /// assert_eq!(ack.serialize(), b"*3\r\n$9\r\nsubscribe\r\n$4\r\nnews\r\n:1\r\n");
    /// ```
    pub fn pubsub_ack(kind: &'static str, channel: impl Into<Bytes>, count: usize) -> Self {
        RespValue::Array(vec![
            RespValue::bulk_string(kind),
            RespValue::BulkString(channel.into()),
            RespValue::Integer(count as i64),
        ])
    }

    /// A message pushed to a subscriber: `["message", channel, payload]`.
    pub fn pubsub_message(channel: Bytes, payload: Bytes) -> Self {
        RespValue::Array(vec![
            RespValue::bulk_string("message"),
            RespValue::BulkString(channel),
            RespValue::BulkString(payload),
        ])
    }

    /// Encodes the value into a fresh buffer sized to fit.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.serialize_into(&mut buf);
        buf
    }

    /// Appends the encoded value to `buf`.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => write_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            RespValue::Error(s) => write_line(buf, prefix::ERROR, s.as_bytes()),
            RespValue::Integer(n) => write_line(buf, prefix::INTEGER, n.to_string().as_bytes()),
            RespValue::Null => write_line(buf, prefix::BULK_STRING, b"-1"),
            RespValue::BulkString(data) => {
                write_line(buf, prefix::BULK_STRING, data.len().to_string().as_bytes());
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Array(items) => {
                write_line(buf, prefix::ARRAY, items.len().to_string().as_bytes());
                items.iter().for_each(|item| item.serialize_into(buf));
            }
        }
    }

    /// Exact number of bytes [`serialize`](Self::serialize) produces.
    pub fn encoded_len(&self) -> usize {
        // prefix byte + body + CRLF
        let line = |body: usize| 1 + body + 2;
        match self {
            RespValue::SimpleString(s) | RespValue::Error(s) => line(s.len()),
            RespValue::Integer(n) => line(decimal_len(n.unsigned_abs()) + usize::from(*n < 0)),
            RespValue::Null => line(2),
            RespValue::BulkString(data) => line(decimal_len(data.len() as u64)) + data.len() + 2,
            RespValue::Array(items) => {
                line(decimal_len(items.len() as u64))
                    + items.iter().map(RespValue::encoded_len).sum::<usize>()
            }
        }
    }

    /// Short lowercase name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(_) => "bulk string",
            RespValue::Null => "null",
            RespValue::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }
}

fn write_line(buf: &mut Vec<u8>, prefix: u8, body: &[u8]) {
    buf.push(prefix);
    buf.extend_from_slice(body);
    buf.extend_from_slice(CRLF);
}

fn decimal_len(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_encoding() {
        assert_eq!(RespValue::ok().serialize(), b"+OK\r\n");
        assert_eq!(
            RespValue::error("ERR syntax error").serialize(),
            b"-ERR syntax error\r\n"
        );
        assert_eq!(RespValue::integer(-42).serialize(), b":-42\r\n");
        assert_eq!(
            RespValue::integer(i64::MIN).serialize(),
            b":-9223372036854775808\r\n"
        );
        assert_eq!(RespValue::bulk_string("bar").serialize(), b"$3\r\nbar\r\n");
    }

    #[test]
    fn test_empty_bulk_is_not_null() {
        let empty = RespValue::bulk_string(Bytes::new());
        assert_eq!(empty.serialize(), b"$0\r\n\r\n");
        assert_ne!(empty.serialize(), RespValue::null().serialize());
        assert_eq!(RespValue::null().serialize(), b"$-1\r\n");
    }

    #[test]
    fn test_pubsub_ack_serialize() {
        let value = RespValue::pubsub_ack("unsubscribe", "news", 0);
        assert_eq!(
            value.serialize(),
            b"*3\r\n$11\r\nunsubscribe\r\n$4\r\nnews\r\n:0\r\n"
        );
    }

    #[test]
    fn test_pubsub_message_serialize() {
        let value = RespValue::pubsub_message(Bytes::from("news"), Bytes::from("hello"));
        assert_eq!(
            value.serialize(),
            b"*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$5\r\nhello\r\n"
        );
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let values = [
            RespValue::null(),
            RespValue::integer(0),
            RespValue::integer(-1234),
            RespValue::integer(i64::MIN),
            RespValue::bulk_string("x".repeat(100)),
            RespValue::array(vec![]),
            RespValue::array(vec![
                RespValue::simple_string("PONG"),
                RespValue::array(vec![RespValue::integer(7), RespValue::null()]),
                RespValue::pubsub_ack("subscribe", "news", 12),
            ]),
        ];
        for value in values {
            assert_eq!(value.encoded_len(), value.serialize().len(), "{:?}", value);
        }
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(RespValue::integer(7).kind(), "integer");
        assert_eq!(RespValue::bulk_string("x").kind(), "bulk string");
        assert_eq!(RespValue::null().kind(), "null");
        assert_eq!(RespValue::array(vec![]).kind(), "array");
    }

    #[test]
    #[should_panic(expected = "single-line")]
    #[cfg(debug_assertions)]
    fn test_error_rejects_line_breaks() {
        let _ = RespValue::error("ERR bad\r\nthing");
    }
}
