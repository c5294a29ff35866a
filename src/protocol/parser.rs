//! Incremental RESP Parser
//!
//! The parser works on whatever bytes the connection has buffered so far and
//! returns one of:
//! - `Ok(Some((value, consumed)))`: a complete value, `consumed` bytes used
//! - `Ok(None)`: the frame is incomplete, read more and try again
//! - `Err(ParseError)`: the bytes can never form a valid frame
//!
//! A frame split across several reads therefore never produces an error; the
//! caller simply keeps appending to its buffer until a frame is complete.
//! Errors are fatal to the connection because the stream position of the
//! next frame is unknown once framing is broken.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during RESP parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A length, count or integer field is not a decimal number
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a simple string, error or inline command
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1 for null)
    #[error("invalid multibulk length: {0}")]
    InvalidArrayLength(i64),

    /// Framing violation (missing CRLF, bad command shape, ...)
    #[error("{0}")]
    ProtocolError(String),

    /// A bulk string exceeds the maximum allowed size
    #[error("bulk string too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth
pub const MAX_NESTING_DEPTH: usize = 32;

/// A reusable RESP parser.
///
/// # Example
///
/// ```
/// use coralkv::protocol::{RespParser, RespValue};
///
/// let mut parser = RespParser::new();
/// let frame = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
///
/// // Half a frame is not an error, just not ready yet
/// assert!(parser.parse(&frame[..10]).unwrap().is_none());
///
/// let (value, consumed) = parser.parse(frame).unwrap().unwrap();
/// assert_eq!(consumed, frame.len());
/// assert!(matches!(value, RespValue::Array(ref items) if items.len() == 2));
/// ```
#[derive(Debug, Default)]
pub struct RespParser {
    depth: usize,
}

impl RespParser {
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Attempts to parse one RESP value from the front of `buf`.
    ///
    /// Blank lines ahead of the value are skipped and counted in `consumed`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.depth = 0;
        let skipped = blank_lines_len(buf);
        Ok(self
            .parse_value(&buf[skipped..])?
            .map(|(value, consumed)| (value, skipped + consumed)))
    }

    fn parse_value(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match buf[0] {
            prefix::SIMPLE_STRING => Ok(parse_line(buf)?
                .map(|(line, consumed)| (RespValue::SimpleString(line.to_string()), consumed))),
            prefix::ERROR => Ok(parse_line(buf)?
                .map(|(line, consumed)| (RespValue::Error(line.to_string()), consumed))),
            prefix::INTEGER => self.parse_integer(buf),
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf),
            _ => self.parse_inline(buf),
        }
    }

    /// Parses an integer: `:<integer>\r\n`
    fn parse_integer(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        match parse_line(buf)? {
            Some((line, consumed)) => {
                let n: i64 = line
                    .parse()
                    .map_err(|_| ParseError::InvalidInteger(line.to_string()))?;
                Ok(Some((RespValue::Integer(n), consumed)))
            }
            None => Ok(None),
        }
    }

    /// Parses a bulk string: `$<length>\r\n<data>\r\n`
    fn parse_bulk_string(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let (length, header_len) = match parse_length(buf)? {
            Some(parsed) => parsed,
            None => return Ok(None),
        };

        if length == -1 {
            return Ok(Some((RespValue::Null, header_len)));
        }
        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;
        if length > MAX_BULK_SIZE {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            });
        }

        let total_needed = header_len + length + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[header_len + length..total_needed] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[header_len..header_len + length]);
        Ok(Some((RespValue::BulkString(data), total_needed)))
    }

    /// Parses an array: `*<count>\r\n<elements...>`
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let (count, mut consumed) = match parse_length(buf)? {
            Some(parsed) => parsed,
            None => return Ok(None),
        };

        if count == -1 {
            return Ok(Some((RespValue::Null, consumed)));
        }
        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        // Each element needs at least 3 bytes, so cap the up-front allocation
        // by what the buffer could possibly hold.
        let capacity = (count as usize).min(buf.len() / 3);
        let mut elements = Vec::with_capacity(capacity);

        self.depth += 1;
        for _ in 0..count {
            match self.parse_value(&buf[consumed..])? {
                Some((value, element_consumed)) => {
                    elements.push(value);
                    consumed += element_consumed;
                }
                None => {
                    self.depth -= 1;
                    return Ok(None);
                }
            }
        }
        self.depth -= 1;

        Ok(Some((RespValue::Array(elements), consumed)))
    }

    /// Parses an inline command such as `PING\r\n` or `SET a b\r\n`.
    fn parse_inline(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let crlf_pos = match find_crlf(buf) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let line = std::str::from_utf8(&buf[..crlf_pos])
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

        let elements: Vec<RespValue> = line
            .split_whitespace()
            .map(|s| RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes())))
            .collect();

        if elements.is_empty() {
            return Err(ParseError::ProtocolError("empty inline command".to_string()));
        }

        Ok(Some((RespValue::Array(elements), crlf_pos + 2)))
    }
}

/// Reads the line after a one-byte prefix. Returns the line and the bytes
/// consumed including prefix and CRLF.
fn parse_line(buf: &[u8]) -> ParseResult<Option<(&str, usize)>> {
    match find_crlf(&buf[1..]) {
        Some(pos) => {
            let line = std::str::from_utf8(&buf[1..1 + pos])
                .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
            Ok(Some((line, 1 + pos + 2)))
        }
        None => Ok(None),
    }
}

/// Reads a `$` or `*` length header. Only plain decimal digits with an
/// optional leading minus are accepted.
fn parse_length(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let (line, consumed) = match parse_line(buf)? {
        Some(parsed) => parsed,
        None => return Ok(None),
    };

    let digits = line.strip_prefix('-').unwrap_or(line);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidInteger(line.to_string()));
    }

    let length: i64 = line
        .parse()
        .map_err(|_| ParseError::InvalidInteger(line.to_string()))?;
    Ok(Some((length, consumed)))
}

/// Length of the complete whitespace-only lines at the front of `buf`.
fn blank_lines_len(buf: &[u8]) -> usize {
    let mut offset = 0;
    while let Some(pos) = find_crlf(&buf[offset..]) {
        let line = &buf[offset..offset + pos];
        if !line.iter().all(u8::is_ascii_whitespace) {
            break;
        }
        offset += pos + 2;
    }
    offset
}

/// Returns the position of the first `\r\n` in `buf`.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|window| window == CRLF)
}

/// Parses a single RESP message with a fresh parser.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_string() {
        let (value, consumed) = parse_message(b"+OK\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::SimpleString("OK".to_string()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_parse_error() {
        let input = b"-ERR unknown command\r\n";
        let (value, consumed) = parse_message(input).unwrap().unwrap();
        assert_eq!(value, RespValue::Error("ERR unknown command".to_string()));
        assert_eq!(consumed, 22);
    }

    #[test]
    fn test_parse_integer() {
        let (value, consumed) = parse_message(b":-42\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Integer(-42));
        assert_eq!(consumed, 6);
    }

    #[test]
    fn test_parse_bulk_and_null() {
        let (value, consumed) = parse_message(b"$5\r\nhello\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::BulkString(Bytes::from("hello")));
        assert_eq!(consumed, 11);

        let (value, consumed) = parse_message(b"$-1\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Null);
        assert_eq!(consumed, 5);

        let (value, consumed) = parse_message(b"$0\r\n\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::BulkString(Bytes::new()));
        assert_eq!(consumed, 6);
    }

    #[test]
    fn test_parse_array() {
        let input = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
        let (value, consumed) = parse_message(input).unwrap().unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from("GET")),
                RespValue::BulkString(Bytes::from("name")),
            ])
        );
        assert_eq!(consumed, 23);
    }

    #[test]
    fn test_every_prefix_of_a_frame_is_incomplete() {
        let input = b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n";
        for end in 0..input.len() {
            assert_eq!(
                parse_message(&input[..end]).unwrap(),
                None,
                "prefix of {} bytes",
                end
            );
        }
        assert!(parse_message(input).unwrap().is_some());
    }

    #[test]
    fn test_pipelined_frames_consume_one_at_a_time() {
        let input = b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n";
        let (_, consumed) = parse_message(input).unwrap().unwrap();
        assert_eq!(consumed, 14);
        let (_, consumed_again) = parse_message(&input[consumed..]).unwrap().unwrap();
        assert_eq!(consumed_again, 14);
    }

    #[test]
    fn test_negative_lengths_are_rejected() {
        assert_eq!(
            parse_message(b"$-2\r\n"),
            Err(ParseError::InvalidBulkLength(-2))
        );
        assert_eq!(
            parse_message(b"*-5\r\n"),
            Err(ParseError::InvalidArrayLength(-5))
        );
    }

    #[test]
    fn test_non_numeric_lengths_are_rejected() {
        assert!(matches!(
            parse_message(b"$abc\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
        assert!(matches!(
            parse_message(b"*+2\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
        assert!(matches!(
            parse_message(b"$\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
    }

    #[test]
    fn test_truncated_terminator_is_rejected() {
        assert!(matches!(
            parse_message(b"$3\r\nfooXY"),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_inline_command() {
        let (value, consumed) = parse_message(b"SET a  b\r\n").unwrap().unwrap();
        assert_eq!(consumed, 10);
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::bulk_string("SET"),
                RespValue::bulk_string("a"),
                RespValue::bulk_string("b"),
            ])
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (value, consumed) = parse_message(b"\r\nPING\r\n").unwrap().unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(value, RespValue::Array(vec![RespValue::bulk_string("PING")]));

        let (value, consumed) = parse_message(b"\r\n  \r\n*1\r\n$4\r\nPING\r\n").unwrap().unwrap();
        assert_eq!(consumed, 20);
        assert_eq!(value, RespValue::Array(vec![RespValue::bulk_string("PING")]));

        assert_eq!(parse_message(b"\r\n"), Ok(None));
        assert_eq!(parse_message(b"   \r\n"), Ok(None));
        assert_eq!(parse_message(b"\r\nPI"), Ok(None));
    }

    #[test]
    fn test_nesting_limit() {
        let mut input = Vec::new();
        for _ in 0..=MAX_NESTING_DEPTH + 1 {
            input.extend_from_slice(b"*1\r\n");
        }
        input.extend_from_slice(b":1\r\n");
        assert!(matches!(
            parse_message(&input),
            Err(ParseError::ProtocolError(_))
        ));
    }

    #[test]
    fn test_reply_kinds_survive_a_round_trip() {
        let replies = [
            RespValue::error("ERR syntax error"),
            RespValue::bulk_string("bar"),
            RespValue::bulk_string(Bytes::from_static(b"bin\x00\r\nary")),
            RespValue::bulk_string(Bytes::new()),
            RespValue::null(),
            RespValue::integer(i64::MAX),
            RespValue::pubsub_ack("subscribe", "news", 2),
        ];

        for reply in replies {
            let wire = reply.serialize();
            let (decoded, consumed) = parse_message(&wire).unwrap().unwrap();
            assert_eq!(decoded, reply);
            assert_eq!(consumed, wire.len());
        }
    }
}
