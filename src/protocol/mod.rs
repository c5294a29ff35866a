//! RESP Protocol Implementation
//!
//! - `types`: the [`RespValue`] enum and its wire encoding
//! - `parser`: incremental decoder for incoming bytes
//! - `command`: the decoded request handed to the command table
//!
//! ```
//! use coralkv::protocol::{parse_message, Command, RespValue};
//!
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (frame, consumed) = parse_message(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! let command = Command::from_frame(frame).unwrap();
//! assert_eq!(command.key(), "GET");
//!
//! assert_eq!(RespValue::null().serialize(), b"$-1\r\n");
//! ```

pub mod command;
pub mod parser;
pub mod types;

pub use command::Command;
pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
