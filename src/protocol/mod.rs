//! Protocol Module
//!
//! Defines the wire protocol for client-server communication. This is the
//! subset of RESP needed for PING, ECHO, SET and GET.
//!
//! ## Request Format
//! ```text
//! *<N>\r\n
//! $<len>\r\n<len bytes>\r\n      (repeated N times)
//! ```
//!
//! Counts and lengths are ASCII digits only. Entity payloads are raw bytes
//! and may contain anything, including `\r\n`.
//!
//! ## Reply Format
//! ```text
//! Simple String   +<text>\r\n
//! Error           -ERR <message>\r\n
//! Bulk String     $<len>\r\n<bytes>\r\n
//! Null Bulk       $-1\r\n
//! ```

mod command;
mod decoder;
mod reply;

pub use command::{Command, Verb};
pub use decoder::{decode_command, encode_command, DecodeError};
pub use reply::{decode_reply, Reply};

/// Line terminator used by every frame
pub const CRLF: &[u8] = b"\r\n";
