//! Reply definitions
//!
//! Represents replies to clients and their wire encoding.

use bytes::{BufMut, Bytes, BytesMut};

use super::decoder::Cursor;
use super::{DecodeError, CRLF};

/// Token written in front of every error message
const ERROR_PREFIX: &[u8] = b"ERR ";

/// A reply to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+<text>\r\n`
    Simple(Bytes),

    /// `-ERR <message>\r\n`
    Error(String),

    /// `$<len>\r\n<bytes>\r\n`, or `$-1\r\n` when `None`
    Bulk(Option<Bytes>),
}

impl Reply {
    /// `+OK`
    pub fn ok() -> Self {
        Reply::Simple(Bytes::from_static(b"OK"))
    }

    /// `+PONG`
    pub fn pong() -> Self {
        Reply::Simple(Bytes::from_static(b"PONG"))
    }

    pub fn simple(text: impl Into<Bytes>) -> Self {
        Reply::Simple(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(message.into())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(Some(data.into()))
    }

    /// Null bulk string, sent for a missing key
    pub fn null() -> Self {
        Reply::Bulk(None)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Encode into an existing buffer
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Reply::Simple(text) => {
                buf.put_u8(b'+');
                buf.put_slice(text);
                buf.put_slice(CRLF);
            }
            Reply::Error(message) => {
                buf.put_u8(b'-');
                buf.put_slice(ERROR_PREFIX);
                buf.put_slice(message.as_bytes());
                buf.put_slice(CRLF);
            }
            Reply::Bulk(Some(data)) => {
                buf.put_u8(b'$');
                buf.put_slice(data.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(data);
                buf.put_slice(CRLF);
            }
            Reply::Bulk(None) => buf.put_slice(b"$-1\r\n"),
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf
    }
}

impl From<DecodeError> for Reply {
    fn from(err: DecodeError) -> Self {
        Reply::Error(format!("invalid argument: {}", err))
    }
}

/// Decode a reply from bytes
///
/// Returns the reply and number of bytes consumed. The `ERR ` token is
/// stripped from error messages when present.
pub fn decode_reply(input: &[u8]) -> Result<(Reply, usize), DecodeError> {
    let mut cursor = Cursor::new(input);

    let offset = cursor.position();
    let reply = match cursor.next_byte()? {
        b'+' => Reply::Simple(Bytes::copy_from_slice(cursor.read_line()?)),
        b'-' => {
            let line = cursor.read_line()?;
            let message = line.strip_prefix(ERROR_PREFIX).unwrap_or(line);
            Reply::Error(String::from_utf8_lossy(message).into_owned())
        }
        b'$' => {
            if cursor.peek()? == b'-' {
                // Only -1 (null) is a valid negative length
                let offset = cursor.position();
                cursor.next_byte()?;
                if cursor.read_number()? != 1 {
                    return Err(DecodeError::InvalidDigit { found: b'-', offset });
                }
                Reply::Bulk(None)
            } else {
                let len = cursor.read_number()?;
                let data = Bytes::copy_from_slice(cursor.take(len)?);
                cursor.expect_crlf()?;
                Reply::Bulk(Some(data))
            }
        }
        found => return Err(DecodeError::UnknownFrameType { found, offset }),
    };

    Ok((reply, cursor.position()))
}
