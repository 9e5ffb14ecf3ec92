//! Request decoder
//!
//! Turns one read buffer into one [`Command`]. Decoding is fail-fast: the
//! first framing violation aborts the whole message and no partial command
//! is ever returned.
//!
//! ## Grammar
//! ```text
//! message       := '*' count CRLF entity*count
//! entity        := '$' length CRLF bytes(length) CRLF
//! count, length := ASCII digits (leading zeros allowed)
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use super::{Command, CRLF};

/// Smallest possible encoded entity: `$0\r\n\r\n`
const MIN_ENTITY_LEN: usize = 6;

/// Framing-level decode failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("expected {what} '{marker}' at offset {offset}")]
    MissingMarker {
        marker: char,
        what: &'static str,
        offset: usize,
    },

    #[error("expected digit, found byte 0x{found:02x} at offset {offset}")]
    InvalidDigit { found: u8, offset: usize },

    #[error("expected digits at offset {offset}")]
    MissingDigits { offset: usize },

    #[error("number starting at offset {offset} is too large")]
    NumberOverflow { offset: usize },

    #[error("expected CRLF at offset {offset}")]
    MissingTerminator { offset: usize },

    #[error("entity length exceeds available input: declared {declared}, available {available}")]
    LengthExceedsInput { declared: usize, available: usize },

    #[error("unknown frame type byte 0x{found:02x} at offset {offset}")]
    UnknownFrameType { found: u8, offset: usize },
}

impl DecodeError {
    /// True when the input was well-formed so far but simply ended early.
    /// Readers that can wait for more bytes use this to keep reading.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            DecodeError::UnexpectedEnd { .. } | DecodeError::LengthExceedsInput { .. }
        )
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Bounds-checked read position into a single input buffer
pub(crate) struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    pub(crate) fn peek(&self) -> Result<u8, DecodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEnd { offset: self.pos })
    }

    pub(crate) fn next_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Consume `marker` or fail with `MissingMarker`
    pub(crate) fn expect_marker(&mut self, marker: u8, what: &'static str) -> Result<(), DecodeError> {
        let offset = self.pos;
        if self.peek()? != marker {
            return Err(DecodeError::MissingMarker {
                marker: char::from(marker),
                what,
                offset,
            });
        }
        self.pos += 1;
        Ok(())
    }

    pub(crate) fn expect_crlf(&mut self) -> Result<(), DecodeError> {
        let offset = self.pos;
        if self.next_byte()? != b'\r' {
            return Err(DecodeError::MissingTerminator { offset });
        }
        if self.next_byte()? != b'\n' {
            return Err(DecodeError::MissingTerminator { offset });
        }
        Ok(())
    }

    /// Read a non-negative decimal number terminated by CRLF
    pub(crate) fn read_number(&mut self) -> Result<usize, DecodeError> {
        let start = self.pos;
        let mut value: usize = 0;

        loop {
            let offset = self.pos;
            match self.peek()? {
                digit @ b'0'..=b'9' => {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(usize::from(digit - b'0')))
                        .ok_or(DecodeError::NumberOverflow { offset: start })?;
                    self.pos += 1;
                }
                b'\r' => break,
                found => return Err(DecodeError::InvalidDigit { found, offset }),
            }
        }

        if self.pos == start {
            return Err(DecodeError::MissingDigits { offset: start });
        }

        self.expect_crlf()?;
        Ok(value)
    }

    /// Take exactly `len` raw bytes
    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if len > available {
            return Err(DecodeError::LengthExceedsInput {
                declared: len,
                available,
            });
        }

        let slice = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Take everything up to the next CRLF and skip the CRLF
    pub(crate) fn read_line(&mut self) -> Result<&'a [u8], DecodeError> {
        let rest = &self.input[self.pos..];
        match rest.windows(CRLF.len()).position(|window| window == CRLF) {
            Some(end) => {
                self.pos += end + CRLF.len();
                Ok(&rest[..end])
            }
            None => Err(DecodeError::UnexpectedEnd {
                offset: self.input.len(),
            }),
        }
    }
}

// =============================================================================
// Command Decoding/Encoding
// =============================================================================

/// Decode a command from bytes
///
/// Returns the command and number of bytes consumed. Bytes after the end of
/// the message are left untouched.
pub fn decode_command(input: &[u8]) -> Result<(Command, usize), DecodeError> {
    let mut cursor = Cursor::new(input);

    cursor.expect_marker(b'*', "count marker")?;
    let count = cursor.read_number()?;

    // A declared count can never be satisfied by fewer bytes than this
    let mut entities = Vec::with_capacity(count.min(cursor.remaining() / MIN_ENTITY_LEN));
    for _ in 0..count {
        entities.push(decode_entity(&mut cursor)?);
    }

    Ok((Command::new(entities), cursor.position()))
}

fn decode_entity(cursor: &mut Cursor<'_>) -> Result<Bytes, DecodeError> {
    cursor.expect_marker(b'$', "length marker")?;
    let len = cursor.read_number()?;
    let payload = Bytes::copy_from_slice(cursor.take(len)?);
    cursor.expect_crlf()?;
    Ok(payload)
}

/// Encode a command to its request wire form
pub fn encode_command(command: &Command) -> BytesMut {
    let payload_len: usize = command.entities().iter().map(|e| e.len() + 16).sum();
    let mut buf = BytesMut::with_capacity(16 + payload_len);

    buf.put_u8(b'*');
    buf.put_slice(command.arity().to_string().as_bytes());
    buf.put_slice(CRLF);

    for entity in command.entities() {
        buf.put_u8(b'$');
        buf.put_slice(entity.len().to_string().as_bytes());
        buf.put_slice(CRLF);
        buf.put_slice(entity);
        buf.put_slice(CRLF);
    }

    buf
}
