//! Reply Tests
//!
//! Reply wire encoding and client-side reply decoding.

use bytes::Bytes;
use minikv::protocol::{decode_command, decode_reply, DecodeError, Reply};
use minikv::CommandError;

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_simple_string() {
    assert_eq!(&Reply::pong().encode()[..], b"+PONG\r\n");
    assert_eq!(&Reply::ok().encode()[..], b"+OK\r\n");
    assert_eq!(&Reply::simple("hey").encode()[..], b"+hey\r\n");
}

#[test]
fn test_encode_error_has_err_token() {
    assert_eq!(&Reply::error("unknown command").encode()[..], b"-ERR unknown command\r\n");
}

#[test]
fn test_encode_bulk_string() {
    assert_eq!(&Reply::bulk("bar").encode()[..], b"$3\r\nbar\r\n");
    assert_eq!(&Reply::bulk(Bytes::new()).encode()[..], b"$0\r\n\r\n");
}

#[test]
fn test_encode_null_bulk() {
    assert_eq!(&Reply::null().encode()[..], b"$-1\r\n");
}

#[test]
fn test_decode_error_becomes_invalid_argument_reply() {
    let err = decode_command(b"*1\r\n$10\r\nPING\r\n").unwrap_err();
    let reply = Reply::from(err);

    assert!(reply.is_error());
    let encoded = reply.encode();
    assert!(encoded.starts_with(b"-ERR invalid argument: entity length exceeds available input"));
    assert!(encoded.ends_with(b"\r\n"));
}

#[test]
fn test_command_errors_become_error_replies() {
    assert_eq!(
        &Reply::from(CommandError::WrongArity { command: "echo" }).encode()[..],
        b"-ERR wrong number of arguments for 'echo' command\r\n"
    );
    assert_eq!(
        &Reply::from(CommandError::UnknownCommand).encode()[..],
        b"-ERR unknown command\r\n"
    );
    assert_eq!(
        &Reply::from(CommandError::EmptyCommand).encode()[..],
        b"-ERR empty command\r\n"
    );
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_each_reply_shape() {
    let replies = [
        Reply::pong(),
        Reply::error("empty command"),
        Reply::bulk("bar"),
        Reply::bulk(Bytes::from_static(b"a\r\nb")),
        Reply::null(),
    ];

    for reply in replies {
        let encoded = reply.encode();
        let (decoded, consumed) = decode_reply(&encoded).unwrap();
        assert_eq!(decoded, reply);
        assert_eq!(consumed, encoded.len());
    }
}

#[test]
fn test_decode_reply_incomplete() {
    assert!(decode_reply(b"").unwrap_err().is_incomplete());
    assert!(decode_reply(b"+PON").unwrap_err().is_incomplete());
    assert!(decode_reply(b"$3\r\nba").unwrap_err().is_incomplete());
    assert!(decode_reply(b"$-1\r").unwrap_err().is_incomplete());
}

#[test]
fn test_decode_reply_unknown_type() {
    assert_eq!(
        decode_reply(b":1\r\n"),
        Err(DecodeError::UnknownFrameType { found: b':', offset: 0 })
    );
}

#[test]
fn test_decode_reply_rejects_other_negative_lengths() {
    assert!(decode_reply(b"$-2\r\n").is_err());
}
