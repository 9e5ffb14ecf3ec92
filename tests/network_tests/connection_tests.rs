//! Connection Tests
//!
//! Drives the connection loop with an in-memory stream: each queued chunk is
//! returned by exactly one read call, then the stream reports end-of-file.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;

use minikv::network::Connection;
use minikv::{Dispatcher, MemoryStore};

/// Scripted byte stream
struct MockStream {
    reads: VecDeque<io::Result<Vec<u8>>>,
    written: Vec<u8>,
    write_error: Option<ErrorKind>,
}

impl MockStream {
    fn new(chunks: &[&[u8]]) -> Self {
        Self {
            reads: chunks.iter().map(|c| Ok(c.to_vec())).collect(),
            written: Vec::new(),
            write_error: None,
        }
    }

    fn then_error(mut self, kind: ErrorKind) -> Self {
        self.reads.push_back(Err(io::Error::new(kind, "scripted failure")));
        self
    }

    fn failing_writes(mut self, kind: ErrorKind) -> Self {
        self.write_error = Some(kind);
        self
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(Ok(chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(io::Error::new(kind, "scripted write failure"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(stream: MockStream) -> (minikv::Result<()>, Vec<u8>) {
    run_with(stream, Arc::new(Dispatcher::default()), 512)
}

fn run_with(
    stream: MockStream,
    dispatcher: Arc<Dispatcher<MemoryStore>>,
    buffer_size: usize,
) -> (minikv::Result<()>, Vec<u8>) {
    let mut connection = Connection::new(stream, dispatcher, buffer_size, "mock:0");
    let result = connection.handle();
    (result, connection.into_inner().written)
}

// =============================================================================
// Request/Reply Tests
// =============================================================================

#[test]
fn test_ping_pong() {
    let (result, written) = run(MockStream::new(&[b"*1\r\n$4\r\nPING\r\n"]));

    assert!(result.is_ok());
    assert_eq!(written, b"+PONG\r\n");
}

#[test]
fn test_echo() {
    let (_, written) = run(MockStream::new(&[b"*2\r\n$4\r\nECHO\r\n$3\r\nhey\r\n"]));
    assert_eq!(written, b"+hey\r\n");
}

#[test]
fn test_set_then_get_across_reads() {
    let (_, written) = run(MockStream::new(&[
        b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n",
        b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n",
        b"*2\r\n$3\r\nGET\r\n$6\r\nnoSuch\r\n",
    ]));

    assert_eq!(written, b"+OK\r\n$3\r\nbar\r\n$-1\r\n");
}

#[test]
fn test_malformed_request_gets_one_error_and_connection_stays_open() {
    let (result, written) = run(MockStream::new(&[
        b"*2\r\n$4\r\nPING\r\n",
        b"*1\r\n$4\r\nPING\r\n",
    ]));

    assert!(result.is_ok());
    let text = String::from_utf8(written).unwrap();
    let lines: Vec<&str> = text.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("-ERR invalid argument: "));
    assert_eq!(lines[1], "+PONG");
}

#[test]
fn test_unknown_and_empty_commands_keep_connection_usable() {
    let (_, written) = run(MockStream::new(&[
        b"*1\r\n$7\r\nFLUSHDB\r\n",
        b"*0\r\n",
        b"*1\r\n$4\r\nping\r\n",
    ]));

    assert_eq!(written, b"-ERR unknown command\r\n-ERR empty command\r\n+PONG\r\n");
}

#[test]
fn test_pipelined_messages_answered_in_order() {
    let (_, written) = run(MockStream::new(&[
        b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n*1\r\n$4\r\nPING\r\n",
    ]));

    assert_eq!(written, b"+OK\r\n$1\r\nv\r\n+PONG\r\n");
}

#[test]
fn test_decode_error_discards_rest_of_read() {
    let (_, written) = run(MockStream::new(&[
        b"*1\r\n$4\r\nPING\r\ngarbage*1\r\n$4\r\nPING\r\n",
    ]));

    let text = String::from_utf8(written).unwrap();
    assert!(text.starts_with("+PONG\r\n-ERR invalid argument: expected count marker"));
    assert_eq!(text.matches("\r\n").count(), 2);
}

#[test]
fn test_request_larger_than_read_buffer_is_an_error() {
    let (result, written) = run_with(
        MockStream::new(&[b"*2\r\n$4\r\nECHO\r\n$20\r\n01234567890123456789\r\n"]),
        Arc::new(Dispatcher::default()),
        16,
    );

    assert!(result.is_ok());
    assert!(written.starts_with(b"-ERR invalid argument: "));
}

#[test]
fn test_connections_share_the_store() {
    let dispatcher: Arc<Dispatcher> = Arc::new(Dispatcher::default());

    run_with(
        MockStream::new(&[b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$6\r\nshared\r\n"]),
        Arc::clone(&dispatcher),
        512,
    );
    let (_, written) = run_with(
        MockStream::new(&[b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n"]),
        dispatcher,
        512,
    );

    assert_eq!(written, b"$6\r\nshared\r\n");
}

// =============================================================================
// Transport Error Tests
// =============================================================================

#[test]
fn test_clean_eof_without_requests() {
    let (result, written) = run(MockStream::new(&[]));

    assert!(result.is_ok());
    assert!(written.is_empty());
}

#[test]
fn test_peer_reset_ends_quietly() {
    let (result, written) = run(MockStream::new(&[b"*1\r\n$4\r\nPING\r\n"]).then_error(ErrorKind::ConnectionReset));

    assert!(result.is_ok());
    assert_eq!(written, b"+PONG\r\n");
}

#[test]
fn test_interrupted_read_is_retried() {
    let mut stream = MockStream::new(&[]).then_error(ErrorKind::Interrupted);
    stream.reads.push_back(Ok(b"*1\r\n$4\r\nPING\r\n".to_vec()));

    let (result, written) = run(stream);
    assert!(result.is_ok());
    assert_eq!(written, b"+PONG\r\n");
}

#[test]
fn test_other_read_errors_are_returned() {
    let (result, _) = run(MockStream::new(&[]).then_error(ErrorKind::PermissionDenied));

    assert!(matches!(result, Err(minikv::KvError::Io(ref e)) if e.kind() == ErrorKind::PermissionDenied));
}

#[test]
fn test_broken_pipe_on_write_ends_quietly() {
    let (result, written) = run(
        MockStream::new(&[b"*1\r\n$4\r\nPING\r\n"]).failing_writes(ErrorKind::BrokenPipe),
    );

    assert!(result.is_ok());
    assert!(written.is_empty());
}

#[test]
fn test_other_write_errors_are_returned() {
    let (result, _) = run(
        MockStream::new(&[b"*1\r\n$4\r\nPING\r\n"]).failing_writes(ErrorKind::Other),
    );

    assert!(result.is_err());
}
