//! TCP Server
//!
//! Accepts connections and hands each one to its own worker thread.

use std::io::{ErrorKind, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{KvError, Result};
use crate::protocol::Reply;
use crate::store::{MemoryStore, Store};

use super::Connection;

/// TCP server for minikv
pub struct Server<S: Store + 'static = MemoryStore> {
    config: Config,
    dispatcher: Arc<Dispatcher<S>>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: AtomicBool,
    active: Arc<AtomicUsize>,
    next_conn_id: AtomicU64,
}

impl<S: Store + 'static> Server<S> {
    /// Bind the listener described by `config`
    ///
    /// Binding happens here rather than in `run` so callers learn about an
    /// unusable address (and the real port, when binding port 0) up front.
    pub fn bind(config: Config, dispatcher: Arc<Dispatcher<S>>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            KvError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Listening on {}", local_addr);

        Ok(Self {
            config,
            dispatcher,
            listener,
            local_addr,
            shutdown: AtomicBool::new(false),
            active: Arc::new(AtomicUsize::new(0)),
            next_conn_id: AtomicU64::new(0),
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Start the accept loop (blocking)
    ///
    /// Returns `Ok(())` after [`Server::shutdown`], or an error when the
    /// listener itself fails.
    pub fn run(&self) -> Result<()> {
        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            match stream {
                Ok(stream) => self.spawn_worker(stream),
                Err(ref e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::ConnectionAborted) => {
                    tracing::debug!("Transient accept error: {}", e);
                }
                Err(e) => {
                    tracing::error!("Accept failed on {}: {}", self.local_addr, e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!("Server on {} stopped accepting", self.local_addr);
        Ok(())
    }

    /// Signal the server to stop accepting new connections
    ///
    /// Connections already being served run until their clients leave.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        // Wake the blocking accept
        if let Err(e) = TcpStream::connect(wake_addr(self.local_addr)) {
            tracing::warn!("Failed to wake accept loop on {}: {}", self.local_addr, e);
        }
    }

    fn spawn_worker(&self, mut stream: TcpStream) {
        if self.active.load(Ordering::Acquire) >= self.config.max_connections {
            tracing::warn!(
                "Rejecting connection: {} clients already connected",
                self.config.max_connections
            );
            let reply = Reply::error("max number of clients reached").encode();
            let _ = stream.write_all(&reply);
            return;
        }

        let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let dispatcher = Arc::clone(&self.dispatcher);
        let config = self.config.clone();

        let spawned = thread::Builder::new()
            .name(format!("minikv-conn-{}", id))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = serve(stream, dispatcher, &config) {
                    tracing::warn!("Connection {} ended with error: {}", id, e);
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn worker for connection {}: {}", id, e);
        }
    }
}

fn serve<S: Store>(stream: TcpStream, dispatcher: Arc<Dispatcher<S>>, config: &Config) -> Result<()> {
    let mut connection = Connection::from_tcp(stream, dispatcher, config.read_buffer_size)?;
    connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;
    connection.handle()
}

/// Loopback equivalent of an unspecified bind address
fn wake_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}

/// Counts a connection as active for as long as it lives
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
