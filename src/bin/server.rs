//! minikv Server Binary
//!
//! Starts the TCP server for minikv.

use std::sync::Arc;
use clap::Parser;
use minikv::{Config, Dispatcher, MemoryStore};
use minikv::network::Server;
use tracing_subscriber::{fmt, EnvFilter};

/// minikv Server
#[derive(Parser, Debug)]
#[command(name = "minikv-server")]
#[command(about = "Minimal RESP key-value server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Size of the per-read buffer in bytes
    #[arg(short = 'b', long, default_value = "4096")]
    read_buffer: usize,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Close connections idle for this long (0 = never)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Give up on writes blocked for this long (0 = never)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info,minikv=debug")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("minikv Server v{}", minikv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .read_buffer_size(args.read_buffer)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(MemoryStore::new())));

    let server = match Server::bind(config, dispatcher) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
