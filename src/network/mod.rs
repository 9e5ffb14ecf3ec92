//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One worker thread per connection
//! - Commands routed through the shared Dispatcher

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
