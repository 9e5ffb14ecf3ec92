//! # minikv
//!
//! A minimal in-memory key-value server speaking a subset of RESP:
//! - Length-prefixed request decoding with precise, fail-fast errors
//! - PING, ECHO, SET, GET (and a COMMAND stub)
//! - A lock-striped store shared by every connection
//! - One worker thread per TCP connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one thread per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ raw bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Protocol Decoder                           │
//! │                (bytes -> Command)                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Command Dispatcher                          │
//! │                (Command -> Reply)                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ get / set
//!                       ▼
//!               ┌──────────────┐
//!               │    Store     │
//!               │  (sharded)   │
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod dispatch;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use dispatch::{CommandError, Dispatcher};
pub use store::{MemoryStore, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of minikv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
