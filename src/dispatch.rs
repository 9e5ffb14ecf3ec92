//! Dispatch Module
//!
//! Interprets decoded commands against the shared store.
//!
//! ## Responsibilities
//! - Map the verb (case-insensitive) to a handler
//! - Validate arity
//! - Read or write the store
//! - Turn every outcome, including semantic errors, into a [`Reply`]

use std::sync::Arc;

use thiserror::Error;

use crate::protocol::{Command, Reply, Verb};
use crate::store::{MemoryStore, Store};

/// Semantic errors, reported to the client as error replies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("wrong number of arguments for '{command}' command")]
    WrongArity { command: &'static str },

    #[error("unknown command")]
    UnknownCommand,

    #[error("empty command")]
    EmptyCommand,
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(err.to_string())
    }
}

/// Routes commands to their handlers
///
/// Holds the store behind an `Arc` so one dispatcher can be shared by every
/// connection thread. Handlers never hold a store lock longer than a single
/// `get` or `set`.
pub struct Dispatcher<S: Store = MemoryStore> {
    store: Arc<S>,
}

impl<S: Store> Dispatcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Execute a command and always produce a reply
    pub fn handle(&self, command: &Command) -> Reply {
        match self.execute(command) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::debug!("Command rejected: {}", err);
                Reply::from(err)
            }
        }
    }

    /// Execute a command, keeping semantic errors typed
    pub fn execute(&self, command: &Command) -> Result<Reply, CommandError> {
        let verb = command.verb().ok_or(CommandError::EmptyCommand)?;

        match Verb::parse(verb) {
            // Extra arguments are ignored
            Verb::Ping => Ok(Reply::pong()),
            Verb::Echo => {
                let [_, message] = Self::expect_args::<2>(command, Verb::Echo)?;
                Ok(Reply::Simple(message.clone()))
            }
            Verb::Set => {
                let [_, key, value] = Self::expect_args::<3>(command, Verb::Set)?;
                self.store.set(key.clone(), value.clone());
                Ok(Reply::ok())
            }
            Verb::Get => {
                let [_, key] = Self::expect_args::<2>(command, Verb::Get)?;
                Ok(Reply::Bulk(self.store.get(key)))
            }
            Verb::Command => Ok(Reply::ok()),
            Verb::Unknown => Err(CommandError::UnknownCommand),
        }
    }

    /// Borrow exactly `N` entities (verb included) or fail with `WrongArity`
    fn expect_args<const N: usize>(
        command: &Command,
        verb: Verb,
    ) -> Result<&[bytes::Bytes; N], CommandError> {
        command
            .entities()
            .try_into()
            .map_err(|_| CommandError::WrongArity {
                command: verb.name(),
            })
    }
}

impl Default for Dispatcher<MemoryStore> {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
