//! Command definitions
//!
//! Represents commands from clients.

use bytes::Bytes;

/// Supported command verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Ping,
    Echo,
    Set,
    Get,
    /// `COMMAND` introspection, answered with a stub
    Command,
    /// Anything else
    Unknown,
}

impl Verb {
    /// Look up a verb, ignoring ASCII case
    pub fn parse(name: &[u8]) -> Verb {
        const TABLE: [(&[u8], Verb); 5] = [
            (b"PING", Verb::Ping),
            (b"ECHO", Verb::Echo),
            (b"SET", Verb::Set),
            (b"GET", Verb::Get),
            (b"COMMAND", Verb::Command),
        ];

        TABLE
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, verb)| *verb)
            .unwrap_or(Verb::Unknown)
    }

    /// Lowercase name, as used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Ping => "ping",
            Verb::Echo => "echo",
            Verb::Set => "set",
            Verb::Get => "get",
            Verb::Command => "command",
            Verb::Unknown => "unknown",
        }
    }
}

/// A parsed command: the verb followed by its positional arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    entities: Vec<Bytes>,
}

impl Command {
    /// Build a command from its entities (verb first)
    pub fn new(entities: Vec<Bytes>) -> Self {
        Self { entities }
    }

    /// Convenience constructor from anything byte-like
    pub fn from_parts<I, B>(parts: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self {
            entities: parts
                .into_iter()
                .map(|part| Bytes::copy_from_slice(part.as_ref()))
                .collect(),
        }
    }

    /// All entities, verb included
    pub fn entities(&self) -> &[Bytes] {
        &self.entities
    }

    /// Positional arguments (everything after the verb)
    pub fn args(&self) -> &[Bytes] {
        self.entities.get(1..).unwrap_or(&[])
    }

    /// Total entity count, verb included
    pub fn arity(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The raw verb entity, if any
    pub fn verb(&self) -> Option<&Bytes> {
        self.entities.first()
    }

    pub fn into_entities(self) -> Vec<Bytes> {
        self.entities
    }
}
