//! minikv CLI Client
//!
//! Command-line interface for interacting with minikv.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use minikv::protocol::{decode_reply, encode_command, Command, Reply};
use minikv::{KvError, Result};

/// minikv CLI
#[derive(Parser, Debug)]
#[command(name = "minikv-cli")]
#[command(about = "CLI for the minikv key-value server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Ask the server to echo a message back
    Echo {
        /// The message to echo
        message: String,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },
}

impl Commands {
    fn to_command(&self) -> Command {
        match self {
            Commands::Ping => Command::from_parts(["PING"]),
            Commands::Echo { message } => Command::from_parts(["ECHO", message.as_str()]),
            Commands::Get { key } => Command::from_parts(["GET", key.as_str()]),
            Commands::Set { key, value } => {
                Command::from_parts(["SET", key.as_str(), value.as_str()])
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match execute(&args.server, &args.command.to_command()) {
        Ok(reply) => {
            println!("{}", render(&reply));
            if reply.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Could not talk to {}: {}", args.server, e);
            ExitCode::FAILURE
        }
    }
}

/// Send one command and wait for its complete reply
fn execute(server: &str, command: &Command) -> Result<Reply> {
    let mut stream = TcpStream::connect(server)?;
    stream.write_all(&encode_command(command))?;
    stream.flush()?;

    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(KvError::Network(
                "connection closed before a full reply arrived".to_string(),
            ));
        }
        received.extend_from_slice(&chunk[..n]);

        match decode_reply(&received) {
            Ok((reply, _)) => return Ok(reply),
            Err(e) if e.is_incomplete() => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Format a reply the way redis-cli does
fn render(reply: &Reply) -> String {
    match reply {
        Reply::Simple(text) => String::from_utf8_lossy(text).into_owned(),
        Reply::Error(message) => format!("(error) ERR {}", message),
        Reply::Bulk(Some(data)) => format!("{:?}", String::from_utf8_lossy(data)),
        Reply::Bulk(None) => "(nil)".to_string(),
    }
}
