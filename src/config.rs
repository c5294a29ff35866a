//! Command-line configuration.
//!
//! Arguments are parsed by hand; the server takes only a handful of flags and
//! reads nothing from files or the environment apart from `RUST_LOG`.

use crate::pubsub::DEFAULT_OUTBOX_CAPACITY;
use crate::replication::Role;
use crate::{DEFAULT_HOST, DEFAULT_PORT};
use anyhow::{anyhow, bail, Context};

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Master to replicate from; `None` runs as a master
    pub replicaof: Option<(String, u16)>,
    /// Undelivered messages each subscriber may have queued
    pub pubsub_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            replicaof: None,
            pubsub_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Serve(Config),
    Help,
    Version,
}

impl Config {
    /// Parses arguments, not including the program name.
    pub fn from_args<I>(args: I) -> anyhow::Result<Action>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    config.host = value_for(&mut args, &arg)?;
                }
                "--port" | "-p" => {
                    let port = value_for(&mut args, &arg)?;
                    config.port = port
                        .parse()
                        .with_context(|| format!("invalid port number: {}", port))?;
                }
                "--replicaof" => {
                    let master = value_for(&mut args, &arg)?;
                    config.replicaof = Some(parse_replicaof(&master)?);
                }
                "--pubsub-capacity" => {
                    let capacity = value_for(&mut args, &arg)?;
                    config.pubsub_capacity = capacity
                        .parse()
                        .ok()
                        .filter(|&n: &usize| n > 0)
                        .ok_or_else(|| anyhow!("invalid pub/sub capacity: {}", capacity))?;
                }
                "--help" => return Ok(Action::Help),
                "--version" | "-v" => return Ok(Action::Version),
                other => bail!("unknown argument: {}", other),
            }
        }

        Ok(Action::Serve(config))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn role(&self) -> Role {
        match &self.replicaof {
            Some((host, port)) => Role::Replica {
                host: host.clone(),
                port: *port,
            },
            None => Role::Master,
        }
    }
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

/// `"<host> <port>"`, as a single argument.
fn parse_replicaof(value: &str) -> anyhow::Result<(String, u16)> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(host), Some(port), None) => {
            let port = port
                .parse()
                .with_context(|| format!("invalid master port: {}", port))?;
            Ok((host.to_string(), port))
        }
        _ => bail!("--replicaof expects \"<host> <port>\", got {:?}", value),
    }
}

pub fn help_text() -> String {
    format!(
        r#"
coralkv {} - in-memory key-value server speaking RESP

USAGE:
    coralkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: {})
    -p, --port <PORT>              Port to listen on (default: {})
        --replicaof "<HOST> <PORT>"
                                   Run as a replica of the given master
        --pubsub-capacity <N>      Messages queued per subscriber before
                                   new ones are dropped (default: {})
    -v, --version                  Print version information
        --help                     Print this help message

LOGGING:
    Set RUST_LOG (e.g. RUST_LOG=coralkv=debug) to change verbosity.

CONNECTING:
    $ redis-cli -p {}
    127.0.0.1:{}> ZADD board 3.5 alice
    (integer) 1
"#,
        crate::VERSION,
        DEFAULT_HOST,
        DEFAULT_PORT,
        DEFAULT_OUTBOX_CAPACITY,
        DEFAULT_PORT,
        DEFAULT_PORT,
    )
}
