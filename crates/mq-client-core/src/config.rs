//! Selectors and connection values resolved from the command line.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Body of every message written by `put-message`.
pub const PUT_MESSAGE_TEXT: &str = "foo";

/// The operation an invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    ListMessageIds,
    PutMessage,
}

impl Function {
    pub fn as_str(&self) -> &'static str {
        match self {
            Function::ListMessageIds => "list-message-ids",
            Function::PutMessage => "put-message",
        }
    }
}

impl FromStr for Function {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "list-message-ids" => Ok(Function::ListMessageIds),
            "put-message" => Ok(Function::PutMessage),
            other => Err(Error::UnsupportedFunction(other.to_string())),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The client API family used to talk to the queue manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    Jms,
}

impl FromStr for TransportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jms" => Ok(TransportType::Jms),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportType::Jms => f.write_str("jms"),
        }
    }
}

/// How the connection reaches the queue manager. Only network client
/// connections are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Client,
}

/// Connection factory configuration for one queue manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub channel: String,
    pub queue_manager: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub mode: TransportMode,
}

impl ConnectionSettings {
    /// Builds settings from raw flag values. The port is only parsed here.
    pub fn from_flags(
        channel: &str,
        queue_manager: &str,
        host: Option<&str>,
        port: Option<&str>,
    ) -> Result<Self> {
        if channel.is_empty() {
            return Err(Error::Config("channel must not be empty".to_string()));
        }
        if queue_manager.is_empty() {
            return Err(Error::Config("queue manager must not be empty".to_string()));
        }

        let port = port.map(parse_port).transpose()?;

        Ok(Self {
            channel: channel.to_string(),
            queue_manager: queue_manager.to_string(),
            host: host.map(str::to_string),
            port,
            mode: TransportMode::Client,
        })
    }
}

fn parse_port(value: &str) -> Result<u16> {
    value
        .parse::<u16>()
        .map_err(|e| Error::Config(format!("invalid port '{}': {}", value, e)))
}

/// User id and password presented when the connection is opened.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub userid: String,
    password: String,
}

impl Credentials {
    pub fn new(userid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            userid: userid.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Rejects empty values before any broker is contacted.
    pub fn validate(&self) -> Result<()> {
        if self.userid.is_empty() || self.password.is_empty() {
            return Err(Error::Credentials);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("userid", &self.userid)
            .field("password", &"***")
            .finish()
    }
}
