//! Broker capability traits.
//!
//! A backend provides a [`ConnectionFactory`]; everything else is borrowed from
//! the connection it returns, so a session can never outlive its connection and
//! a browser or producer can never outlive its session. Dropping any of these
//! values releases the broker resource behind it.

use std::fmt;

use serde::Serialize;

use crate::config::Credentials;
use crate::error::Result;

/// Opens authenticated connections to one queue manager.
pub trait ConnectionFactory {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>>;
}

pub trait Connection: fmt::Debug {
    /// Opens a transacted session: sends only become visible on
    /// [`Session::commit`].
    fn create_session(&mut self) -> Result<Box<dyn Session + '_>>;

    /// Disconnects, reporting any error the broker raises while doing so.
    fn close(self: Box<Self>) -> Result<()>;
}

pub trait Session: fmt::Debug {
    /// Resolves a queue name against the queue manager.
    fn create_queue(&mut self, name: &str) -> Result<Queue>;

    /// Opens a non-destructive cursor over the messages on `queue`.
    fn create_browser(&mut self, queue: &Queue) -> Result<Box<dyn Browser + '_>>;

    fn create_producer(&mut self, queue: &Queue) -> Result<Box<dyn Producer + '_>>;

    fn commit(&mut self) -> Result<()>;

    /// Closes the session, rolling back uncommitted work.
    fn close(self: Box<Self>) -> Result<()>;
}

pub trait Browser {
    /// Returns the next visible message, or `None` once the cursor is exhausted.
    fn next_message(&mut self) -> Result<Option<BrowsedMessage>>;
}

pub trait Producer {
    fn send(&mut self, message: &TextMessage) -> Result<MessageId>;
}

/// A queue resolved by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    name: String,
}

impl Queue {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue:///{}", self.name)
    }
}

/// Broker-assigned message identity, in JMS form (`ID:` followed by hex digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(format!("ID:{}", hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    Bytes(Vec<u8>),
}

/// A message seen through a [`Browser`]; it stays on the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowsedMessage {
    pub message_id: MessageId,
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    text: String,
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_uses_jms_form() {
        let id = MessageId::from_bytes(&[0x41, 0x4d, 0x51, 0x20, 0x00, 0xff]);
        assert_eq!(id.as_str(), "ID:414d512000ff");
    }

    #[test]
    fn browsed_message_serializes_for_logging() {
        let message = BrowsedMessage {
            message_id: MessageId::from_bytes(&[1, 2]),
            body: MessageBody::Text("foo".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"message_id":"ID:0102","body":{"text":"foo"}}"#
        );
    }
}
