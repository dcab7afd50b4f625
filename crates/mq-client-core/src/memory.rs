//! In-process broker implementing the capability traits.
//!
//! Queues live in memory and are shared by every clone of a [`MemoryBroker`].
//! The broker keeps count of open connections, sessions, browsers and
//! producers so callers can check that everything handed out was released,
//! and it can be told to fail at specific points of an exchange.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::transport::{
    BrowsedMessage, Browser, Connection, ConnectionFactory, MessageBody, MessageId, Producer,
    Queue, Session, TextMessage,
};

/// Broker resources currently held by clients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenCounts {
    pub connections: usize,
    pub sessions: usize,
    pub browsers: usize,
    pub producers: usize,
}

impl OpenCounts {
    pub fn is_empty(&self) -> bool {
        *self == OpenCounts::default()
    }
}

/// Points at which the broker fails instead of doing its work.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    /// Refuse every connection with this reason, whatever the credentials.
    pub reject_connections: Option<String>,
    /// Fail the browse cursor once it has returned this many messages.
    pub fail_browse_after: Option<usize>,
    pub fail_send: bool,
    pub fail_commit: bool,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, String>,
    queues: HashMap<String, Vec<BrowsedMessage>>,
    open: OpenCounts,
    faults: Faults,
    connect_attempts: usize,
    sequence: u64,
}

impl State {
    fn next_id(&mut self) -> MessageId {
        self.sequence += 1;
        let mut bytes = [0u8; 24];
        bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
        bytes[16..].copy_from_slice(&self.sequence.to_be_bytes());
        MessageId::from_bytes(&bytes)
    }
}

#[derive(Clone)]
pub struct MemoryBroker {
    name: String,
    state: Arc<Mutex<State>>,
}

impl MemoryBroker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a user allowed to connect.
    pub fn with_user(self, userid: impl Into<String>, password: impl Into<String>) -> Self {
        self.state.lock().users.insert(userid.into(), password.into());
        self
    }

    pub fn with_queue(self, name: impl Into<String>) -> Self {
        self.create_queue(name);
        self
    }

    pub fn create_queue(&self, name: impl Into<String>) {
        self.state.lock().queues.entry(name.into()).or_default();
    }

    /// Places a committed message directly on `queue`.
    pub fn seed(&self, queue: &str, body: MessageBody) -> Result<MessageId> {
        let mut state = self.state.lock();
        let id = state.next_id();
        let messages = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| unknown_queue(queue))?;
        messages.push(BrowsedMessage {
            message_id: id.clone(),
            body,
        });
        Ok(id)
    }

    pub fn depth(&self, queue: &str) -> Option<usize> {
        self.state.lock().queues.get(queue).map(Vec::len)
    }

    pub fn messages(&self, queue: &str) -> Vec<BrowsedMessage> {
        self.state
            .lock()
            .queues
            .get(queue)
            .cloned()
            .unwrap_or_default()
    }

    pub fn open_counts(&self) -> OpenCounts {
        self.state.lock().open
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.lock().connect_attempts
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state.lock().faults = faults;
    }
}

impl fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn unknown_queue(name: &str) -> Error {
    Error::operation(
        format!("unable to resolve queue '{}'", name),
        "MQRC_UNKNOWN_OBJECT_NAME",
    )
}

impl ConnectionFactory for MemoryBroker {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>> {
        let mut state = self.state.lock();
        state.connect_attempts += 1;

        if let Some(reason) = state.faults.reject_connections.clone() {
            return Err(Error::connection(
                format!("queue manager {}", self.name),
                reason,
            ));
        }

        let authorized = state
            .users
            .get(&credentials.userid)
            .is_some_and(|password| password == credentials.password());
        if !authorized {
            return Err(Error::connection(
                format!(
                    "queue manager {} rejected user '{}'",
                    self.name, credentials.userid
                ),
                "MQRC_NOT_AUTHORIZED",
            ));
        }

        state.open.connections += 1;
        drop(state);

        Ok(Box::new(MemoryConnection {
            broker: self.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct MemoryConnection {
    broker: MemoryBroker,
}

impl Connection for MemoryConnection {
    fn create_session(&mut self) -> Result<Box<dyn Session + '_>> {
        self.broker.state.lock().open.sessions += 1;
        Ok(Box::new(MemorySession {
            broker: &self.broker,
            staged: Vec::new(),
        }))
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.broker.state.lock().open.connections -= 1;
    }
}

#[derive(Debug)]
pub struct MemorySession<'c> {
    broker: &'c MemoryBroker,
    staged: Vec<(String, BrowsedMessage)>,
}

impl Session for MemorySession<'_> {
    fn create_queue(&mut self, name: &str) -> Result<Queue> {
        if self.broker.state.lock().queues.contains_key(name) {
            Ok(Queue::new(name))
        } else {
            Err(unknown_queue(name))
        }
    }

    fn create_browser(&mut self, queue: &Queue) -> Result<Box<dyn Browser + '_>> {
        self.broker.state.lock().open.browsers += 1;
        Ok(Box::new(MemoryBrowser {
            broker: self.broker,
            queue: queue.name().to_string(),
            position: 0,
        }))
    }

    fn create_producer(&mut self, queue: &Queue) -> Result<Box<dyn Producer + '_>> {
        self.broker.state.lock().open.producers += 1;
        Ok(Box::new(MemoryProducer {
            queue: queue.name().to_string(),
            session: self,
        }))
    }

    fn commit(&mut self) -> Result<()> {
        let mut state = self.broker.state.lock();
        if state.faults.fail_commit {
            return Err(Error::operation("commit", "MQRC_BACKED_OUT"));
        }
        for (queue, message) in self.staged.drain(..) {
            state
                .queues
                .get_mut(&queue)
                .ok_or_else(|| unknown_queue(&queue))?
                .push(message);
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            debug!("rolling back {} uncommitted message(s)", self.staged.len());
        }
        self.broker.state.lock().open.sessions -= 1;
    }
}

struct MemoryBrowser<'c> {
    broker: &'c MemoryBroker,
    queue: String,
    position: usize,
}

impl Browser for MemoryBrowser<'_> {
    fn next_message(&mut self) -> Result<Option<BrowsedMessage>> {
        let state = self.broker.state.lock();
        if state
            .faults
            .fail_browse_after
            .is_some_and(|limit| self.position >= limit)
        {
            return Err(Error::operation(
                format!("browse of {}", self.queue),
                "MQRC_CONNECTION_BROKEN",
            ));
        }

        let message = state
            .queues
            .get(&self.queue)
            .ok_or_else(|| unknown_queue(&self.queue))?
            .get(self.position)
            .cloned();
        if message.is_some() {
            self.position += 1;
        }
        Ok(message)
    }
}

impl Drop for MemoryBrowser<'_> {
    fn drop(&mut self) {
        self.broker.state.lock().open.browsers -= 1;
    }
}

struct MemoryProducer<'s, 'c> {
    session: &'s mut MemorySession<'c>,
    queue: String,
}

impl Producer for MemoryProducer<'_, '_> {
    fn send(&mut self, message: &TextMessage) -> Result<MessageId> {
        let mut state = self.session.broker.state.lock();
        if state.faults.fail_send {
            return Err(Error::operation(
                format!("send to {}", self.queue),
                "MQRC_Q_FULL",
            ));
        }

        let id = state.next_id();
        let stored = BrowsedMessage {
            message_id: id.clone(),
            body: MessageBody::Text(message.text().to_string()),
        };
        self.session.staged.push((self.queue.clone(), stored));
        Ok(id)
    }
}

impl Drop for MemoryProducer<'_, '_> {
    fn drop(&mut self) {
        self.session.broker.state.lock().open.producers -= 1;
    }
}
