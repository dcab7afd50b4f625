//! IBM MQ backend built on the `mqi` crate.
//!
//! Sessions map onto the connection's unit of work: puts are made under
//! syncpoint, [`Session::commit`] issues MQCMIT and closing a session with
//! uncommitted work issues MQBACK. Browsing opens the queue with MQOO_BROWSE
//! and walks it with MQGMO_BROWSE_NEXT until no message is available.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use libmqm_sys::link::LinkedMq;
use log::{debug, trace};
use mqi::{
    connection::{Credentials as MqCredentials, MqServer, ThreadNone},
    constants,
    prelude::*,
    types::{ApplName, MessageId as MqMessageId, MQGMO, MQOO, MQPMO, QueueManagerName, QueueName},
    Object, Syncpoint,
};

use crate::config::{ConnectionSettings, Credentials};
use crate::error::{Error, Result};
use crate::transport::{
    BrowsedMessage, Browser, Connection, ConnectionFactory, MessageBody, MessageId, Producer,
    Queue, Session, TextMessage,
};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 1414;
const APPL_NAME: ApplName = ApplName(mqstr!("mq-client"));

/// Only the message id is needed; longer bodies are truncated into this.
const BROWSE_BUFFER: usize = 64 * 1024;

type Qm = mqi::Connection<LinkedMq, ThreadNone>;

/// Open options for the browse cursor.
pub fn browse_open_options() -> MQOO {
    constants::MQOO_BROWSE | constants::MQOO_FAIL_IF_QUIESCING
}

/// Get options for each browse step.
///
/// Messages are not converted, and bodies larger than the buffer are accepted
/// truncated so the cursor still advances past them.
pub fn browse_get_options() -> MQGMO {
    constants::MQGMO_BROWSE_NEXT
        | constants::MQGMO_NO_WAIT
        | constants::MQGMO_ACCEPT_TRUNCATED_MSG
        | constants::MQGMO_FAIL_IF_QUIESCING
}

/// Open options for the producer.
pub fn put_open_options() -> MQOO {
    constants::MQOO_OUTPUT | constants::MQOO_FAIL_IF_QUIESCING
}

/// Put options: inside the unit of work, with a fresh message id.
pub fn put_options() -> MQPMO {
    constants::MQPMO_SYNCPOINT | constants::MQPMO_NEW_MSG_ID | constants::MQPMO_FAIL_IF_QUIESCING
}

/// Client-mode connection factory for one queue manager.
#[derive(Debug, Clone)]
pub struct MqConnectionFactory {
    settings: ConnectionSettings,
}

impl MqConnectionFactory {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    /// `host(port)` as expected in an MQCD connection name.
    pub fn connection_name(&self) -> String {
        format!(
            "{}({})",
            self.settings.host.as_deref().unwrap_or(DEFAULT_HOST),
            self.settings.port.unwrap_or(DEFAULT_PORT)
        )
    }

    /// Client channel definition in MQSERVER form, `CHANNEL/TCP/host(port)`.
    pub fn mq_server(&self) -> String {
        format!("{}/TCP/{}", self.settings.channel, self.connection_name())
    }
}

fn queue_name(name: &str) -> Result<QueueName> {
    QueueName::from_str(name)
        .map_err(|e| Error::Config(format!("queue '{}' is not valid for MQ: {}", name, e)))
}

impl ConnectionFactory for MqConnectionFactory {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>> {
        trace!("connection start");
        let server = self.mq_server();
        let client = MqServer::try_from(server.as_str())
            .map_err(|e| Error::Config(format!("channel definition '{}': {}", server, e)))?;
        let queue_manager = QueueManagerName::from_str(&self.settings.queue_manager).map_err(|e| {
            Error::Config(format!(
                "queue manager '{}' is not valid for MQ: {}",
                self.settings.queue_manager, e
            ))
        })?;
        let user: MqCredentials<'_, &str> =
            MqCredentials::User(credentials.userid.as_str(), credentials.password().into());

        let qm = mqi::connect::<ThreadNone>(&(APPL_NAME, queue_manager, user, client))
            .warn_as_error()
            .map_err(|e| {
                Error::connection(
                    format!(
                        "queue manager {} via {} at {}",
                        self.settings.queue_manager,
                        self.settings.channel,
                        self.connection_name()
                    ),
                    e,
                )
            })?;

        trace!("connection end");
        Ok(Box::new(MqConnection {
            name: self.settings.queue_manager.clone(),
            qm,
        }))
    }
}

pub struct MqConnection {
    name: String,
    qm: Qm,
}

impl fmt::Debug for MqConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqConnection")
            .field("queue_manager", &self.name)
            .finish()
    }
}

impl Connection for MqConnection {
    fn create_session(&mut self) -> Result<Box<dyn Session + '_>> {
        Ok(Box::new(MqSession {
            qm: &self.qm,
            unit_of_work: None,
        }))
    }

    fn close(self: Box<Self>) -> Result<()> {
        let MqConnection { name, qm } = *self;
        qm.disconnect()
            .discard_warning()
            .map_err(|e| Error::operation(format!("disconnect from {}", name), e))
    }
}

/// A session over the connection's unit of work.
///
/// `unit_of_work` is only set once something was put under syncpoint.
/// Dropping it without a commit issues MQBACK.
pub struct MqSession<'c> {
    qm: &'c Qm,
    unit_of_work: Option<Syncpoint<&'c Qm>>,
}

impl fmt::Debug for MqSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqSession")
            .field("uncommitted", &self.unit_of_work.is_some())
            .finish()
    }
}

impl Session for MqSession<'_> {
    fn create_queue(&mut self, name: &str) -> Result<Queue> {
        queue_name(name)?;
        Ok(Queue::new(name))
    }

    fn create_browser(&mut self, queue: &Queue) -> Result<Box<dyn Browser + '_>> {
        let name = queue_name(queue.name())?;
        let object = Object::open(self.qm, &(name, browse_open_options()))
            .warn_as_error()
            .map_err(|e| Error::operation(format!("open {} for browse", queue), e))?;
        Ok(Box::new(MqBrowser {
            object,
            queue: queue.clone(),
            buffer: vec![0; BROWSE_BUFFER],
        }))
    }

    fn create_producer(&mut self, queue: &Queue) -> Result<Box<dyn Producer + '_>> {
        let name = queue_name(queue.name())?;
        let object = Object::open(self.qm, &(name, put_open_options()))
            .warn_as_error()
            .map_err(|e| Error::operation(format!("open {} for output", queue), e))?;
        Ok(Box::new(MqProducer {
            session: self,
            object,
            queue: queue.clone(),
        }))
    }

    fn commit(&mut self) -> Result<()> {
        if let Some(unit_of_work) = self.unit_of_work.take() {
            unit_of_work
                .commit()
                .warn_as_error()
                .map_err(|e| Error::operation("commit", e))?;
        }
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        match self.unit_of_work.take() {
            Some(unit_of_work) => {
                debug!("backing out uncommitted unit of work");
                unit_of_work
                    .backout()
                    .discard_warning()
                    .map(|_| ())
                    .map_err(|e| Error::operation("backout", e))
            }
            None => Ok(()),
        }
    }
}

struct MqBrowser<'c> {
    object: Object<&'c Qm>,
    queue: Queue,
    buffer: Vec<u8>,
}

impl Browser for MqBrowser<'_> {
    fn next_message(&mut self) -> Result<Option<BrowsedMessage>> {
        // MQRC_TRUNCATED_MSG_ACCEPTED arrives as a warning
        let message: Option<(Cow<'_, [u8]>, MqMessageId)> = self
            .object
            .get_as(&browse_get_options(), &mut self.buffer[..])
            .discard_warning()
            .map_err(|e| Error::operation(format!("browse {}", self.queue), e))?;

        Ok(message.map(|(data, id)| BrowsedMessage {
            message_id: MessageId::from_bytes(&id.0),
            body: match String::from_utf8(data.into_owned()) {
                Ok(text) => MessageBody::Text(text),
                Err(e) => MessageBody::Bytes(e.into_bytes()),
            },
        }))
    }
}

struct MqProducer<'s, 'c> {
    session: &'s mut MqSession<'c>,
    object: Object<&'c Qm>,
    queue: Queue,
}

impl Producer for MqProducer<'_, '_> {
    fn send(&mut self, message: &TextMessage) -> Result<MessageId> {
        let id: MqMessageId = self
            .object
            .put_message_with(&put_options(), message.text())
            .warn_as_error()
            .map_err(|e| Error::operation(format!("send to {}", self.queue), e))?;

        let qm = self.session.qm;
        self.session
            .unit_of_work
            .get_or_insert_with(|| Syncpoint::new(qm));
        Ok(MessageId::from_bytes(&id.0))
    }
}
