//! Routes one invocation to the operation named by its selectors.

use log::{debug, trace};

use crate::config::{ConnectionSettings, Credentials, Function, TransportType, PUT_MESSAGE_TEXT};
use crate::error::{Error, Result};
use crate::jms;
use crate::transport::{ConnectionFactory, MessageId};

/// Everything one run of the client needs, as given on the command line.
///
/// Selector and port values are kept raw; they are only interpreted by
/// [`Invocation::run`].
#[derive(Debug, Clone)]
pub struct Invocation {
    pub function: String,
    pub transport: String,
    pub channel: String,
    pub queue_manager: String,
    pub host: Option<String>,
    pub port: Option<String>,
    pub queue: String,
    pub credentials: Credentials,
}

/// What a completed invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Listed(Vec<MessageId>),
    Put(MessageId),
}

impl Invocation {
    /// Resolves the function, then the type, and performs the operation.
    ///
    /// `factory` is only called once both selectors are recognised and the
    /// connection settings are valid, so selector and port errors never reach
    /// the broker.
    ///
    /// # Arguments
    ///
    /// * `factory` - Builds the connection factory for the resolved settings.
    ///   [`crate::jms_connection_factory`] is the one the CLI passes.
    ///
    /// # Errors
    ///
    /// * [`Error::UnsupportedFunction`] / [`Error::UnsupportedType`] for an
    ///   unknown selector, checked in that order.
    /// * [`Error::Config`] for an empty channel, queue manager or queue, or a
    ///   port that is not a `u16`.
    /// * Whatever `factory` or the selected operation returns.
    pub fn run<F>(&self, factory: F) -> Result<Outcome>
    where
        F: FnOnce(&ConnectionSettings) -> Result<Box<dyn ConnectionFactory>>,
    {
        trace!("run start");
        let function: Function = self.function.parse()?;
        let transport: TransportType = self.transport.parse()?;
        debug!("dispatching [function={}, type={}]", function, transport);

        let settings = ConnectionSettings::from_flags(
            &self.channel,
            &self.queue_manager,
            self.host.as_deref(),
            self.port.as_deref(),
        )?;
        if self.queue.is_empty() {
            return Err(Error::Config("queue must not be empty".to_string()));
        }

        let outcome = match (function, transport) {
            (Function::ListMessageIds, TransportType::Jms) => {
                let factory = factory(&settings)?;
                jms::list_message_ids(factory.as_ref(), &self.credentials, &self.queue)
                    .map(Outcome::Listed)?
            }
            (Function::PutMessage, TransportType::Jms) => {
                let factory = factory(&settings)?;
                jms::put_message(
                    factory.as_ref(),
                    &self.credentials,
                    &self.queue,
                    PUT_MESSAGE_TEXT,
                )
                .map(Outcome::Put)?
            }
        };

        trace!("run end");
        Ok(outcome)
    }
}
