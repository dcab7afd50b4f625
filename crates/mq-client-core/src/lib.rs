//! # mq-client-core
//!
//! Core library for browsing and putting messages on a remote message queue
//! manager.
//!
//! An [`Invocation`] carries the raw command-line values. Running it resolves
//! the function and type selectors, builds [`ConnectionSettings`], asks the
//! caller for a [`ConnectionFactory`] and performs one of the two JMS-style
//! exchanges in [`jms`].
//!
//! ## Backends
//!
//! - **IBM MQ** (`ibmmq` feature): client-mode connections through the `mqi`
//!   crate. Needs the IBM MQ client libraries at build and run time.
//! - **In-process** ([`memory::MemoryBroker`]): queues held in memory, with
//!   resource accounting and fault injection.
//!
//! ## Example
//!
//! ```
//! use mqclient::memory::MemoryBroker;
//! use mqclient::{ConnectionFactory, Credentials, Invocation, Outcome};
//!
//! let broker = MemoryBroker::new("QM1")
//!     .with_user("app", "passw0rd")
//!     .with_queue("DEV.QUEUE.1");
//!
//! let invocation = Invocation {
//!     function: "put-message".to_string(),
//!     transport: "jms".to_string(),
//!     channel: "DEV.APP.SVRCONN".to_string(),
//!     queue_manager: "QM1".to_string(),
//!     host: None,
//!     port: None,
//!     queue: "DEV.QUEUE.1".to_string(),
//!     credentials: Credentials::new("app", "passw0rd"),
//! };
//!
//! let factory = broker.clone();
//! let outcome = invocation
//!     .run(move |_| Ok(Box::new(factory) as Box<dyn ConnectionFactory>))
//!     .unwrap();
//! assert!(matches!(outcome, Outcome::Put(_)));
//! assert_eq!(broker.depth("DEV.QUEUE.1"), Some(1));
//! ```

mod config;
mod dispatch;
mod error;
#[cfg(feature = "ibmmq")]
pub mod ibmmq;
pub mod jms;
pub mod memory;
mod transport;

pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use transport::*;

/// Builds the connection factory used for the `jms` type.
#[cfg(feature = "ibmmq")]
pub fn jms_connection_factory(settings: &ConnectionSettings) -> Result<Box<dyn ConnectionFactory>> {
    log::trace!("connection-factory start [settings={:?}]", settings);
    Ok(Box::new(ibmmq::MqConnectionFactory::new(settings.clone())))
}

/// Builds the connection factory used for the `jms` type.
///
/// This build carries no broker client, so every attempt fails.
#[cfg(not(feature = "ibmmq"))]
pub fn jms_connection_factory(settings: &ConnectionSettings) -> Result<Box<dyn ConnectionFactory>> {
    log::trace!("connection-factory start [settings={:?}]", settings);
    Err(Error::Connection {
        context: format!(
            "queue manager {}: built without IBM MQ client support (rebuild with --features ibmmq)",
            settings.queue_manager
        ),
        source: None,
    })
}
