#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use mqclient::memory::MemoryBroker;
use mqclient::{ConnectionFactory, ConnectionSettings, Credentials, Invocation, MessageBody};

pub const QUEUE: &str = "DEV.QUEUE.1";
pub const USER: &str = "app";
pub const PASSWORD: &str = "passw0rd";

pub fn broker() -> MemoryBroker {
    let _ = env_logger::builder().is_test(true).try_init();

    MemoryBroker::new("QM1")
        .with_user(USER, PASSWORD)
        .with_queue(QUEUE)
}

/// A broker whose queue already holds `count` text messages.
pub fn broker_with_messages(count: usize) -> MemoryBroker {
    let broker = broker();
    for i in 0..count {
        broker
            .seed(QUEUE, MessageBody::Text(format!("Test message {}", i)))
            .unwrap();
    }
    broker
}

pub fn credentials() -> Credentials {
    Credentials::new(USER, PASSWORD)
}

pub fn invocation(function: &str, transport: &str) -> Invocation {
    Invocation {
        function: function.to_string(),
        transport: transport.to_string(),
        channel: "DEV.APP.SVRCONN".to_string(),
        queue_manager: "QM1".to_string(),
        host: Some("localhost".to_string()),
        port: Some("1414".to_string()),
        queue: QUEUE.to_string(),
        credentials: credentials(),
    }
}

/// Factory closure handing out `broker`, counting how often it is asked for
/// and recording the settings it was built from.
pub struct RecordingFactory {
    pub calls: Rc<Cell<usize>>,
    pub settings: Rc<Cell<Option<ConnectionSettings>>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            settings: Rc::new(Cell::new(None)),
        }
    }

    pub fn factory(
        &self,
        broker: &MemoryBroker,
    ) -> impl FnOnce(&ConnectionSettings) -> mqclient::Result<Box<dyn ConnectionFactory>> {
        let calls = self.calls.clone();
        let seen = self.settings.clone();
        let broker = broker.clone();
        move |settings: &ConnectionSettings| {
            calls.set(calls.get() + 1);
            seen.set(Some(settings.clone()));
            Ok(Box::new(broker) as Box<dyn ConnectionFactory>)
        }
    }
}
