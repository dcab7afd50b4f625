//! JMS-style queue operations: one connection, one transacted session.

use log::{debug, info, trace, warn};

use crate::config::Credentials;
use crate::error::Result;
use crate::transport::{Connection, ConnectionFactory, MessageId, Session, TextMessage};

/// Browses every message currently on `queue` and returns their ids.
///
/// Messages are not consumed; running this twice against an unchanged queue
/// yields the same ids.
///
/// # Arguments
///
/// * `factory` - Opens the connection to the queue manager
/// * `credentials` - User id and password presented on connect
/// * `queue` - Name of the queue to browse
///
/// # Returns
///
/// The ids of the browsed messages, in queue order.
///
/// # Errors
///
/// Returns [`Error::Credentials`](crate::Error::Credentials) before connecting
/// when either credential is empty. Connection, browse and close failures are
/// returned as [`Error::Connection`](crate::Error::Connection) or
/// [`Error::Operation`](crate::Error::Operation).
pub fn list_message_ids(
    factory: &dyn ConnectionFactory,
    credentials: &Credentials,
    queue: &str,
) -> Result<Vec<MessageId>> {
    trace!("list-message-ids-jms start");

    let ids = with_session(factory, credentials, |session| {
        let queue = session.create_queue(queue)?;
        let mut browser = session.create_browser(&queue)?;

        let mut ids = Vec::new();
        while let Some(message) = browser.next_message()? {
            match serde_json::to_string(&message) {
                Ok(json) => debug!("list-message-ids-jms [message={}]", json),
                Err(e) => warn!("unable to render browsed message: {}", e),
            }
            ids.push(message.message_id);
        }

        info!("browsed {} message(s) on {}", ids.len(), queue);
        Ok(ids)
    })?;

    trace!("list-message-ids-jms end");
    Ok(ids)
}

/// Sends one text message to `queue` and commits it.
///
/// Nothing is committed when the send or the commit fails.
///
/// # Arguments
///
/// * `factory` - Opens the connection to the queue manager
/// * `credentials` - User id and password presented on connect
/// * `queue` - Name of the destination queue
/// * `text` - Body of the text message
///
/// # Returns
///
/// The id the broker assigned to the sent message.
///
/// # Errors
///
/// Returns [`Error::Credentials`](crate::Error::Credentials) before connecting
/// when either credential is empty. A failed send or commit leaves the queue
/// unchanged and is returned as [`Error::Operation`](crate::Error::Operation).
pub fn put_message(
    factory: &dyn ConnectionFactory,
    credentials: &Credentials,
    queue: &str,
    text: &str,
) -> Result<MessageId> {
    trace!("put-message-jms start");

    let id = with_session(factory, credentials, |session| {
        let queue = session.create_queue(queue)?;
        let message = TextMessage::new(text);

        let id = {
            let mut producer = session.create_producer(&queue)?;
            producer.send(&message)?
        };
        session.commit()?;

        info!("put message {} on {}", id, queue);
        Ok(id)
    })?;

    trace!("put-message-jms end");
    Ok(id)
}

/// Runs `f` inside a transacted session, releasing the session and the
/// connection on every path. An error from `f` takes precedence over errors
/// raised while closing.
fn with_session<T>(
    factory: &dyn ConnectionFactory,
    credentials: &Credentials,
    f: impl FnOnce(&mut dyn Session) -> Result<T>,
) -> Result<T> {
    credentials.validate()?;

    let mut connection = factory.connect(credentials)?;
    let outcome = in_session(connection.as_mut(), f);
    let closed = connection.close();

    let value = outcome?;
    closed?;
    Ok(value)
}

fn in_session<T>(
    connection: &mut dyn Connection,
    f: impl FnOnce(&mut dyn Session) -> Result<T>,
) -> Result<T> {
    let mut session = connection.create_session()?;
    debug!("session opened [session={:?}]", session);

    let outcome = f(session.as_mut());
    let closed = session.close();

    let value = outcome?;
    closed?;
    Ok(value)
}
