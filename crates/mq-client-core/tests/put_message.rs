mod common;

use common::{broker, broker_with_messages, credentials, QUEUE};
use mqclient::jms::put_message;
use mqclient::memory::Faults;
use mqclient::{Error, MessageBody, PUT_MESSAGE_TEXT};
use proptest::prelude::*;

#[test]
fn put_appends_one_text_message() {
    let broker = broker();
    let id = put_message(&broker, &credentials(), QUEUE, PUT_MESSAGE_TEXT).unwrap();

    let messages = broker.messages(QUEUE);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_id, id);
    assert_eq!(messages[0].body, MessageBody::Text("foo".to_string()));
    assert!(broker.open_counts().is_empty());
}

#[test]
fn failed_send_commits_nothing() {
    let broker = broker_with_messages(2);
    broker.set_faults(Faults {
        fail_send: true,
        ..Faults::default()
    });

    let err = put_message(&broker, &credentials(), QUEUE, PUT_MESSAGE_TEXT).unwrap_err();
    assert!(matches!(err, Error::Operation { .. }));
    assert_eq!(broker.depth(QUEUE), Some(2));
    assert!(broker.open_counts().is_empty());
}

#[test]
fn failed_commit_leaves_queue_unchanged() {
    let broker = broker();
    broker.set_faults(Faults {
        fail_commit: true,
        ..Faults::default()
    });

    let err = put_message(&broker, &credentials(), QUEUE, PUT_MESSAGE_TEXT).unwrap_err();
    assert!(err.to_string().contains("commit"));
    assert_eq!(broker.depth(QUEUE), Some(0));
    assert!(broker.open_counts().is_empty());
}

#[test]
fn unknown_queue_is_an_operation_error() {
    let broker = broker();
    let err = put_message(&broker, &credentials(), "NO.SUCH.QUEUE", PUT_MESSAGE_TEXT).unwrap_err();
    assert!(matches!(err, Error::Operation { .. }));
    assert!(broker.open_counts().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_put_adds_exactly_one(existing in 0..64usize) {
        let broker = broker_with_messages(existing);

        put_message(&broker, &credentials(), QUEUE, PUT_MESSAGE_TEXT).unwrap();

        let messages = broker.messages(QUEUE);
        prop_assert_eq!(messages.len(), existing + 1);
        prop_assert_eq!(
            &messages[existing].body,
            &MessageBody::Text(PUT_MESSAGE_TEXT.to_string())
        );
    }
}
