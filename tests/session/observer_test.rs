//! Observer bus behaviour during real calls.

use pulsar_publisher::command::MessageOptions;
use pulsar_publisher::observer::{ObserverBus, END_EVENT, ERROR_EVENT};
use serde_json::json;

use super::{publisher, TOPIC};

#[tokio::test]
async fn observer_sees_records_then_end() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"connected","time":"2024-05-01T10:00:00Z","level":"info","broker":"b1"}\n'
printf '{"msg":"done","message_id":"abc-123"}\n'"#,
    );
    let bus = ObserverBus::default();
    let mut rx = bus.subscribe();
    let publisher = publisher.with_observer(bus);

    let id = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap();
    assert_eq!(id, "abc-123");

    let connected = rx.recv().await.unwrap();
    assert_eq!(connected.name, "connected");
    assert_eq!(connected.fields.get("broker"), Some(&json!("b1")));
    assert!(!connected.fields.contains_key("msg"));
    assert!(!connected.fields.contains_key("time"));
    assert!(!connected.fields.contains_key("level"));
    assert_eq!(
        connected.timestamp.to_rfc3339(),
        "2024-05-01T10:00:00+00:00"
    );

    let end = rx.recv().await.unwrap();
    assert_eq!(end.name, END_EVENT);
    assert_eq!(end.value(), Some(&json!("abc-123")));
}

#[tokio::test]
async fn observer_sees_error_before_rejection() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"send","error":"topic not found"}\n'
sleep 30"#,
    );
    let bus = ObserverBus::default();
    let mut rx = bus.subscribe();
    let publisher = publisher.with_observer(bus);

    assert!(publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .is_err());

    let event = rx.recv().await.unwrap();
    assert_eq!(event.name, ERROR_EVENT);
    assert_eq!(event.fields.get("error"), Some(&json!("topic not found")));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_end_event_carries_boolean() {
    let (_dir, publisher) = publisher(r#"printf '{"msg":"test-result","success":true}\n'"#);
    let bus = ObserverBus::default();
    let mut rx = bus.subscribe();
    let publisher = publisher.with_observer(bus);

    assert!(publisher.test(TOPIC, MessageOptions::new()).await.unwrap());

    let end = rx.recv().await.unwrap();
    assert_eq!(end.name, END_EVENT);
    assert_eq!(end.value(), Some(&json!(true)));
}

#[tokio::test]
async fn records_named_like_reserved_events_are_not_forwarded() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"end","phase":"flush"}\n'
printf '{"msg":"error","detail":"retrying"}\n'
printf '{"msg":"done","message_id":"m1"}\n'"#,
    );
    let bus = ObserverBus::default();
    let mut rx = bus.subscribe();
    let publisher = publisher.with_observer(bus);

    let id = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap();
    assert_eq!(id, "m1");

    let end = rx.recv().await.unwrap();
    assert_eq!(end.name, END_EVENT);
    assert_eq!(end.value(), Some(&json!("m1")));
    assert!(rx.try_recv().is_err());
}
