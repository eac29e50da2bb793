//! Tests for producer argument vectors.

use pulsar_publisher::command::{MessageOptions, Payload, ProducerConfig, PublishCommand};
use serde_json::json;

const TOPIC: &str = "pulsar://localhost:6650/persistent/public/default/orders";

fn position(args: &[String], flag: &str) -> usize {
    args.iter()
        .position(|a| a == flag)
        .unwrap_or_else(|| panic!("missing {flag} in {args:?}"))
}

#[test]
fn target_is_first_positional() {
    let args = PublishCommand::publish(TOPIC, "hello").build_args();
    assert_eq!(args[args.len() - 2], TOPIC);
    assert_eq!(args[args.len() - 1], "hello");
}

#[test]
fn test_mode_puts_test_flag_first_and_omits_payload() {
    let args = PublishCommand::test(TOPIC)
        .message_options(MessageOptions::new().key("k"))
        .build_args();

    assert_eq!(args[0], "--test");
    assert_eq!(args.last().map(String::as_str), Some(TOPIC));
    assert_eq!(args.iter().filter(|a| a.as_str() == TOPIC).count(), 1);
}

#[test]
fn object_payload_is_escaped_json() {
    let args = PublishCommand::publish(TOPIC, json!({"id": 7, "name": "x"})).build_args();
    assert_eq!(
        args.last().map(String::as_str),
        Some(r#"{\"id\":7,\"name\":\"x\"}"#)
    );
}

#[test]
fn text_payload_quotes_are_escaped() {
    let args = PublishCommand::publish(TOPIC, Payload::from(r#"say "hi""#)).build_args();
    assert_eq!(args.last().map(String::as_str), Some(r#"say \"hi\""#));
}

#[test]
fn replication_clusters_repeat_in_order() {
    let args = PublishCommand::publish(TOPIC, "m")
        .message_options(MessageOptions::new().replication_clusters(&["a", "b"]))
        .build_args();

    let clusters: Vec<&str> = args
        .windows(2)
        .filter(|w| w[0] == "--replication-cluster")
        .map(|w| w[1].as_str())
        .collect();
    assert_eq!(clusters, vec!["a", "b"]);
}

#[test]
fn all_message_flags() {
    let options = MessageOptions::new()
        .key("k")
        .ordering_key("ok")
        .event_time(1)
        .disable_replication()
        .sequence_id(2)
        .deliver_after(3)
        .deliver_at(4)
        .property("a", "1");
    let args = PublishCommand::publish(TOPIC, "m")
        .message_options(options)
        .build_args();

    for (flag, value) in [
        ("--key", "k"),
        ("--ordering-key", "ok"),
        ("--event-time", "1"),
        ("--sequence-id", "2"),
        ("--deliver-after", "3"),
        ("--deliver-at", "4"),
        ("--property", "a=1"),
    ] {
        let idx = position(&args, flag);
        assert_eq!(args[idx + 1], value, "value of {flag}");
    }
    assert!(args.contains(&"--disable-replication".to_string()));
}

#[test]
fn producer_flags_follow_message_flags_and_precede_auth() {
    let mut producer = ProducerConfig::default();
    producer.name = "orders-producer".to_string();
    producer.timeout_seconds = 5;
    producer.properties.insert("team".to_string(), "pay".to_string());

    let args = PublishCommand::test(TOPIC)
        .message_options(MessageOptions::new().key("k"))
        .producer(producer)
        .auth_flags(vec!["--jwt".to_string(), "eyJx".to_string()])
        .build_args();

    assert_eq!(
        args,
        vec![
            "--test",
            "--key",
            "k",
            "--name",
            "orders-producer",
            "--timeout",
            "5",
            "--producer-property",
            "team=pay",
            "--jwt",
            "eyJx",
            TOPIC,
        ]
    );
}

#[test]
fn unrecognized_options_are_dropped() {
    let options = MessageOptions::from_value(&json!({"compression": "zstd", "Key": "k"}));
    let args = PublishCommand::publish(TOPIC, "m")
        .message_options(options)
        .build_args();

    assert!(!args.iter().any(|a| a.contains("compression")));
    assert_eq!(args[position(&args, "--key") + 1], "k");
}

#[test]
fn command_is_clone() {
    let command = PublishCommand::publish(TOPIC, "m");
    assert_eq!(command.clone().build_args(), command.build_args());
}
