//! End-to-end publish and test calls.

use std::time::{Duration, Instant};

use pulsar_publisher::command::{MessageOptions, PublishCommand};
use pulsar_publisher::session::{PendingResult, Session, SessionState};
use pulsar_publisher::PublishError;
use tokio_test::{assert_err, assert_ok};

use super::{fake_producer, publisher, TOPIC};

#[tokio::test]
async fn done_record_resolves_message_id() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"done","time":"2024-05-01T10:00:00Z","message_id":"abc-123"}\n'"#,
    );

    let id = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap();
    assert_eq!(id, "abc-123");
}

#[tokio::test]
async fn done_record_on_stderr_is_accepted() {
    let (_dir, publisher) =
        publisher(r#"printf '{"msg":"done","message_id":"from-stderr"}\n' >&2"#);

    let id = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap();
    assert_eq!(id, "from-stderr");
}

#[tokio::test]
async fn record_split_across_writes_is_reassembled() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"do'
sleep 0.1
printf 'ne","message_id":"split-1"}\n'"#,
    );

    let id = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap();
    assert_eq!(id, "split-1");
}

#[tokio::test]
async fn error_record_rejects_and_kills_producer() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"x","time":"2024-05-01T10:00:00Z","error":"boom"}\n'
sleep 30
printf '{"msg":"done","message_id":"too-late"}\n'"#,
    );

    let started = Instant::now();
    let err = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::EncodedFailure(_)));
    assert!(err.to_string().contains("boom"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn clean_exit_without_result_is_unknown_error() {
    let (_dir, publisher) = publisher(r#"printf '{"msg":"connecting"}\n'"#);

    let err = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::MissingResult));
    assert!(err.to_string().contains("unknown error"));
}

#[tokio::test]
async fn non_zero_exit_reports_code() {
    let (_dir, publisher) = publisher("echo 'not json' >&2\nexit 2");

    let err = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::AbnormalExit { code: Some(2) }));
    assert_eq!(err.to_string(), "process exited with code 2");
}

#[tokio::test]
async fn result_wins_over_non_zero_exit() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"done","message_id":"kept"}\n'
exit 4"#,
    );

    let id = publisher
        .publish(TOPIC, "hello", MessageOptions::new())
        .await
        .unwrap();
    assert_eq!(id, "kept");
}

#[tokio::test]
async fn test_failure_resolves_false_on_non_zero_exit() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"test-result","success":false}\n'
exit 1"#,
    );

    let ok = assert_ok!(publisher.test(TOPIC, MessageOptions::new()).await);
    assert!(!ok);
}

#[tokio::test]
async fn test_success_resolves_true() {
    let (_dir, publisher) = publisher(r#"printf '{"msg":"test-result","success":true}\n'"#);

    let ok = assert_ok!(publisher.test(TOPIC, MessageOptions::new()).await);
    assert!(ok);
}

#[tokio::test]
async fn test_error_record_resolves_false() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"connect","error":"connection refused"}\n'
exit 1"#,
    );

    let ok = assert_ok!(publisher.test(TOPIC, MessageOptions::new()).await);
    assert!(!ok);
}

#[tokio::test]
async fn test_crash_without_record_resolves_false() {
    let (_dir, publisher) = publisher("exit 7");

    let ok = assert_ok!(publisher.test(TOPIC, MessageOptions::new()).await);
    assert!(!ok);
}

#[tokio::test]
async fn test_clean_exit_without_record_fails() {
    let (_dir, publisher) = publisher("exit 0");

    let err = assert_err!(publisher.test(TOPIC, MessageOptions::new()).await);
    assert!(matches!(err, PublishError::MissingResult));
}

#[tokio::test]
async fn producer_receives_built_arguments() {
    let (dir, publisher) = publisher(
        r#"printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
printf '{"msg":"done","message_id":"m"}\n'"#,
    );

    publisher
        .publish(TOPIC, "payload", MessageOptions::new().key("k1"))
        .await
        .unwrap();

    let recorded = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(
        args,
        vec![
            "--key",
            "k1",
            "--name",
            "manual-producer",
            "--timeout",
            "30",
            TOPIC,
            "payload",
        ]
    );
}

#[tokio::test]
async fn auth_flags_reach_producer() {
    let (dir, mut publisher) = publisher(
        r#"printf '%s ' "$@" > "$(dirname "$0")/args.txt"
printf '{"msg":"done","message_id":"m"}\n'"#,
    );
    publisher.set_basic_auth("admin", "secret").unwrap();

    publisher
        .publish(TOPIC, "p", MessageOptions::new())
        .await
        .unwrap();

    let recorded = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
    assert!(recorded.contains("--username admin --password secret"));
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let (_dir, publisher) = publisher(
        r#"sleep 0.2
printf '{"msg":"done","message_id":"%s"}\n' "$(echo "$@" | awk '{print $NF}')""#,
    );

    let (a, b) = tokio::join!(
        publisher.publish(TOPIC, "first", MessageOptions::new()),
        publisher.publish(TOPIC, "second", MessageOptions::new()),
    );
    assert_eq!(a.unwrap(), "first");
    assert_eq!(b.unwrap(), "second");
}

#[tokio::test]
async fn removed_executable_fails_before_spawn() {
    let (dir, publisher) = publisher("exit 0");
    std::fs::remove_file(dir.path().join("pulsar-publish")).unwrap();

    let err = publisher
        .publish(TOPIC, "p", MessageOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::MissingExecutable(_)));
}

#[tokio::test]
async fn session_tracks_state_and_stats() {
    let (_dir, path) = fake_producer(
        r#"printf '{"msg":"connecting"}\nplain line\n{"msg":"done","message_id":"s1"}\n'"#,
    );

    let mut session = Session::new(&path, PublishCommand::publish(TOPIC, "p"));
    assert_eq!(session.state(), SessionState::Idle);

    let result = session.run().await.unwrap();
    assert_eq!(result, PendingResult::MessageId("s1".to_string()));
    assert_eq!(session.state(), SessionState::Succeeded);

    let stats = session.stats();
    assert_eq!(stats.records, 2);
    assert_eq!(stats.text_lines, 1);
    assert_eq!(stats.forwarded, 0);
}

#[tokio::test]
async fn session_marks_failure() {
    let (_dir, path) = fake_producer("exit 3");

    let mut session = Session::new(&path, PublishCommand::publish(TOPIC, "p"));
    assert!(session.run().await.is_err());
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test]
async fn resolves_on_exit_while_descendant_holds_pipes() {
    let (_dir, publisher) = publisher(
        r#"sleep 5 &
printf '{"msg":"done","message_id":"detached-1"}\n'
exit 0"#,
    );

    let started = Instant::now();
    let id = assert_ok!(publisher.publish(TOPIC, "hello", MessageOptions::new()).await);
    assert_eq!(id, "detached-1");
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "call waited for the background child: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn blank_error_falls_back_to_record_name() {
    let (_dir, publisher) = publisher(
        r#"printf '{"msg":"connect failed","error":""}\n'
sleep 30"#,
    );

    let err = assert_err!(publisher.publish(TOPIC, "hello", MessageOptions::new()).await);
    match err {
        PublishError::EncodedFailure(reason) => assert_eq!(reason, "connect failed"),
        other => panic!("Expected EncodedFailure, got {other:?}"),
    }
}
