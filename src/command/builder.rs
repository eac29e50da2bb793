//! Argument vector construction for the producer executable.
//!
//! The producer expects every `--flag value` pair before the positionals,
//! grouped as `[--test] <message flags> <producer flags> <auth flags>
//! <target> [<payload>]`. Its argument parser scopes flags by that order, so
//! the grouping must be preserved exactly.

use super::{MessageOptions, Payload, ProducerConfig};

/// Builder for one producer invocation.
#[derive(Debug, Clone, Default)]
pub struct PublishCommand {
    target: String,
    payload: Option<Payload>,
    message: MessageOptions,
    producer: ProducerConfig,
    auth_flags: Vec<String>,
    test_mode: bool,
}

impl PublishCommand {
    /// Create a command that publishes `payload` to `target`.
    #[must_use]
    pub fn publish(target: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            target: target.into(),
            payload: Some(payload.into()),
            ..Default::default()
        }
    }

    /// Create a connectivity check against `target`. No payload is sent.
    #[must_use]
    pub fn test(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            test_mode: true,
            ..Default::default()
        }
    }

    /// Set the message metadata.
    #[must_use]
    pub fn message_options(mut self, options: MessageOptions) -> Self {
        self.message = options;
        self
    }

    /// Set the producer settings.
    #[must_use]
    pub fn producer(mut self, producer: ProducerConfig) -> Self {
        self.producer = producer;
        self
    }

    /// Set pre-encoded authentication flags.
    #[must_use]
    pub fn auth_flags(mut self, flags: Vec<String>) -> Self {
        self.auth_flags = flags;
        self
    }

    /// Get the connection target.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether this is a connectivity check.
    #[must_use]
    pub fn is_test(&self) -> bool {
        self.test_mode
    }

    /// Build the command-line arguments.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.test_mode {
            args.push("--test".to_string());
        }

        self.push_message_flags(&mut args);
        self.push_producer_flags(&mut args);
        args.extend(self.auth_flags.iter().cloned());

        args.push(self.target.clone());
        if !self.test_mode {
            if let Some(payload) = &self.payload {
                args.push(payload.to_argument());
            }
        }

        args
    }

    fn push_message_flags(&self, args: &mut Vec<String>) {
        let message = &self.message;

        if let Some(key) = &message.key {
            args.push("--key".to_string());
            args.push(key.clone());
        }

        if let Some(key) = &message.ordering_key {
            args.push("--ordering-key".to_string());
            args.push(key.clone());
        }

        if let Some(time) = message.event_time {
            args.push("--event-time".to_string());
            args.push(time.to_string());
        }

        for cluster in &message.replication_clusters {
            args.push("--replication-cluster".to_string());
            args.push(cluster.clone());
        }

        if message.disable_replication {
            args.push("--disable-replication".to_string());
        }

        if let Some(id) = message.sequence_id {
            args.push("--sequence-id".to_string());
            args.push(id.to_string());
        }

        if let Some(delay) = message.deliver_after {
            args.push("--deliver-after".to_string());
            args.push(delay.to_string());
        }

        if let Some(at) = message.deliver_at {
            args.push("--deliver-at".to_string());
            args.push(at.to_string());
        }

        for (key, value) in &message.properties {
            args.push("--property".to_string());
            args.push(format!("{key}={value}"));
        }
    }

    fn push_producer_flags(&self, args: &mut Vec<String>) {
        args.push("--name".to_string());
        args.push(self.producer.name.clone());
        args.push("--timeout".to_string());
        args.push(self.producer.timeout_seconds.to_string());

        for (key, value) in &self.producer.properties {
            args.push("--producer-property".to_string());
            args.push(format!("{key}={value}"));
        }
    }
}
