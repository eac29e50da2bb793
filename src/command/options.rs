//! Producer settings and per-message metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Producer settings, fixed for the lifetime of a publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Send timeout enforced by the producer executable.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u32,
    /// Producer name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Producer properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_timeout_seconds() -> u32 {
    30
}

fn default_name() -> String {
    "manual-producer".to_string()
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            name: default_name(),
            properties: BTreeMap::new(),
        }
    }
}

/// Metadata attached to a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    pub key: Option<String>,
    pub ordering_key: Option<String>,
    /// Event time in epoch milliseconds.
    pub event_time: Option<u64>,
    pub replication_clusters: Vec<String>,
    pub disable_replication: bool,
    pub sequence_id: Option<u64>,
    /// Delivery delay in milliseconds.
    pub deliver_after: Option<u64>,
    /// Delivery time in epoch milliseconds.
    pub deliver_at: Option<u64>,
    pub properties: BTreeMap<String, String>,
}

impl MessageOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from a loosely typed JSON object.
    ///
    /// Keys are matched case-insensitively; unrecognized keys and values of
    /// the wrong shape are ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut options = Self::default();
        let Some(map) = value.as_object() else {
            return options;
        };

        for (key, value) in map {
            match key.to_ascii_lowercase().as_str() {
                "key" => options.key = as_text(value),
                "orderingkey" => options.ordering_key = as_text(value),
                "eventtime" => options.event_time = as_u64(value),
                "replicationclusters" => {
                    options.replication_clusters = value
                        .as_array()
                        .map(|items| items.iter().filter_map(as_text).collect())
                        .unwrap_or_default();
                }
                "disablereplication" => {
                    options.disable_replication = value.as_bool().unwrap_or(false);
                }
                "sequenceid" => options.sequence_id = as_u64(value),
                "deliverafter" => options.deliver_after = as_u64(value),
                "deliverat" => options.deliver_at = as_u64(value),
                "properties" => options.properties = as_string_map(value),
                other => tracing::trace!(key = other, "Ignoring unrecognized message option"),
            }
        }
        options
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn ordering_key(mut self, key: impl Into<String>) -> Self {
        self.ordering_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn event_time(mut self, epoch_ms: u64) -> Self {
        self.event_time = Some(epoch_ms);
        self
    }

    #[must_use]
    pub fn replication_clusters(mut self, clusters: &[&str]) -> Self {
        self.replication_clusters = clusters.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn disable_replication(mut self) -> Self {
        self.disable_replication = true;
        self
    }

    #[must_use]
    pub fn sequence_id(mut self, id: u64) -> Self {
        self.sequence_id = Some(id);
        self
    }

    #[must_use]
    pub fn deliver_after(mut self, delay_ms: u64) -> Self {
        self.deliver_after = Some(delay_ms);
        self
    }

    #[must_use]
    pub fn deliver_at(mut self, epoch_ms: u64) -> Self {
        self.deliver_at = Some(epoch_ms);
        self
    }

    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| as_text(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}
