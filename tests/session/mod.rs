//! Session tests against fake producer scripts.

mod observer_test;
mod publish_test;

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use pulsar_publisher::command::ProducerConfig;
use pulsar_publisher::Publisher;
use tempfile::TempDir;

pub const TOPIC: &str = "pulsar://localhost:6650/persistent/public/default/orders";

/// Write an executable shell script standing in for the producer.
pub fn fake_producer(body: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pulsar-publish");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

/// Build a publisher around a fake producer script.
pub fn publisher(body: &str) -> (TempDir, Publisher) {
    let (dir, path) = fake_producer(body);
    let publisher = Publisher::with_executable(&path, ProducerConfig::default())
        .unwrap()
        .with_base_dir(dir.path());
    (dir, publisher)
}
