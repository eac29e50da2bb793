//! Error types for publish and test calls.

use std::path::PathBuf;

use crate::session::SpawnError;

/// Errors that can occur while configuring a publisher or running a call.
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    /// The producer executable does not exist at the resolved path.
    #[error("Producer executable not found at {0}")]
    MissingExecutable(PathBuf),

    /// The producer executable could not be spawned.
    #[error("Failed to spawn producer: {0}")]
    Spawn(#[from] SpawnError),

    /// The producer reported a structured error record.
    #[error("{0}")]
    EncodedFailure(String),

    /// The producer exited unsuccessfully without an error record.
    #[error("{}", describe_exit(.code))]
    AbnormalExit { code: Option<i32> },

    /// The producer exited cleanly but never reported a result.
    #[error("result not returned (unknown error)")]
    MissingResult,

    /// Authentication material passed to a setter was missing or empty.
    #[error("Invalid authentication input: {0}")]
    InvalidAuthInput(String),

    /// I/O failure while supervising the producer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("process exited with code {code}"),
        None => "process terminated by signal".to_string(),
    }
}
