//! Session runner for a single producer invocation.
//!
//! This module connects the process spawner, the output decoder and the
//! observer bus, and resolves the call once the producer exits.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::command::PublishCommand;
use crate::error::PublishError;
use crate::observer::{is_reserved_event, ObserverBus, ObserverEvent, ERROR_EVENT};
use crate::protocol::{
    spawn_reader, OutputChannel, ProtocolRecord, StreamItem, DEFAULT_CHANNEL_BUFFER,
};
use crate::session::{ProducerProcess, SessionState, SessionStateMachine, SessionStats};

/// How long to keep reading buffered output after the producer exits.
/// Descendants that inherited the pipes may hold them open indefinitely.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(250);

type OutputReceiver = mpsc::Receiver<(OutputChannel, StreamItem)>;

/// Value reported by the producer before it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingResult {
    /// Message id from the `done` record.
    MessageId(String),
    /// Connectivity check outcome.
    TestResult(bool),
}

impl PendingResult {
    fn to_value(&self) -> Value {
        match self {
            Self::MessageId(id) => Value::String(id.clone()),
            Self::TestResult(ok) => Value::Bool(*ok),
        }
    }
}

/// Internal action type for output handling.
enum ItemAction {
    /// Keep reading.
    Continue,
    /// Kill the producer and fail the call.
    Fail(String),
}

/// One producer invocation from spawn to exit.
pub struct Session {
    binary: PathBuf,
    command: PublishCommand,
    observer: Option<ObserverBus>,
    state: SessionStateMachine,
    pending: Option<PendingResult>,
}

impl Session {
    /// Create a session that will run `command` against the producer at `binary`.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, command: PublishCommand) -> Self {
        Self {
            binary: binary.into(),
            command,
            observer: None,
            state: SessionStateMachine::new(),
            pending: None,
        }
    }

    /// Re-broadcast records to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: ObserverBus) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    /// Get session statistics.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.state.stats()
    }

    /// Spawn the producer and wait for the call to resolve.
    ///
    /// The call resolves when the producer exits, even if a descendant still
    /// holds its output pipes open.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Spawn` if the producer cannot start,
    /// `EncodedFailure` if it reports an error record (the process is
    /// killed), `AbnormalExit` if it exits non-zero without a result, and
    /// `MissingResult` if it exits cleanly without one. Test calls resolve
    /// `false` instead of failing on error records or abnormal exits.
    pub async fn run(&mut self) -> Result<PendingResult, PublishError> {
        let mut process = match ProducerProcess::spawn(&self.binary, &self.command) {
            Ok(process) => process,
            Err(e) => {
                self.state.transition(SessionState::Failed);
                return Err(e.into());
            }
        };
        self.state.transition(SessionState::Running);
        tracing::info!(
            pid = ?process.id(),
            topic = %self.command.target(),
            test = self.command.is_test(),
            "Producer started"
        );

        let (tx, mut rx) = mpsc::channel(DEFAULT_CHANNEL_BUFFER);
        let mut readers: Vec<JoinHandle<()>> = Vec::with_capacity(2);
        if let Some(stdout) = process.take_stdout() {
            readers.push(spawn_reader(stdout, OutputChannel::Stdout, tx.clone()));
        }
        if let Some(stderr) = process.take_stderr() {
            readers.push(spawn_reader(stderr, OutputChannel::Stderr, tx.clone()));
        }
        drop(tx);

        let status = loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some((channel, item)) => {
                        if let ItemAction::Fail(reason) = self.handle_item(channel, item) {
                            abort_readers(&readers);
                            if let Err(e) = process.kill().await {
                                tracing::warn!(error = %e, "Failed to kill producer");
                            }
                            self.state.transition(SessionState::Failed);
                            return Err(PublishError::EncodedFailure(reason));
                        }
                    }
                    None => break process.wait().await?,
                },
                status = process.wait() => {
                    let status = status?;
                    if let Some(reason) = self.drain(&mut rx).await {
                        abort_readers(&readers);
                        self.state.transition(SessionState::Failed);
                        return Err(PublishError::EncodedFailure(reason));
                    }
                    break status;
                }
            }
        };

        abort_readers(&readers);
        self.resolve(status)
    }

    /// Handle output still queued after the producer exited.
    async fn drain(&mut self, rx: &mut OutputReceiver) -> Option<String> {
        while let Ok(Some((channel, item))) =
            tokio::time::timeout(EXIT_DRAIN_GRACE, rx.recv()).await
        {
            if let ItemAction::Fail(reason) = self.handle_item(channel, item) {
                return Some(reason);
            }
        }
        tracing::trace!("Producer output drained");
        None
    }

    fn handle_item(&mut self, channel: OutputChannel, item: StreamItem) -> ItemAction {
        match item {
            StreamItem::Record(record) => {
                self.state.record_decoded();
                self.handle_record(&record)
            }
            StreamItem::Text(line) => {
                self.state.record_text();
                match channel {
                    OutputChannel::Stdout => tracing::info!(%channel, "{line}"),
                    OutputChannel::Stderr => tracing::warn!(%channel, "{line}"),
                }
                ItemAction::Continue
            }
        }
    }

    fn handle_record(&mut self, record: &ProtocolRecord) -> ItemAction {
        if let Some(error) = record.failure_reason() {
            self.forward(ERROR_EVENT, record);
            if self.command.is_test() {
                tracing::warn!(msg = %record.msg, %error, "Producer test failed");
                self.pending = Some(PendingResult::TestResult(false));
                return ItemAction::Continue;
            }
            tracing::error!(msg = %record.msg, %error, "Producer reported an error");
            return ItemAction::Fail(error);
        }

        if self.command.is_test() {
            if let Some(success) = record.success {
                tracing::debug!(success, "Test result received");
                self.pending = Some(PendingResult::TestResult(success));
                return ItemAction::Continue;
            }
        } else if record.is_done() {
            match &record.message_id {
                Some(id) => {
                    tracing::debug!(message_id = %id, "Message sent");
                    self.pending = Some(PendingResult::MessageId(id.clone()));
                }
                None => tracing::warn!("Done record without message_id"),
            }
            return ItemAction::Continue;
        }

        if self.observer.is_some() && !is_reserved_event(&record.msg) {
            self.forward(&record.msg, record);
        } else {
            let fields = Value::Object(record.fields());
            tracing::info!(
                msg = %record.msg,
                level = record.level.as_deref().unwrap_or("info"),
                %fields,
                "Producer"
            );
        }
        ItemAction::Continue
    }

    fn forward(&mut self, name: &str, record: &ProtocolRecord) {
        if let Some(observer) = &self.observer {
            observer.emit(ObserverEvent::from_record(name, record));
            self.state.record_forward();
        }
    }

    fn resolve(&mut self, status: ExitStatus) -> Result<PendingResult, PublishError> {
        let code = status.code();
        tracing::debug!(?code, "Producer exited");

        let outcome = match self.pending.take() {
            Some(result) => Ok(result),
            None if self.command.is_test() && !status.success() => {
                tracing::warn!(?code, "Producer test exited without a result");
                Ok(PendingResult::TestResult(false))
            }
            None if !status.success() => Err(PublishError::AbnormalExit { code }),
            None => Err(PublishError::MissingResult),
        };

        match outcome {
            Ok(result) => {
                if let Some(observer) = &self.observer {
                    observer.emit(ObserverEvent::end(result.to_value()));
                }
                self.state.transition(SessionState::Succeeded);
                Ok(result)
            }
            Err(e) => {
                tracing::error!(error = %e, "Producer call failed");
                self.state.transition(SessionState::Failed);
                Err(e)
            }
        }
    }
}

fn abort_readers(readers: &[JoinHandle<()>]) {
    for reader in readers {
        reader.abort();
    }
}
