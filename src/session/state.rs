//! Session state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a single publish or test call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// State machine for tracking session progress.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    state: SessionState,
    records: usize,
    forwarded: usize,
    text_lines: usize,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            records: 0,
            forwarded: 0,
            text_lines: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transition(&mut self, new_state: SessionState) {
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    pub fn record_decoded(&mut self) {
        self.records = self.records.saturating_add(1);
    }

    pub fn record_forward(&mut self) {
        self.forwarded = self.forwarded.saturating_add(1);
    }

    pub fn record_text(&mut self) {
        self.text_lines = self.text_lines.saturating_add(1);
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            records: self.records,
            forwarded: self.forwarded,
            text_lines: self.text_lines,
        }
    }
}

/// Session statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Protocol records decoded.
    pub records: usize,
    /// Records re-broadcast to observers.
    pub forwarded: usize,
    /// Output lines that were not records.
    pub text_lines: usize,
}
