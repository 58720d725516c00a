/*!
 * Runner Types
 * Configuration, outcome, and error types for the child task runner
 */

use crate::core::limits::{
    DEFAULT_DEADLINE, DEFAULT_POLL_QUANTUM, EXIT_CLEAN, EXIT_DEADLINE_EXCEEDED,
    EXIT_SETUP_FAILED, MIN_POLL_QUANTUM,
};
use crate::signals::{Signal, SignalError};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Runner operation result
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Child-side failures
#[derive(Error, Debug, Diagnostic)]
pub enum RunnerError {
    #[error("Exceeded deadline of {deadline:?} without receiving a signal")]
    #[diagnostic(
        code(runner::deadline_exceeded),
        help("The parent never delivered the signal, or the handler never observed it.")
    )]
    DeadlineExceeded { deadline: Duration },

    #[error("Failed to install signal handler: {0}")]
    #[diagnostic(code(runner::handler_setup))]
    Handler(#[from] SignalError),

    #[error("Failed to report readiness: {0}")]
    #[diagnostic(
        code(runner::readiness),
        help("The parent closed its end of the readiness channel.")
    )]
    Readiness(#[source] std::io::Error),
}

impl RunnerError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::DeadlineExceeded { .. } => EXIT_DEADLINE_EXCEEDED,
            RunnerError::Handler(_) | RunnerError::Readiness(_) => EXIT_SETUP_FAILED,
        }
    }
}

/// Child task runner configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Time allowed between loop start and cancellation
    pub deadline: Duration,
    /// Sleep between cancellation checks
    pub quantum: Duration,
    /// Signal that cancels the loop
    pub signal: Signal,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            quantum: DEFAULT_POLL_QUANTUM,
            signal: Signal::SIGINT,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Quanta below the 1ms floor are raised to it
    pub fn with_quantum(mut self, quantum: Duration) -> Self {
        self.quantum = quantum.max(MIN_POLL_QUANTUM);
        self
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = signal;
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// What a cleanly cancelled loop observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOutcome {
    /// Sleep quanta completed before cancellation was seen
    pub iterations: u64,
    /// Deliveries counted by the handler (coalesced signals count once)
    pub deliveries: u32,
    /// Time from loop start to cancellation
    pub elapsed: Duration,
}

impl RunnerOutcome {
    pub fn exit_code(&self) -> i32 {
        EXIT_CLEAN
    }
}
