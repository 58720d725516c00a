/*!
 * Supervisor Configuration
 *
 * Presets, builder methods, and environment overrides for one supervised run.
 */

use super::types::{SupervisorError, SupervisorResult};
use crate::core::limits::*;
use crate::runner::RunnerConfig;
use crate::signals::Signal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one supervised run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Passed through to the child
    pub runner: RunnerConfig,

    /// Bound on the readiness handshake (default: 2s)
    pub ready_timeout: Duration,

    /// How many times the signal is sent back to back (default: 1)
    pub signal_count: u32,

    /// Send the signal at all; `false` lets the child run into its deadline
    pub deliver: bool,
}

impl SupervisorConfig {
    /// Create default configuration: 5s deadline, 10ms quantum, one SIGINT
    pub fn new() -> Self {
        Self {
            runner: RunnerConfig::new(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            signal_count: 1,
            deliver: true,
        }
    }

    /// Short deadline for exercising the failure path
    pub fn quick() -> Self {
        Self::new().with_deadline(QUICK_DEADLINE)
    }

    /// Generous deadlines for slow or heavily loaded hosts
    pub fn relaxed() -> Self {
        Self::new()
            .with_deadline(RELAXED_DEADLINE)
            .with_ready_timeout(RELAXED_READY_TIMEOUT)
    }

    /// Defaults overridden by `SIGSUP_*` environment variables
    pub fn from_env() -> SupervisorResult<Self> {
        Self::new().apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key-value source
    pub fn apply_env<F>(mut self, lookup: F) -> SupervisorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(deadline) = parse_millis(&lookup, ENV_DEADLINE_MS)? {
            self = self.with_deadline(deadline);
        }
        if let Some(quantum) = parse_millis(&lookup, ENV_QUANTUM_MS)? {
            self = self.with_quantum(quantum);
        }
        if let Some(timeout) = parse_millis(&lookup, ENV_READY_TIMEOUT_MS)? {
            self = self.with_ready_timeout(timeout);
        }
        Ok(self)
    }

    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.runner = self.runner.with_deadline(deadline);
        self
    }

    pub fn with_quantum(mut self, quantum: Duration) -> Self {
        self.runner = self.runner.with_quantum(quantum);
        self
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.runner = self.runner.with_signal(signal);
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_signal_count(mut self, count: u32) -> Self {
        self.signal_count = count;
        self
    }

    /// Never signal the child (negative control)
    pub fn without_signal(mut self) -> Self {
        self.deliver = false;
        self
    }

    /// Reject configurations that cannot produce a meaningful run
    pub fn validate(&self) -> SupervisorResult<()> {
        if !self.runner.signal.can_catch() {
            return Err(SupervisorError::InvalidConfig(format!(
                "{} cannot be caught by the child",
                self.runner.signal
            )));
        }
        if self.deliver && !(1..=MAX_SIGNAL_COUNT).contains(&self.signal_count) {
            return Err(SupervisorError::InvalidConfig(format!(
                "signal count must be between 1 and {}, got {}",
                MAX_SIGNAL_COUNT, self.signal_count
            )));
        }
        if self.ready_timeout.is_zero() {
            return Err(SupervisorError::InvalidConfig(
                "readiness timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_millis<F>(lookup: &F, key: &str) -> SupervisorResult<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| SupervisorError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
    }
}
