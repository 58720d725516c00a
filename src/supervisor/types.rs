/*!
 * Supervisor Types
 * Child handles, exit outcomes, supervision results, and errors
 */

use crate::core::limits::EXIT_CLEAN;
use crate::signals::{Signal, SignalError};
use miette::Diagnostic;
use nix::errno::Errno;
use nix::unistd::Pid as NixPid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::fd::OwnedFd;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Supervisor operation result
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Parent-side failures
///
/// Every variant is terminal for the run; nothing is retried.
#[derive(Error, Debug, Diagnostic)]
pub enum SupervisorError {
    #[error("Failed to spawn child: {0}")]
    #[diagnostic(
        code(supervisor::spawn_failed),
        help("Check process limits (ulimit -u) and that the child program exists.")
    )]
    SpawnFailed(String),

    #[error("Child {pid} did not report readiness within {timeout:?}")]
    #[diagnostic(
        code(supervisor::readiness_timeout),
        help("The child was killed and reaped. Raise --ready-timeout-ms on slow hosts.")
    )]
    ReadinessTimeout { pid: i32, timeout: Duration },

    #[error("Child {pid} closed its readiness channel before becoming ready ({outcome})")]
    #[diagnostic(code(supervisor::child_not_ready))]
    ChildNotReady { pid: i32, outcome: ExitOutcome },

    #[error("Failed reading readiness from child {pid}: {source}")]
    #[diagnostic(code(supervisor::readiness_failed))]
    ReadinessFailed {
        pid: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("Signal delivery failed: {0}")]
    #[diagnostic(transparent)]
    SignalDelivery(#[from] SignalError),

    #[error("Failed to wait for child {pid}: {errno}")]
    #[diagnostic(
        code(supervisor::wait_failed),
        help("The child may already have been reaped by someone else.")
    )]
    WaitFailed { pid: i32, errno: Errno },

    #[error("Child {pid} did not shut down cleanly: {outcome}")]
    #[diagnostic(
        code(supervisor::unclean_exit),
        help("Exit status 1 means the child hit its deadline without observing the signal.")
    )]
    UncleanExit { pid: i32, outcome: ExitOutcome },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(supervisor::invalid_config))]
    InvalidConfig(String),
}

/// A spawned child the supervisor has not yet reaped
#[derive(Debug)]
pub struct ChildHandle {
    pid: NixPid,
    ready: Option<OwnedFd>,
    spawned_at: Instant,
}

impl ChildHandle {
    pub fn new(pid: NixPid, ready: OwnedFd) -> Self {
        Self {
            pid,
            ready: Some(ready),
            spawned_at: Instant::now(),
        }
    }

    #[inline]
    pub fn pid(&self) -> NixPid {
        self.pid
    }

    #[inline]
    pub fn raw_pid(&self) -> i32 {
        self.pid.as_raw()
    }

    pub fn spawned_at(&self) -> Instant {
        self.spawned_at
    }

    /// Take the read end of the readiness channel; `None` once taken
    pub fn take_ready(&mut self) -> Option<OwnedFd> {
        self.ready.take()
    }
}

/// How the child terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// Normal exit with a status code
    Exited(i32),
    /// Terminated by a signal (host signal number)
    Signaled(i32),
}

impl ExitOutcome {
    /// Exit status, if the child exited normally
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitOutcome::Exited(code) => Some(*code),
            ExitOutcome::Signaled(_) => None,
        }
    }

    /// Terminating signal, if known
    pub fn signal(&self) -> Option<Signal> {
        match self {
            ExitOutcome::Exited(_) => None,
            ExitOutcome::Signaled(n) => Signal::from_number(*n).ok(),
        }
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        *self == ExitOutcome::Exited(EXIT_CLEAN)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exited with status {}", code),
            ExitOutcome::Signaled(n) => match self.signal() {
                Some(signal) => write!(f, "killed by {}", signal),
                None => write!(f, "killed by signal {}", n),
            },
        }
    }
}

/// The parent's view of one supervised run, created after reaping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionResult {
    pub run_id: String,
    pub pid: i32,
    pub launcher: String,
    pub outcome: ExitOutcome,
    /// Signal sent to the child, `None` when delivery was disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    pub signals_sent: u32,
    /// Spawn to readiness byte
    pub ready_after: Duration,
    /// Spawn to reap
    pub elapsed: Duration,
}

impl SupervisionResult {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.outcome.is_clean()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.outcome.code()
    }
}

impl fmt::Display for SupervisionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "child {} ({}) {} after {:?}",
            self.pid, self.launcher, self.outcome, self.elapsed
        )?;
        if let Some(signal) = self.signal {
            write!(f, "; sent {} x{}", signal.name(), self.signals_sent)?;
        }
        Ok(())
    }
}
