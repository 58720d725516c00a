/*!
 * Supervisor
 *
 * Drives one supervised run:
 *
 * 1. Launch the child and take its pid
 * 2. Wait (bounded) for the readiness byte
 * 3. Deliver the signal `signal_count` times, unless delivery is disabled
 * 4. Block in waitpid until the child terminates
 *
 * Any failure after launch kills and reaps the child before returning, so a
 * failed run never leaves a zombie behind. A child that closes its readiness
 * channel without exiting is given the rest of the readiness timeout.
 */

use super::config::SupervisorConfig;
use super::launcher::ForkLauncher;
use super::readiness::{await_ready, ReadinessEvent};
use super::traits::Launcher;
use super::types::{ChildHandle, ExitOutcome, SupervisionResult, SupervisorError, SupervisorResult};
use crate::core::limits::REAP_POLL_INTERVAL;
use crate::monitoring::SupervisionSpan;
use crate::signals::{OsSignalDelivery, Signal, SignalDelivery};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid as NixPid;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Parent side of the supervised lifecycle
pub struct Supervisor<L = ForkLauncher, D = OsSignalDelivery> {
    launcher: L,
    delivery: D,
    config: SupervisorConfig,
}

impl Supervisor {
    /// Fork-based supervisor delivering signals through the kernel
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            launcher: ForkLauncher::new(),
            delivery: OsSignalDelivery::new(),
            config,
        }
    }
}

impl<L: Launcher, D: SignalDelivery> Supervisor<L, D> {
    pub fn with_launcher<L2: Launcher>(self, launcher: L2) -> Supervisor<L2, D> {
        Supervisor {
            launcher,
            delivery: self.delivery,
            config: self.config,
        }
    }

    pub fn with_delivery<D2: SignalDelivery>(self, delivery: D2) -> Supervisor<L, D2> {
        Supervisor {
            launcher: self.launcher,
            delivery,
            config: self.config,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Run the lifecycle once and report how the child terminated
    pub fn supervise(&self) -> SupervisorResult<SupervisionResult> {
        self.config.validate()?;

        let span = SupervisionSpan::new(self.launcher.name());
        let _entered = span.enter();
        let started = Instant::now();

        let mut child = self.launcher.launch(&self.config.runner)?;
        let pid = child.raw_pid();
        span.record_pid(pid);
        info!(pid, "Child spawned");

        let ready_after = self.await_ready(&mut child)?;
        debug!(pid, ready_ms = ready_after.as_millis() as u64, "Child ready");

        let signals_sent = self.deliver(&child)?;

        let outcome = reap(child.pid())?;
        span.record_outcome(&outcome);

        let result = SupervisionResult {
            run_id: span.run_id().to_string(),
            pid,
            launcher: self.launcher.name().to_string(),
            outcome,
            signal: self.config.deliver.then_some(self.config.runner.signal),
            signals_sent,
            ready_after,
            elapsed: started.elapsed(),
        };

        if result.is_clean() {
            info!(pid, elapsed_ms = result.elapsed.as_millis() as u64, "Child shut down cleanly");
        } else {
            warn!(pid, outcome = %result.outcome, "Child did not shut down cleanly");
        }

        Ok(result)
    }

    /// Like `supervise`, but a non-zero exit is an error
    pub fn verify(&self) -> SupervisorResult<SupervisionResult> {
        let result = self.supervise()?;
        if result.is_clean() {
            Ok(result)
        } else {
            Err(SupervisorError::UncleanExit {
                pid: result.pid,
                outcome: result.outcome,
            })
        }
    }

    fn await_ready(&self, child: &mut ChildHandle) -> SupervisorResult<Duration> {
        let pid = child.raw_pid();
        let Some(ready) = child.take_ready() else {
            return Err(SupervisorError::SpawnFailed(
                "launcher returned no readiness channel".to_string(),
            ));
        };

        let waiting_since = Instant::now();
        match await_ready(ready, self.config.ready_timeout) {
            ReadinessEvent::Ready => Ok(child.spawned_at().elapsed()),
            ReadinessEvent::Closed => {
                let remaining = self
                    .config
                    .ready_timeout
                    .saturating_sub(waiting_since.elapsed());
                let outcome = match reap_within(child.pid(), remaining)? {
                    Some(outcome) => outcome,
                    None => {
                        warn!(pid, "Readiness channel closed but child still running");
                        self.abort(child)
                            .unwrap_or(ExitOutcome::Signaled(Signal::SIGKILL.number()))
                    }
                };
                error!(pid, %outcome, "Child exited before becoming ready");
                Err(SupervisorError::ChildNotReady { pid, outcome })
            }
            ReadinessEvent::TimedOut => {
                error!(pid, timeout_ms = self.config.ready_timeout.as_millis() as u64, "Readiness timed out");
                self.abort(child);
                Err(SupervisorError::ReadinessTimeout {
                    pid,
                    timeout: self.config.ready_timeout,
                })
            }
            ReadinessEvent::Failed(source) => {
                error!(pid, error = %source, "Readiness channel failed");
                self.abort(child);
                Err(SupervisorError::ReadinessFailed { pid, source })
            }
        }
    }

    fn deliver(&self, child: &ChildHandle) -> SupervisorResult<u32> {
        if !self.config.deliver {
            debug!(pid = child.raw_pid(), "Signal delivery disabled");
            return Ok(0);
        }

        let signal = self.config.runner.signal;
        for sent in 0..self.config.signal_count {
            if let Err(e) = self.delivery.send(child.raw_pid(), signal) {
                error!(pid = child.raw_pid(), sent, error = %e, "Aborting run");
                self.abort(child);
                return Err(e.into());
            }
        }

        info!(pid = child.raw_pid(), signal = signal.name(), count = self.config.signal_count, "Signal sent");
        Ok(self.config.signal_count)
    }

    /// Kill and reap after a failed step; errors are logged, not returned
    fn abort(&self, child: &ChildHandle) -> Option<ExitOutcome> {
        if let Err(e) = self.delivery.send(child.raw_pid(), Signal::SIGKILL) {
            warn!(pid = child.raw_pid(), error = %e, "Failed to kill child");
        }
        match reap(child.pid()) {
            Ok(outcome) => {
                debug!(pid = child.raw_pid(), %outcome, "Aborted child reaped");
                Some(outcome)
            }
            Err(e) => {
                warn!(pid = child.raw_pid(), error = %e, "Failed to reap aborted child");
                None
            }
        }
    }
}

/// Block until `pid` terminates
pub fn reap(pid: NixPid) -> SupervisorResult<ExitOutcome> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => match terminal_outcome(status) {
                Some(outcome) => return Ok(outcome),
                None => debug!(?status, "Ignoring non-terminal wait status"),
            },
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(wait_failed(pid, errno)),
        }
    }
}

/// Reap `pid` if it terminates within `timeout`
///
/// Returns `None` when the child is still running once `timeout` has passed.
/// The status is checked at least once, even for a zero timeout.
pub fn reap_within(pid: NixPid, timeout: Duration) -> SupervisorResult<Option<ExitOutcome>> {
    let deadline = Instant::now() + timeout;
    loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(None);
                }
                std::thread::sleep(REAP_POLL_INTERVAL.min(deadline - now));
            }
            Ok(status) => {
                if let Some(outcome) = terminal_outcome(status) {
                    return Ok(Some(outcome));
                }
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(wait_failed(pid, errno)),
        }
    }
}

fn terminal_outcome(status: WaitStatus) -> Option<ExitOutcome> {
    match status {
        WaitStatus::Exited(_, code) => Some(ExitOutcome::Exited(code)),
        WaitStatus::Signaled(_, signal, _) => Some(ExitOutcome::Signaled(signal as i32)),
        _ => None,
    }
}

fn wait_failed(pid: NixPid, errno: Errno) -> SupervisorError {
    SupervisorError::WaitFailed {
        pid: pid.as_raw(),
        errno,
    }
}
