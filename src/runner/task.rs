/*!
 * Child Task Runner
 *
 * Cancellable polling loop guarded by a deadline:
 *
 * 1. Install the cancellation handler (scoped, restored on every exit path)
 * 2. Report readiness to the parent
 * 3. Poll the flag every quantum until it is set or the deadline passes
 *
 * The loop checks the flag before the deadline, so a signal that arrived
 * before the first iteration still produces a clean exit.
 */

use super::traits::ReadyNotifier;
use super::types::{RunnerConfig, RunnerError, RunnerOutcome, RunnerResult};
use crate::signals::{CancelFlag, HandlerGuard};
use std::time::Instant;

/// Runs the polling loop for one child lifetime
#[derive(Debug, Clone, Copy)]
pub struct TaskRunner {
    config: RunnerConfig,
}

impl TaskRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Install the handler, notify readiness, and poll until cancelled
    ///
    /// Async-signal-safe as long as `notifier` is; safe to call after `fork`.
    pub fn run<N: ReadyNotifier>(&self, mut notifier: N) -> RunnerResult<RunnerOutcome> {
        let guard = HandlerGuard::install(self.config.signal)?;
        notifier.notify().map_err(RunnerError::Readiness)?;
        let outcome = self.poll(guard.flag());
        drop(guard);
        outcome
    }

    /// Poll an already-registered flag until it is set or the deadline passes
    pub fn poll(&self, flag: CancelFlag) -> RunnerResult<RunnerOutcome> {
        let started = Instant::now();
        let deadline = started + self.config.deadline;
        let mut iterations = 0u64;

        loop {
            if flag.is_cancelled() {
                return Ok(RunnerOutcome {
                    iterations,
                    deliveries: flag.deliveries(),
                    elapsed: started.elapsed(),
                });
            }

            if Instant::now() > deadline {
                return Err(RunnerError::DeadlineExceeded {
                    deadline: self.config.deadline,
                });
            }

            std::thread::sleep(self.config.quantum);
            iterations += 1;
        }
    }

    /// Run to completion and map the result to a process exit code
    pub fn run_to_exit_code<N: ReadyNotifier>(&self, notifier: N) -> i32 {
        match self.run(notifier) {
            Ok(outcome) => outcome.exit_code(),
            Err(err) => err.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::limits::{EXIT_CLEAN, EXIT_DEADLINE_EXCEEDED, EXIT_SETUP_FAILED};
    use crate::runner::NoopNotifier;
    use crate::signals::{is_registered, Signal};
    use nix::sys::signal::raise;
    use serial_test::serial;
    use std::time::Duration;

    fn quick(signal: Signal) -> RunnerConfig {
        RunnerConfig::new()
            .with_deadline(Duration::from_millis(50))
            .with_quantum(Duration::from_millis(5))
            .with_signal(signal)
    }

    #[test]
    #[serial]
    fn test_signal_before_loop_exits_cleanly() {
        let runner = TaskRunner::new(quick(Signal::SIGUSR1));
        let guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();
        raise(Signal::SIGUSR1.to_nix()).unwrap();

        let outcome = runner.poll(guard.flag()).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.deliveries, 1);
    }

    #[test]
    #[serial]
    fn test_deadline_exceeded_without_signal() {
        let runner = TaskRunner::new(quick(Signal::SIGUSR2));
        let err = runner.run(NoopNotifier).unwrap_err();
        assert!(matches!(err, RunnerError::DeadlineExceeded { .. }));
        assert_eq!(err.exit_code(), EXIT_DEADLINE_EXCEEDED);
        assert!(!is_registered(Signal::SIGUSR2));
    }

    #[test]
    #[serial]
    fn test_busy_slot_is_setup_failure() {
        let _held = HandlerGuard::install(Signal::SIGUSR1).unwrap();
        let runner = TaskRunner::new(quick(Signal::SIGUSR1));
        assert_eq!(runner.run_to_exit_code(NoopNotifier), EXIT_SETUP_FAILED);
    }

    struct ChannelNotifier(flume::Sender<()>);

    impl ReadyNotifier for ChannelNotifier {
        fn notify(&mut self) -> std::io::Result<()> {
            self.0
                .send(())
                .map_err(|_| std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    #[serial]
    fn test_cancelled_from_another_thread() {
        let runner = TaskRunner::new(
            RunnerConfig::new()
                .with_deadline(Duration::from_secs(5))
                .with_signal(Signal::SIGUSR1),
        );
        let (tx, rx) = flume::bounded(1);

        let raiser = std::thread::spawn(move || {
            rx.recv().unwrap();
            raise(Signal::SIGUSR1.to_nix()).unwrap();
        });

        assert_eq!(runner.run_to_exit_code(ChannelNotifier(tx)), EXIT_CLEAN);
        raiser.join().unwrap();
    }
}
