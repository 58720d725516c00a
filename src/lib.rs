/*!
 * sigsup
 *
 * Supervised subprocess lifecycle: a parent spawns a child, the child installs
 * an interrupt handler and reports readiness, the parent signals it, reaps it,
 * and checks that it shut down cleanly.
 *
 * ```no_run
 * use sigsup::{Supervisor, SupervisorConfig};
 *
 * let result = Supervisor::new(SupervisorConfig::new()).verify()?;
 * assert_eq!(result.exit_code(), Some(0));
 * # Ok::<(), sigsup::SupervisorError>(())
 * ```
 */

#[cfg(not(unix))]
compile_error!("sigsup relies on fork(2), sigaction(2) and waitpid(2) and only builds on unix");

pub mod core;
pub mod monitoring;
pub mod runner;
pub mod signals;
pub mod supervisor;

// Re-exports
pub use crate::core::errors::{SigsupError, SigsupResult};
pub use monitoring::init_tracing;
pub use runner::{RunnerConfig, RunnerError, RunnerOutcome, TaskRunner};
pub use signals::{CancelFlag, HandlerGuard, Signal, SignalError};
pub use supervisor::{
    ExecLauncher, ExitOutcome, ForkLauncher, Launcher, SupervisionResult, Supervisor,
    SupervisorConfig, SupervisorError,
};
