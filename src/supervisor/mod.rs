/*!
 * Supervisor Module
 * Parent side of the supervised lifecycle: spawn, handshake, signal, reap
 */

mod config;
mod launcher;
mod manager;
mod readiness;
pub mod traits;
pub mod types;

pub use config::SupervisorConfig;
pub use launcher::{ExecLauncher, ForkLauncher};
pub use manager::{reap, reap_within, Supervisor};
pub use readiness::{await_ready, ReadinessEvent};
pub use traits::Launcher;
pub use types::{ChildHandle, ExitOutcome, SupervisionResult, SupervisorError, SupervisorResult};
