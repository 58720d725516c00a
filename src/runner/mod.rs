/*!
 * Runner Module
 * Child side of the supervised lifecycle
 */

mod notifier;
mod task;
pub mod traits;
pub mod types;

pub use notifier::{NoopNotifier, PipeNotifier, StdoutNotifier};
pub use task::TaskRunner;
pub use traits::ReadyNotifier;
pub use types::{RunnerConfig, RunnerError, RunnerOutcome, RunnerResult};
