/*!
 * Supervisor Traits
 */

use super::types::{ChildHandle, SupervisorResult};
use crate::runner::RunnerConfig;

/// Spawns a child running the task runner
///
/// The returned handle carries the OS pid (known synchronously) and the read
/// end of the readiness channel.
pub trait Launcher: Send + Sync {
    /// Short name for logs and results
    fn name(&self) -> &'static str;

    fn launch(&self, config: &RunnerConfig) -> SupervisorResult<ChildHandle>;
}
