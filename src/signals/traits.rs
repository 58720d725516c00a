/*!
 * Signal Traits
 * Signal delivery abstraction
 */

use super::types::{Signal, SignalResult};

/// Signal delivery interface
pub trait SignalDelivery: Send + Sync {
    /// Send a signal to an OS process
    fn send(&self, pid: i32, signal: Signal) -> SignalResult<()>;

    /// Check whether a process exists and may be signalled
    fn probe(&self, pid: i32) -> bool;
}
