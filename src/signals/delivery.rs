/*!
 * OS Signal Delivery
 * Sends signals to other processes with kill(2)
 */

use super::traits::SignalDelivery;
use super::types::{Signal, SignalError, SignalResult};
use nix::sys::signal::kill;
use nix::unistd::Pid as NixPid;
use tracing::{debug, warn};

/// Delivers signals through the host kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignalDelivery;

impl OsSignalDelivery {
    pub fn new() -> Self {
        Self
    }
}

impl SignalDelivery for OsSignalDelivery {
    fn send(&self, pid: i32, signal: Signal) -> SignalResult<()> {
        match kill(NixPid::from_raw(pid), signal.to_nix()) {
            Ok(()) => {
                debug!(pid, signal = signal.name(), "Signal delivered");
                Ok(())
            }
            Err(errno) => {
                warn!(pid, signal = signal.name(), error = %errno, "Signal delivery failed");
                Err(SignalError::Delivery { signal, pid, errno })
            }
        }
    }

    fn probe(&self, pid: i32) -> bool {
        kill(NixPid::from_raw(pid), None).is_ok()
    }
}
