/*!
 * Signal Handler Registration
 *
 * Process-wide handler slots with scoped (RAII) registration.
 *
 * Each catchable signal owns one slot holding an atomic cancellation flag and
 * a delivery counter. The installed handler only touches those atomics, so it
 * is async-signal-safe and may preempt the polling loop at any point.
 *
 * Nothing in this module logs or allocates: it also runs inside forked
 * children, where only async-signal-safe work is allowed.
 */

use super::types::{Signal, SignalError, SignalResult};
use crate::core::limits::SIGNAL_SLOTS;
use nix::libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Per-signal state shared between the handler and the polling loop
struct Slot {
    registered: AtomicBool,
    cancelled: AtomicBool,
    deliveries: AtomicU32,
}

impl Slot {
    const fn new() -> Self {
        Self {
            registered: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            deliveries: AtomicU32::new(0),
        }
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.deliveries.store(0, Ordering::SeqCst);
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY_SLOT: Slot = Slot::new();

static SLOTS: [Slot; SIGNAL_SLOTS] = [EMPTY_SLOT; SIGNAL_SLOTS];

fn slot_for(signal: Signal) -> SignalResult<&'static Slot> {
    usize::try_from(signal.number())
        .ok()
        .and_then(|idx| SLOTS.get(idx))
        .ok_or(SignalError::InvalidSignal(signal.number()))
}

extern "C" fn on_signal(signo: c_int) {
    if let Some(slot) = usize::try_from(signo).ok().and_then(|idx| SLOTS.get(idx)) {
        slot.deliveries.fetch_add(1, Ordering::SeqCst);
        slot.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Read-only view of a slot's cancellation state
///
/// Cheap to copy and safe to move to other threads; all reads go through
/// sequentially consistent atomics.
#[derive(Clone, Copy)]
pub struct CancelFlag {
    signal: Signal,
    slot: &'static Slot,
}

impl CancelFlag {
    /// Whether the signal has been delivered since registration
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.slot.cancelled.load(Ordering::SeqCst)
    }

    /// Number of deliveries observed since registration
    ///
    /// Signals of the same kind that arrive while one is pending may be
    /// coalesced by the kernel, so this is a lower bound on signals sent.
    #[inline]
    pub fn deliveries(&self) -> u32 {
        self.slot.deliveries.load(Ordering::SeqCst)
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }
}

impl std::fmt::Debug for CancelFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelFlag")
            .field("signal", &self.signal)
            .field("cancelled", &self.is_cancelled())
            .field("deliveries", &self.deliveries())
            .finish()
    }
}

/// Scoped handler registration
///
/// Installing the guard replaces the current disposition of `signal` with a
/// handler that sets the slot's cancellation flag. Dropping it restores the
/// previous disposition and frees the slot, on every exit path.
pub struct HandlerGuard {
    signal: Signal,
    slot: &'static Slot,
    previous: Option<SigAction>,
}

impl HandlerGuard {
    /// Install the flag-setting handler for `signal`
    pub fn install(signal: Signal) -> SignalResult<Self> {
        if !signal.can_catch() {
            return Err(SignalError::Uncatchable(signal));
        }

        let slot = slot_for(signal)?;
        if slot
            .registered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SignalError::HandlerBusy(signal));
        }
        slot.reset();

        let action = SigAction::new(
            SigHandler::Handler(on_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );

        // SAFETY: on_signal only performs atomic operations on static data.
        match unsafe { sigaction(signal.to_nix(), &action) } {
            Ok(previous) => Ok(Self {
                signal,
                slot,
                previous: Some(previous),
            }),
            Err(errno) => {
                slot.registered.store(false, Ordering::SeqCst);
                Err(SignalError::Install { signal, errno })
            }
        }
    }

    pub fn flag(&self) -> CancelFlag {
        CancelFlag {
            signal: self.signal,
            slot: self.slot,
        }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Restore the previous disposition, reporting failure
    pub fn release(mut self) -> SignalResult<()> {
        self.restore()
    }

    fn restore(&mut self) -> SignalResult<()> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };

        // SAFETY: restores the disposition that was active before install.
        let restored = unsafe { sigaction(self.signal.to_nix(), &previous) };
        self.slot.registered.store(false, Ordering::SeqCst);
        restored
            .map(|_| ())
            .map_err(|errno| SignalError::Install {
                signal: self.signal,
                errno,
            })
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        // May run in a forked child: no logging here.
        let _ = self.restore();
    }
}

impl std::fmt::Debug for HandlerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerGuard")
            .field("signal", &self.signal)
            .field("active", &self.previous.is_some())
            .finish()
    }
}

/// Whether a handler guard currently owns the slot for `signal`
pub fn is_registered(signal: Signal) -> bool {
    slot_for(signal)
        .map(|slot| slot.registered.load(Ordering::SeqCst))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::raise;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_raise_sets_flag() {
        let guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();
        let flag = guard.flag();
        assert!(!flag.is_cancelled());

        raise(Signal::SIGUSR1.to_nix()).unwrap();

        assert!(flag.is_cancelled());
        assert_eq!(flag.deliveries(), 1);
    }

    #[test]
    #[serial]
    fn test_slot_is_exclusive() {
        let guard = HandlerGuard::install(Signal::SIGUSR2).unwrap();
        assert_eq!(
            HandlerGuard::install(Signal::SIGUSR2).unwrap_err(),
            SignalError::HandlerBusy(Signal::SIGUSR2)
        );
        drop(guard);
        assert!(!is_registered(Signal::SIGUSR2));
        HandlerGuard::install(Signal::SIGUSR2).unwrap();
    }

    #[test]
    fn test_uncatchable_rejected() {
        assert_eq!(
            HandlerGuard::install(Signal::SIGKILL).unwrap_err(),
            SignalError::Uncatchable(Signal::SIGKILL)
        );
        assert_eq!(
            HandlerGuard::install(Signal::SIGSTOP).unwrap_err(),
            SignalError::Uncatchable(Signal::SIGSTOP)
        );
    }

    #[test]
    #[serial]
    fn test_reinstall_resets_flag() {
        let guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();
        raise(Signal::SIGUSR1.to_nix()).unwrap();
        guard.release().unwrap();

        let guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();
        assert!(!guard.flag().is_cancelled());
        assert_eq!(guard.flag().deliveries(), 0);
    }
}
