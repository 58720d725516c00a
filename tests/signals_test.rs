/*!
 * Signal System Tests
 * Signal identities, scoped handler registration, and delivery
 */

use nix::sys::signal::{raise, sigaction, SaFlags, SigAction, SigHandler, SigSet};
use proptest::prelude::*;
use serial_test::serial;
use sigsup::signals::{is_registered, HandlerGuard, Signal, SignalError};

#[test]
fn test_signal_from_number() {
    for signal in Signal::ALL {
        assert_eq!(Signal::from_number(signal.number()).unwrap(), signal);
    }
    assert!(Signal::from_number(-1).is_err());
}

#[test]
fn test_signal_properties() {
    // SIGKILL and SIGSTOP cannot be caught
    assert!(!Signal::SIGKILL.can_catch());
    assert!(!Signal::SIGSTOP.can_catch());
    assert!(Signal::SIGINT.can_catch());
    assert!(Signal::SIGUSR1.can_catch());

    // Fatal signals
    assert!(Signal::SIGKILL.is_fatal());
    assert!(Signal::SIGTERM.is_fatal());
    assert!(!Signal::SIGINT.is_fatal());
    assert!(!Signal::SIGCHLD.is_fatal());

    assert_eq!(Signal::SIGINT.description(), "Interrupt");
}

proptest! {
    #[test]
    fn prop_names_parse_in_any_case(idx in 0usize..Signal::ALL.len(), lower in any::<bool>(), prefixed in any::<bool>()) {
        let signal = Signal::ALL[idx];
        let mut name = if prefixed { signal.name().to_string() } else { signal.short_name().to_string() };
        if lower {
            name = name.to_ascii_lowercase();
        }
        prop_assert_eq!(name.parse::<Signal>().unwrap(), signal);
    }

    #[test]
    fn prop_garbage_names_rejected(name in "[a-z]{6,12}") {
        let is_known = Signal::ALL
            .iter()
            .any(|s| s.short_name().eq_ignore_ascii_case(&name) || s.name().eq_ignore_ascii_case(&name));
        prop_assume!(!is_known);
        prop_assert!(matches!(name.parse::<Signal>(), Err(SignalError::UnknownName(_))));
    }
}

fn current_handler(signal: Signal) -> SigHandler {
    // Read the disposition by swapping in SIG_DFL and putting it right back.
    let probe = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    let current = unsafe { sigaction(signal.to_nix(), &probe) }.unwrap();
    unsafe { sigaction(signal.to_nix(), &current) }.unwrap();
    current.handler()
}

#[test]
#[serial]
fn test_guard_restores_previous_disposition() {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    let original = unsafe { sigaction(Signal::SIGUSR2.to_nix(), &ignore) }.unwrap();

    {
        let guard = HandlerGuard::install(Signal::SIGUSR2).unwrap();
        assert!(matches!(current_handler(Signal::SIGUSR2), SigHandler::Handler(_)));
        assert!(is_registered(Signal::SIGUSR2));
        drop(guard);
    }

    assert_eq!(current_handler(Signal::SIGUSR2), SigHandler::SigIgn);
    assert!(!is_registered(Signal::SIGUSR2));

    unsafe { sigaction(Signal::SIGUSR2.to_nix(), &original) }.unwrap();
}

#[test]
#[serial]
fn test_guard_restores_on_panic() {
    let outcome = std::panic::catch_unwind(|| {
        let _guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();
        panic!("loop body failed");
    });

    assert!(outcome.is_err());
    assert!(!is_registered(Signal::SIGUSR1));
    assert_eq!(current_handler(Signal::SIGUSR1), SigHandler::SigDfl);
}

#[test]
#[serial]
fn test_second_delivery_keeps_flag_set() {
    let guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();
    let flag = guard.flag();

    raise(Signal::SIGUSR1.to_nix()).unwrap();
    assert!(flag.is_cancelled());
    raise(Signal::SIGUSR1.to_nix()).unwrap();

    assert!(flag.is_cancelled());
    assert_eq!(flag.deliveries(), 2);
    assert_eq!(flag.signal(), Signal::SIGUSR1);
}

#[test]
fn test_uncatchable_signals_rejected() {
    for signal in [Signal::SIGKILL, Signal::SIGSTOP] {
        assert_eq!(
            HandlerGuard::install(signal).unwrap_err(),
            SignalError::Uncatchable(signal)
        );
        assert!(!is_registered(signal));
    }
}
