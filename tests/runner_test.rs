/*!
 * Task Runner Tests
 * In-process polling loop: latency bounds and handler cleanup
 */

use nix::sys::signal::raise;
use serial_test::serial;
use sigsup::core::limits::EXIT_CLEAN;
use sigsup::runner::{NoopNotifier, RunnerConfig, RunnerError, TaskRunner};
use sigsup::signals::{is_registered, HandlerGuard, Signal};
use std::time::{Duration, Instant};

#[test]
#[serial]
fn test_deadline_bounds_loop_duration() {
    let deadline = Duration::from_millis(100);
    let quantum = Duration::from_millis(10);
    let runner = TaskRunner::new(
        RunnerConfig::new()
            .with_deadline(deadline)
            .with_quantum(quantum)
            .with_signal(Signal::SIGUSR2),
    );

    let started = Instant::now();
    let err = runner.run(NoopNotifier).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, RunnerError::DeadlineExceeded { deadline: d } if d == deadline));
    assert!(elapsed >= deadline);
    // one quantum past the deadline, plus scheduler slack
    assert!(elapsed < deadline + quantum + Duration::from_millis(50), "took {:?}", elapsed);
    assert!(!is_registered(Signal::SIGUSR2));
}

#[test]
#[serial]
fn test_signal_observed_within_one_quantum() {
    let quantum = Duration::from_millis(10);
    let runner = TaskRunner::new(
        RunnerConfig::new()
            .with_quantum(quantum)
            .with_signal(Signal::SIGUSR1),
    );
    let guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();
    let flag = guard.flag();

    let (raised_tx, raised_rx) = flume::bounded(1);
    let raiser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(25));
        raise(Signal::SIGUSR1.to_nix()).unwrap();
        raised_tx.send(Instant::now()).unwrap();
    });

    let outcome = runner.poll(flag).unwrap();
    let stopped = Instant::now();
    let raised_at = raised_rx.recv().unwrap();
    raiser.join().unwrap();

    assert!(outcome.iterations >= 1);
    assert_eq!(outcome.deliveries, 1);
    assert!(stopped.duration_since(raised_at) <= quantum + Duration::from_millis(50));
}

#[test]
#[serial]
fn test_repeated_signals_before_poll() {
    let runner = TaskRunner::new(RunnerConfig::new().with_signal(Signal::SIGUSR1));
    let guard = HandlerGuard::install(Signal::SIGUSR1).unwrap();

    raise(Signal::SIGUSR1.to_nix()).unwrap();
    raise(Signal::SIGUSR1.to_nix()).unwrap();

    let outcome = runner.poll(guard.flag()).unwrap();
    assert_eq!(outcome.iterations, 0);
    assert_eq!(outcome.deliveries, 2);
    assert_eq!(outcome.exit_code(), EXIT_CLEAN);
}
