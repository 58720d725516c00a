/*!
 * Exec Launcher Tests
 * Supervised runs against the compiled `sigsup child` binary, and the CLI
 */

use serial_test::serial;
use sigsup::core::limits::{EXIT_CLEAN, EXIT_DEADLINE_EXCEEDED};
use sigsup::{ExecLauncher, ExitOutcome, Signal, SupervisionResult, Supervisor, SupervisorConfig};
use std::process::Command;
use std::time::Duration;

const BIN: &str = env!("CARGO_BIN_EXE_sigsup");

fn exec_supervisor(config: SupervisorConfig) -> Supervisor<ExecLauncher> {
    Supervisor::new(config).with_launcher(ExecLauncher::new(BIN))
}

#[test]
#[serial]
fn test_exec_child_shuts_down_cleanly() {
    let result = exec_supervisor(SupervisorConfig::new()).verify().unwrap();

    assert_eq!(result.launcher, "exec");
    assert_eq!(result.outcome, ExitOutcome::Exited(EXIT_CLEAN));
    assert!(result.elapsed < Duration::from_secs(2), "took {:?}", result.elapsed);
}

#[test]
#[serial]
fn test_exec_child_hits_deadline() {
    let config = SupervisorConfig::new()
        .with_deadline(Duration::from_millis(200))
        .without_signal();

    let result = exec_supervisor(config).supervise().unwrap();

    assert_eq!(result.outcome, ExitOutcome::Exited(EXIT_DEADLINE_EXCEEDED));
    assert!(result.elapsed >= Duration::from_millis(200));
}

#[test]
#[serial]
fn test_exec_child_with_sigterm_twice() {
    let config = SupervisorConfig::new()
        .with_signal(Signal::SIGTERM)
        .with_signal_count(2);

    let result = exec_supervisor(config).verify().unwrap();
    assert_eq!(result.signals_sent, 2);
}

#[test]
#[serial]
fn test_cli_run_prints_json() {
    let output = Command::new(BIN)
        .args(["run", "--json", "--quantum-ms", "5"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result: SupervisionResult = serde_json::from_slice(&output.stdout).unwrap();
    assert!(result.is_clean());
    assert_eq!(result.launcher, "fork");
}

#[test]
#[serial]
fn test_cli_run_without_signal_fails() {
    let output = Command::new(BIN)
        .args(["run", "--no-signal", "--deadline-ms", "100", "--launcher", "exec"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("exited with status 1"), "stdout: {}", stdout);
}

#[test]
fn test_cli_rejects_unknown_signal() {
    let output = Command::new(BIN)
        .args(["run", "--signal", "NOPE"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("NOPE"));
}
