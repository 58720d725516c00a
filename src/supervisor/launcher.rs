/*!
 * Child Launchers
 *
 * - `ForkLauncher`: fork the current process and run the runner in the copy
 * - `ExecLauncher`: spawn a program that runs `child` (normally this crate's
 *   own binary), with readiness reported on its stdout
 */

use super::traits::Launcher;
use super::types::{ChildHandle, SupervisorError, SupervisorResult};
use crate::runner::{PipeNotifier, RunnerConfig, TaskRunner};
use nix::unistd::{fork, ForkResult, Pid as NixPid};
use std::os::fd::OwnedFd;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Forks the current process; the child runs `TaskRunner` and `_exit`s
#[derive(Debug, Clone, Copy, Default)]
pub struct ForkLauncher;

impl ForkLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ForkLauncher {
    fn name(&self) -> &'static str {
        "fork"
    }

    fn launch(&self, config: &RunnerConfig) -> SupervisorResult<ChildHandle> {
        let (read, write) = cloexec_pipe()
            .map_err(|e| SupervisorError::SpawnFailed(format!("readiness pipe: {}", e)))?;
        let runner = TaskRunner::new(*config);

        // SAFETY: the child only runs async-signal-safe code (sigaction,
        // atomics, write, nanosleep, clock_gettime) and leaves via _exit,
        // so no lock held by another thread at fork time is ever touched.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                drop(read);
                let code = runner.run_to_exit_code(PipeNotifier::new(write));
                // SAFETY: terminates the forked copy without running the
                // parent's atexit handlers or flushing its stdio buffers.
                unsafe { nix::libc::_exit(code) }
            }
            Ok(ForkResult::Parent { child }) => {
                drop(write);
                debug!(pid = child.as_raw(), "Forked child");
                Ok(ChildHandle::new(child, read))
            }
            Err(errno) => Err(SupervisorError::SpawnFailed(format!("fork: {}", errno))),
        }
    }
}

/// Readiness pipe with close-on-exec set on both ends
///
/// Keeps the write end out of programs other threads spawn while the child
/// runs, so the read end still sees EOF when the child dies.
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub(crate) fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(crate) fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    use std::os::fd::AsRawFd;

    let (read, write) = nix::unistd::pipe()?;
    for fd in [&read, &write] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read, write))
}

/// Spawns `program [args..] child --deadline-ms D --quantum-ms Q --signal S`
#[derive(Debug, Clone)]
pub struct ExecLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ExecLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Re-execute the running binary
    pub fn current_exe() -> SupervisorResult<Self> {
        std::env::current_exe()
            .map(Self::new)
            .map_err(|e| SupervisorError::SpawnFailed(format!("current executable: {}", e)))
    }

    /// Arguments placed before the `child` subcommand
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, config: &RunnerConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("child")
            .arg("--deadline-ms")
            .arg(config.deadline.as_millis().to_string())
            .arg("--quantum-ms")
            .arg(config.quantum.as_millis().to_string())
            .arg("--signal")
            .arg(config.signal.short_name())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl Launcher for ExecLauncher {
    fn name(&self) -> &'static str {
        "exec"
    }

    fn launch(&self, config: &RunnerConfig) -> SupervisorResult<ChildHandle> {
        let mut child = self.command(config).spawn().map_err(|e| {
            SupervisorError::SpawnFailed(format!("{}: {}", self.program.display(), e))
        })?;

        let pid = NixPid::from_raw(child.id() as i32);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SupervisorError::SpawnFailed("child stdout not captured".to_string()))?;

        debug!(pid = pid.as_raw(), program = %self.program.display(), "Spawned child");

        // Reaping goes through waitpid; the std handle is not waited on.
        Ok(ChildHandle::new(pid, OwnedFd::from(stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{OsSignalDelivery, Signal, SignalDelivery};
    use crate::supervisor::reap;
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};
    use serial_test::serial;
    use std::os::fd::AsRawFd;
    use std::time::Duration;

    fn has_cloexec(fd: &OwnedFd) -> bool {
        let flags = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFD).unwrap();
        FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC)
    }

    #[test]
    fn test_pipe_is_close_on_exec() {
        let (read, write) = cloexec_pipe().unwrap();
        assert!(has_cloexec(&read));
        assert!(has_cloexec(&write));
    }

    #[test]
    #[serial]
    fn test_fork_readiness_channel_is_close_on_exec() {
        let mut child = ForkLauncher::new().launch(&RunnerConfig::new()).unwrap();
        let ready = child.take_ready().unwrap();
        let cloexec = has_cloexec(&ready);

        OsSignalDelivery::new().send(child.raw_pid(), Signal::SIGKILL).unwrap();
        reap(child.pid()).unwrap();

        assert!(cloexec);
    }

    #[test]
    fn test_exec_command_line() {
        let launcher = ExecLauncher::new("/bin/sigsup").with_args(vec!["--quiet".to_string()]);
        let config = RunnerConfig::new()
            .with_deadline(Duration::from_millis(750))
            .with_quantum(Duration::from_millis(20))
            .with_signal(Signal::SIGTERM);

        let cmd = launcher.command(&config);
        let args: Vec<_> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(cmd.get_program(), "/bin/sigsup");
        assert_eq!(
            args,
            vec![
                "--quiet",
                "child",
                "--deadline-ms",
                "750",
                "--quantum-ms",
                "20",
                "--signal",
                "TERM"
            ]
        );
    }

    #[test]
    fn test_exec_missing_program() {
        let launcher = ExecLauncher::new("/nonexistent/sigsup-child");
        let err = launcher.launch(&RunnerConfig::new()).unwrap_err();
        assert!(matches!(err, SupervisorError::SpawnFailed(_)));
    }
}
