/*!
 * Signal Types
 * UNIX-style signal definitions and result types
 */

use nix::errno::Errno;
use nix::sys::signal::Signal as NixSignal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Signal operation result
pub type SignalResult<T> = Result<T, SignalError>;

/// Signal errors
#[derive(Error, Debug, Clone, PartialEq, Eq, miette::Diagnostic)]
pub enum SignalError {
    #[error("Invalid signal number: {0}")]
    #[diagnostic(code(signal::invalid_number))]
    InvalidSignal(i32),

    #[error("Unknown signal name: {0}")]
    #[diagnostic(
        code(signal::unknown_name),
        help("Use a name like INT, SIGTERM or USR1, or a signal number.")
    )]
    UnknownName(String),

    #[error("Signal {0} cannot be caught")]
    #[diagnostic(
        code(signal::uncatchable),
        help("SIGKILL and SIGSTOP cannot have handlers installed.")
    )]
    Uncatchable(Signal),

    #[error("A handler for {0} is already registered in this process")]
    #[diagnostic(
        code(signal::handler_busy),
        help("Drop the existing HandlerGuard before registering another one.")
    )]
    HandlerBusy(Signal),

    #[error("Failed to install handler for {signal}: {errno}")]
    #[diagnostic(code(signal::install_failed))]
    Install { signal: Signal, errno: Errno },

    #[error("Failed to deliver {signal} to pid {pid}: {errno}")]
    #[diagnostic(
        code(signal::delivery_failed),
        help("The target may have exited already or belong to another user.")
    )]
    Delivery { signal: Signal, pid: i32, errno: Errno },
}

/// UNIX-style signals
///
/// Numbers are resolved through the host platform, so the same variant maps
/// to the right number on Linux and the BSDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Hangup detected on controlling terminal or death of controlling process
    SIGHUP,
    /// Interrupt from keyboard (Ctrl+C)
    SIGINT,
    /// Quit from keyboard (Ctrl+\)
    SIGQUIT,
    /// Illegal instruction
    SIGILL,
    /// Trace/breakpoint trap
    SIGTRAP,
    /// Abort signal
    SIGABRT,
    /// Bus error (bad memory access)
    SIGBUS,
    /// Floating-point exception
    SIGFPE,
    /// Kill signal (cannot be caught or ignored)
    SIGKILL,
    /// User-defined signal 1
    SIGUSR1,
    /// Invalid memory reference
    SIGSEGV,
    /// User-defined signal 2
    SIGUSR2,
    /// Broken pipe
    SIGPIPE,
    /// Timer signal
    SIGALRM,
    /// Termination signal
    SIGTERM,
    /// Child process stopped or terminated
    SIGCHLD,
    /// Continue if stopped
    SIGCONT,
    /// Stop process (cannot be caught or ignored)
    SIGSTOP,
    /// Stop typed at terminal (Ctrl+Z)
    SIGTSTP,
    /// Terminal input for background process
    SIGTTIN,
    /// Terminal output for background process
    SIGTTOU,
    /// Urgent condition on socket
    SIGURG,
    /// CPU time limit exceeded
    SIGXCPU,
    /// File size limit exceeded
    SIGXFSZ,
    /// Virtual alarm clock
    SIGVTALRM,
    /// Profiling timer expired
    SIGPROF,
    /// Window resize signal
    SIGWINCH,
    /// I/O now possible
    SIGIO,
    /// Bad system call
    SIGSYS,
}

impl Signal {
    pub const ALL: [Signal; 29] = [
        Signal::SIGHUP,
        Signal::SIGINT,
        Signal::SIGQUIT,
        Signal::SIGILL,
        Signal::SIGTRAP,
        Signal::SIGABRT,
        Signal::SIGBUS,
        Signal::SIGFPE,
        Signal::SIGKILL,
        Signal::SIGUSR1,
        Signal::SIGSEGV,
        Signal::SIGUSR2,
        Signal::SIGPIPE,
        Signal::SIGALRM,
        Signal::SIGTERM,
        Signal::SIGCHLD,
        Signal::SIGCONT,
        Signal::SIGSTOP,
        Signal::SIGTSTP,
        Signal::SIGTTIN,
        Signal::SIGTTOU,
        Signal::SIGURG,
        Signal::SIGXCPU,
        Signal::SIGXFSZ,
        Signal::SIGVTALRM,
        Signal::SIGPROF,
        Signal::SIGWINCH,
        Signal::SIGIO,
        Signal::SIGSYS,
    ];

    /// Convert from the host's signal number
    pub fn from_number(n: i32) -> SignalResult<Self> {
        let nix = NixSignal::try_from(n).map_err(|_| SignalError::InvalidSignal(n))?;
        Self::from_nix(nix).ok_or(SignalError::InvalidSignal(n))
    }

    /// Host signal number
    pub fn number(&self) -> i32 {
        self.to_nix() as i32
    }

    /// Name without the `SIG` prefix, e.g. `INT`
    pub fn short_name(&self) -> &'static str {
        &self.name()[3..]
    }

    /// Full name, e.g. `SIGINT`
    pub fn name(&self) -> &'static str {
        self.to_nix().as_str()
    }

    /// Check if signal can be caught/blocked
    pub fn can_catch(&self) -> bool {
        !matches!(self, Signal::SIGKILL | Signal::SIGSTOP)
    }

    /// Check if signal is fatal by default
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Signal::SIGKILL
                | Signal::SIGTERM
                | Signal::SIGQUIT
                | Signal::SIGABRT
                | Signal::SIGSEGV
                | Signal::SIGILL
                | Signal::SIGBUS
                | Signal::SIGFPE
                | Signal::SIGSYS
        )
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Signal::SIGHUP => "Hangup",
            Signal::SIGINT => "Interrupt",
            Signal::SIGQUIT => "Quit",
            Signal::SIGILL => "Illegal instruction",
            Signal::SIGTRAP => "Trace/breakpoint trap",
            Signal::SIGABRT => "Aborted",
            Signal::SIGBUS => "Bus error",
            Signal::SIGFPE => "Floating point exception",
            Signal::SIGKILL => "Killed",
            Signal::SIGUSR1 => "User defined signal 1",
            Signal::SIGSEGV => "Segmentation fault",
            Signal::SIGUSR2 => "User defined signal 2",
            Signal::SIGPIPE => "Broken pipe",
            Signal::SIGALRM => "Alarm clock",
            Signal::SIGTERM => "Terminated",
            Signal::SIGCHLD => "Child status changed",
            Signal::SIGCONT => "Continued",
            Signal::SIGSTOP => "Stopped (signal)",
            Signal::SIGTSTP => "Stopped",
            Signal::SIGTTIN => "Stopped (tty input)",
            Signal::SIGTTOU => "Stopped (tty output)",
            Signal::SIGURG => "Urgent I/O condition",
            Signal::SIGXCPU => "CPU time limit exceeded",
            Signal::SIGXFSZ => "File size limit exceeded",
            Signal::SIGVTALRM => "Virtual timer expired",
            Signal::SIGPROF => "Profiling timer expired",
            Signal::SIGWINCH => "Window size changed",
            Signal::SIGIO => "I/O possible",
            Signal::SIGSYS => "Bad system call",
        }
    }

    pub fn to_nix(self) -> NixSignal {
        match self {
            Signal::SIGHUP => NixSignal::SIGHUP,
            Signal::SIGINT => NixSignal::SIGINT,
            Signal::SIGQUIT => NixSignal::SIGQUIT,
            Signal::SIGILL => NixSignal::SIGILL,
            Signal::SIGTRAP => NixSignal::SIGTRAP,
            Signal::SIGABRT => NixSignal::SIGABRT,
            Signal::SIGBUS => NixSignal::SIGBUS,
            Signal::SIGFPE => NixSignal::SIGFPE,
            Signal::SIGKILL => NixSignal::SIGKILL,
            Signal::SIGUSR1 => NixSignal::SIGUSR1,
            Signal::SIGSEGV => NixSignal::SIGSEGV,
            Signal::SIGUSR2 => NixSignal::SIGUSR2,
            Signal::SIGPIPE => NixSignal::SIGPIPE,
            Signal::SIGALRM => NixSignal::SIGALRM,
            Signal::SIGTERM => NixSignal::SIGTERM,
            Signal::SIGCHLD => NixSignal::SIGCHLD,
            Signal::SIGCONT => NixSignal::SIGCONT,
            Signal::SIGSTOP => NixSignal::SIGSTOP,
            Signal::SIGTSTP => NixSignal::SIGTSTP,
            Signal::SIGTTIN => NixSignal::SIGTTIN,
            Signal::SIGTTOU => NixSignal::SIGTTOU,
            Signal::SIGURG => NixSignal::SIGURG,
            Signal::SIGXCPU => NixSignal::SIGXCPU,
            Signal::SIGXFSZ => NixSignal::SIGXFSZ,
            Signal::SIGVTALRM => NixSignal::SIGVTALRM,
            Signal::SIGPROF => NixSignal::SIGPROF,
            Signal::SIGWINCH => NixSignal::SIGWINCH,
            Signal::SIGIO => NixSignal::SIGIO,
            Signal::SIGSYS => NixSignal::SIGSYS,
        }
    }

    pub fn from_nix(signal: NixSignal) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.to_nix() == signal)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.number())
    }
}

impl FromStr for Signal {
    type Err = SignalError;

    /// Accepts `INT`, `SIGINT`, `int` or a signal number
    fn from_str(s: &str) -> SignalResult<Self> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i32>() {
            return Self::from_number(n);
        }

        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        Self::ALL
            .into_iter()
            .find(|s| s.short_name() == bare)
            .ok_or_else(|| SignalError::UnknownName(s.to_string()))
    }
}

impl From<Signal> for NixSignal {
    fn from(signal: Signal) -> Self {
        signal.to_nix()
    }
}
