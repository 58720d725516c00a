/*!
 * Error Types
 * Unified error type over the per-module error enums, with miette diagnostics
 */

use miette::Diagnostic;
use thiserror::Error;

pub use crate::runner::RunnerError;
pub use crate::signals::SignalError;
pub use crate::supervisor::SupervisorError;

/// Unified error type
#[derive(Error, Debug, Diagnostic)]
pub enum SigsupError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(sigsup::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(sigsup::serialization))]
    Serialization(#[from] serde_json::Error),
}

/// Result alias over the unified error
pub type SigsupResult<T> = Result<T, SigsupError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signal;
    use miette::Diagnostic;

    #[test]
    fn test_diagnostic_code_passes_through() {
        let err: SigsupError = SignalError::Uncatchable(Signal::SIGKILL).into();
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("signal::uncatchable"));
    }

    #[test]
    fn test_report_failures_carry_codes() {
        let err: SigsupError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert_eq!(err.code().map(|c| c.to_string()).as_deref(), Some("sigsup::io"));

        let err: SigsupError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, SigsupError::Serialization(_)));
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("sigsup::serialization")
        );
    }

    #[test]
    fn test_supervisor_error_into_report() {
        let err: SigsupError = SupervisorError::InvalidConfig("zero timeout".to_string()).into();
        let report = miette::Report::new(err);
        assert!(report.to_string().contains("zero timeout"));
    }
}
