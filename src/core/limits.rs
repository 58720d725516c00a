/*!
 * Supervision Limits and Constants
 *
 * Centralized location for timing defaults, exit codes, and magic numbers.
 * Organized by domain for maintainability and discoverability.
 *
 * - Latency-critical constants are marked with [PERF]
 * - Values mirrored by the child binary's CLI are marked with [WIRE]
 */

use std::time::Duration;

// =============================================================================
// CHILD TASK RUNNER
// =============================================================================

/// Default deadline for the child's polling loop (5s)
/// Measured from loop start, not from spawn
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Deadline used by the quick preset (200ms)
/// Short enough to exercise the deadline-exceeded path in tests
pub const QUICK_DEADLINE: Duration = Duration::from_millis(200);

/// Deadline used by the relaxed preset (30s)
pub const RELAXED_DEADLINE: Duration = Duration::from_secs(30);

/// Polling quantum between cancellation checks (10ms)
/// [PERF] Upper bound on the latency between signal delivery and shutdown
pub const DEFAULT_POLL_QUANTUM: Duration = Duration::from_millis(10);

/// Smallest accepted polling quantum (1ms)
pub const MIN_POLL_QUANTUM: Duration = Duration::from_millis(1);

// =============================================================================
// PARENT SUPERVISOR
// =============================================================================

/// Maximum time the parent waits for the child's readiness byte (2s)
/// On expiry the child is killed and reaped
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(2);

/// Readiness timeout for the relaxed preset (10s)
pub const RELAXED_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between non-blocking wait checks when a child closed its
/// readiness channel without exiting (5ms)
pub const REAP_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Upper bound on repeated signal deliveries per run
pub const MAX_SIGNAL_COUNT: u32 = 64;

/// Byte written by the child once its handler is installed
/// [WIRE]
pub const READY_BYTE: u8 = b'R';

// =============================================================================
// EXIT CODES
// =============================================================================

/// Child observed cancellation and shut down cleanly
pub const EXIT_CLEAN: i32 = 0;

/// Child ran past its deadline without observing cancellation
pub const EXIT_DEADLINE_EXCEEDED: i32 = 1;

/// Child could not install its handler or report readiness
pub const EXIT_SETUP_FAILED: i32 = 2;

// =============================================================================
// SIGNAL SLOTS
// =============================================================================

/// Number of handler slots, indexed by signal number
/// Covers the classic (non-realtime) signal range
pub const SIGNAL_SLOTS: usize = 32;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// [WIRE]
pub const ENV_DEADLINE_MS: &str = "SIGSUP_DEADLINE_MS";
/// [WIRE]
pub const ENV_QUANTUM_MS: &str = "SIGSUP_QUANTUM_MS";
pub const ENV_READY_TIMEOUT_MS: &str = "SIGSUP_READY_TIMEOUT_MS";
pub const ENV_TRACE_JSON: &str = "SIGSUP_TRACE_JSON";
