/*!
 * Core Module
 * Limits, constants, and the unified error type
 */

pub mod errors;
pub mod limits;

// Re-export for convenience
pub use errors::*;
