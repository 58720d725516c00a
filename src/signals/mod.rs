/*!
 * Signals Module
 * Signal identities, scoped handler registration, and delivery
 */

mod delivery;
mod handler;
pub mod traits;
pub mod types;

// Re-export public API
pub use delivery::OsSignalDelivery;
pub use handler::{is_registered, CancelFlag, HandlerGuard};
pub use traits::*;
pub use types::{Signal, SignalError, SignalResult};
