/*!
 * Runner Traits
 */

use std::io;

/// Tells the parent that the handler is installed
///
/// Implementations used inside a forked child must stay async-signal-safe:
/// a single `write(2)` and nothing that allocates or locks.
pub trait ReadyNotifier {
    fn notify(&mut self) -> io::Result<()>;
}
