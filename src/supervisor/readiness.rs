/*!
 * Readiness Handshake
 *
 * Bounded wait for the child's readiness byte. A reader thread performs the
 * blocking read and hands the result over a channel, so the wait itself can
 * time out. Killing a hung child closes its end of the pipe, which lets the
 * reader thread finish on its own.
 */

use crate::core::limits::READY_BYTE;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::OwnedFd;
use std::time::Duration;
use tracing::trace;

/// Result of waiting for readiness
#[derive(Debug)]
pub enum ReadinessEvent {
    /// Readiness byte received
    Ready,
    /// Channel closed before the byte arrived
    Closed,
    /// Nothing arrived within the timeout
    TimedOut,
    /// Reading the channel failed
    Failed(io::Error),
}

/// Block until the child reports readiness or `timeout` elapses
pub fn await_ready(fd: OwnedFd, timeout: Duration) -> ReadinessEvent {
    let (tx, rx) = flume::bounded(1);

    let spawned = std::thread::Builder::new()
        .name("sigsup-ready".to_string())
        .spawn(move || {
            let _ = tx.send(read_ready(File::from(fd)));
        });

    if let Err(e) = spawned {
        return ReadinessEvent::Failed(e);
    }

    match rx.recv_timeout(timeout) {
        Ok(event) => event,
        Err(flume::RecvTimeoutError::Timeout) => ReadinessEvent::TimedOut,
        Err(flume::RecvTimeoutError::Disconnected) => ReadinessEvent::Closed,
    }
}

fn read_ready(mut pipe: File) -> ReadinessEvent {
    let mut byte = [0u8; 1];
    loop {
        match pipe.read(&mut byte) {
            Ok(0) => return ReadinessEvent::Closed,
            Ok(_) if byte[0] == READY_BYTE => return ReadinessEvent::Ready,
            Ok(_) => trace!(byte = byte[0], "Ignoring stray byte on readiness channel"),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return ReadinessEvent::Failed(e),
        }
    }
}
