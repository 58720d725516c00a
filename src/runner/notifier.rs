/*!
 * Readiness Notifiers
 */

use super::traits::ReadyNotifier;
use crate::core::limits::READY_BYTE;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::OwnedFd;

/// Writes the readiness byte to the write end of a pipe
#[derive(Debug)]
pub struct PipeNotifier {
    pipe: File,
}

impl PipeNotifier {
    pub fn new(fd: OwnedFd) -> Self {
        Self {
            pipe: File::from(fd),
        }
    }
}

impl ReadyNotifier for PipeNotifier {
    fn notify(&mut self) -> io::Result<()> {
        self.pipe.write_all(&[READY_BYTE])
    }
}

/// Writes the readiness byte to stdout, for re-executed children
#[derive(Debug, Default)]
pub struct StdoutNotifier;

impl ReadyNotifier for StdoutNotifier {
    fn notify(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&[READY_BYTE])?;
        stdout.flush()
    }
}

/// Does nothing; for runners driven in-process
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl ReadyNotifier for NoopNotifier {
    fn notify(&mut self) -> io::Result<()> {
        Ok(())
    }
}
