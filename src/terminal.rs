use anyhow::{Context, Result};
use nix::sys::termios::{SetArg, Termios, cfmakeraw, tcgetattr, tcsetattr};
use std::io::{self, Read};
use std::os::fd::AsFd;

/// A source of raw input units, one byte per request.
///
/// The line editor and the pager block on this trait rather than on the
/// terminal directly, so a whole session can be driven from memory (see
/// [`crate::io_adapters::ScriptedKeys`]).
pub trait KeySource {
    /// Block until the next input unit is available.
    ///
    /// `Ok(None)` signals that the source is exhausted.
    fn next_key(&mut self) -> io::Result<Option<u8>>;
}

/// Standard input switched into raw mode.
///
/// The saved terminal attributes are restored when the value is dropped.
pub struct RawTerminal {
    original: Termios,
}

impl RawTerminal {
    /// Put standard input into raw mode: no line buffering, no echo, no
    /// signal generation for the interrupt key.
    pub fn enable() -> Result<Self> {
        let stdin = io::stdin();
        let original = tcgetattr(stdin.as_fd()).context("can't read terminal attributes")?;
        let mut raw = original.clone();
        cfmakeraw(&mut raw);
        tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &raw)
            .context("can't switch terminal to raw mode")?;
        log::debug!("terminal switched to raw mode");
        Ok(Self { original })
    }
}

impl KeySource for RawTerminal {
    fn next_key(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match io::stdin().lock().read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if let Err(e) = tcsetattr(io::stdin().as_fd(), SetArg::TCSAFLUSH, &self.original) {
            log::warn!("failed to restore terminal attributes: {e}");
        }
    }
}
