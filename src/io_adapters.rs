use crate::terminal::KeySource;
use std::collections::VecDeque;
use std::io::{Result as IoResult, Write};

/// Memory-backed key source.
///
/// Yields the bytes it was built with, in order, then reports exhaustion.
#[derive(Debug, Default, Clone)]
pub struct ScriptedKeys {
    keys: VecDeque<u8>,
}

impl ScriptedKeys {
    /// Create a source that will yield the provided bytes.
    pub fn new(keys: impl Into<Vec<u8>>) -> Self {
        Self {
            keys: keys.into().into(),
        }
    }

    /// Queue more bytes behind the ones not yet consumed.
    pub fn push(&mut self, keys: &[u8]) {
        self.keys.extend(keys.iter().copied());
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> IoResult<Option<u8>> {
        Ok(self.keys.pop_front())
    }
}

/// Writer that expands `\n` into `\r\n`.
///
/// A terminal in raw mode does no output post-processing, so every line
/// break written by the session has to carry its own carriage return.
pub struct CrlfWriter<W: Write> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        let mut start = 0;
        for (i, b) in data.iter().enumerate() {
            if *b == b'\n' {
                self.inner.write_all(&data[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.inner.write_all(&data[start..])?;
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        self.inner.flush()
    }
}
