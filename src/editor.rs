//! Keystroke-level line editing.
//!
//! [`LineEditor`] consumes one raw byte at a time and keeps the in-progress
//! command line and its cursor. Escape sequences for the arrow keys are
//! recognised with an explicit three-state machine ([`EscapeState`]) so that
//! every transition can be exercised on its own.

use crate::history::History;
use std::io::{self, Write};

pub const KEY_INTERRUPT: u8 = 0x03;
pub const KEY_BACKSPACE: u8 = 0x7f;
pub const KEY_CTRL_H: u8 = 0x08;
pub const KEY_ESCAPE: u8 = 0x1b;
pub const KEY_SUBMIT: u8 = b'\r';
pub const KEY_NEWLINE: u8 = b'\n';

/// Where the editor is inside an `ESC [ <dir>` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeState {
    #[default]
    Normal,
    /// Saw the escape byte.
    EscapeStarted,
    /// Saw the bracket byte, waiting for the direction code.
    EscapeBracket,
}

/// What the caller has to do after feeding a byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Nothing visible changed.
    Pending,
    /// The buffer or cursor changed; redraw the line.
    Redraw,
    /// A line was submitted. The editor is already reset.
    Submit(String),
    /// The interrupt key was pressed.
    Interrupt,
}

#[derive(Debug, Default, Clone)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
    state: EscapeState,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw input byte.
    ///
    /// `history` is consulted (and its navigation cursor moved) by the Up
    /// and Down arrows.
    pub fn feed(&mut self, byte: u8, history: &mut History) -> KeyOutcome {
        match self.state {
            EscapeState::EscapeStarted => {
                // The bracket marker; its value is not checked.
                self.state = EscapeState::EscapeBracket;
                KeyOutcome::Pending
            }
            EscapeState::EscapeBracket => {
                self.state = EscapeState::Normal;
                self.direction(byte, history)
            }
            EscapeState::Normal => self.normal(byte),
        }
    }

    fn normal(&mut self, byte: u8) -> KeyOutcome {
        match byte {
            KEY_INTERRUPT => KeyOutcome::Interrupt,
            KEY_ESCAPE => {
                self.state = EscapeState::EscapeStarted;
                KeyOutcome::Pending
            }
            KEY_SUBMIT | KEY_NEWLINE => {
                let line: String = self.buffer.drain(..).collect();
                self.cursor = 0;
                KeyOutcome::Submit(line)
            }
            KEY_BACKSPACE | KEY_CTRL_H => {
                if self.cursor == 0 {
                    return KeyOutcome::Pending;
                }
                self.cursor -= 1;
                self.buffer.remove(self.cursor);
                KeyOutcome::Redraw
            }
            0x20..=0x7e => {
                self.buffer.insert(self.cursor, byte as char);
                self.cursor += 1;
                KeyOutcome::Redraw
            }
            _ => KeyOutcome::Pending,
        }
    }

    fn direction(&mut self, code: u8, history: &mut History) -> KeyOutcome {
        match code {
            b'A' => match history.previous() {
                Some(entry) => {
                    self.load(entry);
                    KeyOutcome::Redraw
                }
                None => KeyOutcome::Pending,
            },
            b'B' => {
                match history.next() {
                    Some(entry) => self.load(entry),
                    None => self.load(""),
                }
                KeyOutcome::Redraw
            }
            b'C' if self.cursor < self.buffer.len() => {
                self.cursor += 1;
                KeyOutcome::Redraw
            }
            b'D' if self.cursor > 0 => {
                self.cursor -= 1;
                KeyOutcome::Redraw
            }
            _ => KeyOutcome::Pending,
        }
    }

    fn load(&mut self, text: &str) {
        self.buffer = text.chars().collect();
        self.cursor = self.buffer.len();
    }

    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> EscapeState {
        self.state
    }

    /// Clear the current terminal line and rewrite it as `<prompt><buffer>`,
    /// leaving the terminal cursor at `prompt length + cursor`.
    pub fn redraw(&self, prompt: &str, out: &mut dyn Write) -> io::Result<()> {
        write!(out, "\r\x1b[K{}{}\r", prompt, self.buffer())?;
        let column = prompt.chars().count() + self.cursor;
        if column > 0 {
            write!(out, "\x1b[{column}C")?;
        }
        out.flush()
    }
}
