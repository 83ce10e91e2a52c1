use std::fmt;

/// Errors produced by `!N` history recall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The requested 1-based entry does not exist. Holds the number as typed.
    OutOfRange(String),
    /// The recalled entry is itself a recall.
    NestedRecall(usize),
    /// A line starting with `!` that is not `!` followed by digits.
    Malformed(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::OutOfRange(n) => write!(f, "no such history entry: {n}"),
            HistoryError::NestedRecall(n) => {
                write!(f, "nested history recall is not supported: !{n}")
            }
            HistoryError::Malformed(text) => write!(f, "invalid history reference: {text}"),
        }
    }
}

impl std::error::Error for HistoryError {}

/// Result of expanding a submitted line against the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion<'a> {
    /// The line is not a recall and is used as typed.
    Literal(&'a str),
    /// The line was `!N`; holds the recalled text.
    Recalled(String),
}

/// Append-only list of submitted command lines with a navigation cursor.
///
/// The cursor always satisfies `0 <= cursor <= len`; `cursor == len` means
/// "past the newest entry", which is where it is put after every append.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `line` unless it is empty (or only whitespace).
    ///
    /// Returns whether the line was stored. The navigation cursor is reset to
    /// the end either way so that Up recalls the newest entry.
    pub fn record(&mut self, line: &str) -> bool {
        let stored = if line.trim().is_empty() {
            false
        } else {
            self.entries.push(line.to_string());
            true
        };
        self.cursor = self.entries.len();
        stored
    }

    /// Fetch entry `n` (1-based).
    pub fn recall(&self, n: usize) -> Result<&str, HistoryError> {
        if n == 0 || n > self.entries.len() {
            return Err(HistoryError::OutOfRange(n.to_string()));
        }
        Ok(&self.entries[n - 1])
    }

    /// Expand `!N` references.
    ///
    /// Anything not starting with `!` is returned untouched. `!` followed by
    /// digits is replaced by that entry; recalling an entry that itself starts
    /// with `!` is refused, as is any other `!` form.
    pub fn expand<'a>(&self, line: &'a str) -> Result<Expansion<'a>, HistoryError> {
        let Some(reference) = line.strip_prefix('!') else {
            return Ok(Expansion::Literal(line));
        };
        if reference.is_empty() || !reference.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HistoryError::Malformed(line.to_string()));
        }
        // Too many digits to fit can never name a stored entry.
        let n: usize = reference
            .parse()
            .map_err(|_| HistoryError::OutOfRange(reference.to_string()))?;
        let recalled = self.recall(n)?;
        if recalled.starts_with('!') {
            return Err(HistoryError::NestedRecall(n));
        }
        Ok(Expansion::Recalled(recalled.to_string()))
    }

    /// Put the navigation cursor past the newest entry.
    pub fn reset_cursor(&mut self) {
        self.cursor = self.entries.len();
    }

    /// Step the cursor back one entry and return it, if there is an earlier one.
    pub fn previous(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step the cursor forward one entry and return it.
    ///
    /// At the newest entry (or past it) the cursor moves to the end and
    /// `None` is returned, meaning the caller should show an empty line.
    pub fn next(&mut self) -> Option<&str> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            Some(&self.entries[self.cursor])
        } else {
            self.cursor = self.entries.len();
            None
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
