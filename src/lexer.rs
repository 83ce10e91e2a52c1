//! Lexical analysis of a submitted command line.
//!
//! Words are separated by unquoted whitespace; `|`, `<`, `>` and `>>` are
//! operators wherever they appear unquoted. Single quotes preserve everything
//! literally, double quotes allow `\"` and `\\`, and a backslash outside quotes
//! escapes the next character (so `\|` is a literal pipe).

use std::fmt;

/// A word token. `quoted` is set when any part of it was quoted or escaped;
/// such words are never treated as flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub quoted: bool,
}

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(Word),
    /// The pipe operator, `|`.
    PipeOp,
    /// Input redirection, `<`.
    RedirectLeft,
    /// Output redirection, `>`.
    RedirectRight,
    /// Appending output redirection, `>>`.
    RedirectAppend,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(&w.text),
            Token::PipeOp => f.write_str("|"),
            Token::RedirectLeft => f.write_str("<"),
            Token::RedirectRight => f.write_str(">"),
            Token::RedirectAppend => f.write_str(">>"),
        }
    }
}

/// Errors that can occur during lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    UnfinishedQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    quoted: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            quoted: false,
        }
    }

    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            LexingState::ReadingWord => self.finish_word(&mut out),
            LexingState::Start => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {}
            '|' | '<' | '>' => self.push_operator(ch, out),
            '\'' => {
                self.quoted = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => {
                self.escape();
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '|' | '<' | '>' => {
                self.finish_word(out);
                self.push_operator(ch, out);
                self.state = LexingState::Start;
            }
            '\'' => {
                self.quoted = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => self.escape(),
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' if matches!(self.peek_char(), Some('"') | Some('\\')) => {
                if let Some(next) = self.read_char() {
                    self.buffer.push(next);
                }
            }
            c => self.buffer.push(c),
        }
    }

    /// Take the next character literally. A trailing backslash stays a backslash.
    fn escape(&mut self) {
        self.quoted = true;
        match self.read_char() {
            Some(next) => self.buffer.push(next),
            None => self.buffer.push('\\'),
        }
    }

    fn push_operator(&mut self, ch: char, out: &mut Vec<Token>) {
        let token = match ch {
            '|' => Token::PipeOp,
            '<' => Token::RedirectLeft,
            '>' if self.peek_char() == Some('>') => {
                self.read_char();
                Token::RedirectAppend
            }
            '>' => Token::RedirectRight,
            _ => unreachable!("push_operator called with {ch:?}"),
        };
        out.push(token);
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        out.push(Token::Word(Word {
            text: std::mem::take(&mut self.buffer),
            quoted: std::mem::take(&mut self.quoted),
        }));
    }
}

/// Split `line` into word and operator tokens.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexingError> {
    LexingFSM::new(line).make_tokens()
}
