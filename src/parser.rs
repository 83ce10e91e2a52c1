use crate::command::Segment;
use crate::lexer::{self, LexingError, Token, Word};
use std::fmt;

/// Errors that can occur while turning a line into a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A stage between pipes (or at either end) has no tokens at all.
    EmptyStage,
    /// A redirection operator is not followed by a filename.
    MissingRedirectTarget(&'static str),
    /// The same kind of redirection appears twice in one stage.
    DuplicateRedirect(&'static str),
    /// The stage has tokens but none of them names a command.
    MissingCommand,
    /// A quote was opened and never closed.
    UnfinishedQuote,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyStage => f.write_str("empty pipeline stage"),
            ParseError::MissingRedirectTarget(op) => write!(f, "missing filename after `{op}`"),
            ParseError::DuplicateRedirect(op) => write!(f, "duplicate `{op}` redirection"),
            ParseError::MissingCommand => f.write_str("missing command"),
            ParseError::UnfinishedQuote => f.write_str("unfinished quote"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LexingError> for ParseError {
    fn from(err: LexingError) -> Self {
        match err {
            LexingError::UnfinishedQuote => ParseError::UnfinishedQuote,
        }
    }
}

struct SegmentBuilder {
    tokens: std::vec::IntoIter<Token>,
    segment: Segment,
    has_command: bool,
}

impl SegmentBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        SegmentBuilder {
            tokens: tokens.into_iter(),
            segment: Segment::default(),
            has_command: false,
        }
    }

    /// Single left-to-right pass over the stage's tokens.
    fn build(mut self) -> Result<Segment, ParseError> {
        while let Some(token) = self.tokens.next() {
            match token {
                Token::RedirectLeft => {
                    let target = self.redirect_target("<")?;
                    if self.segment.infile.replace(target).is_some() {
                        return Err(ParseError::DuplicateRedirect("<"));
                    }
                }
                Token::RedirectRight => self.output_redirect(">", false)?,
                Token::RedirectAppend => self.output_redirect(">>", true)?,
                Token::Word(word) => self.word(word),
                Token::PipeOp => unreachable!("stages are split before building"),
            }
        }

        if !self.has_command {
            return Err(ParseError::MissingCommand);
        }
        Ok(self.segment)
    }

    fn word(&mut self, word: Word) {
        if !word.quoted && word.text.len() > 1 && word.text.starts_with('-') {
            self.segment.flags.extend(word.text.chars().skip(1));
        } else if !self.has_command {
            self.segment.command = word.text;
            self.has_command = true;
        } else {
            self.segment.params.push(word.text);
        }
    }

    fn output_redirect(&mut self, op: &'static str, append: bool) -> Result<(), ParseError> {
        let target = self.redirect_target(op)?;
        if self.segment.outfile.replace(target).is_some() {
            return Err(ParseError::DuplicateRedirect(op));
        }
        self.segment.append = append;
        Ok(())
    }

    fn redirect_target(&mut self, op: &'static str) -> Result<String, ParseError> {
        match self.tokens.next() {
            Some(Token::Word(word)) => Ok(word.text),
            _ => Err(ParseError::MissingRedirectTarget(op)),
        }
    }
}

/// Parse one submitted line into its ordered pipeline stages.
///
/// A blank line yields an empty pipeline.
pub fn parse_pipeline(line: &str) -> Result<Vec<Segment>, ParseError> {
    let tokens = lexer::split_into_tokens(line)?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut stages: Vec<Vec<Token>> = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        match token {
            Token::PipeOp => stages.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    stages.push(current);

    stages
        .into_iter()
        .map(|stage| {
            if stage.is_empty() {
                Err(ParseError::EmptyStage)
            } else {
                SegmentBuilder::from(stage).build()
            }
        })
        .collect()
}
