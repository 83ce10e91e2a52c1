use crate::command::{CommandRegistry, CommandResult, Context};
use crate::config::Config;
use crate::editor::{KeyOutcome, LineEditor};
use crate::env::Environment;
use crate::history::{Expansion, History};
use crate::io_adapters::ScriptedKeys;
use crate::parser::parse_pipeline;
use crate::pipeline::run_pipeline;
use crate::terminal::KeySource;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// What happened to one submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line; nothing was recorded or run.
    Empty,
    /// The line was `exit`.
    Exit,
    /// A command saw the interrupt key and asked the session to stop.
    Interrupted,
    /// The pipeline ran (or failed to parse / expand).
    Completed(CommandResult),
}

/// Why an interactive loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Exit,
    Interrupted,
    EndOfInput,
}

/// One shell session.
///
/// Owns the state that lives as long as the session: working directory,
/// history, the command table and the configuration. The input source and
/// the terminal are borrowed per call, so the whole loop can be driven from
/// memory in tests.
///
/// ```
/// use rawsh::{Config, Interpreter, LineOutcome, ScriptedKeys};
/// let mut sh = Interpreter::new(Config::default());
/// let mut term = Vec::new();
/// let outcome = sh
///     .execute_line("echo hello | wc -w", &mut ScriptedKeys::default(), &mut term)
///     .unwrap();
/// match outcome {
///     LineOutcome::Completed(res) => assert_eq!(res.output.as_deref(), Some("1")),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub struct Interpreter {
    env: Environment,
    history: History,
    registry: CommandRegistry,
    config: Config,
}

impl Interpreter {
    /// Session in the process working directory with every builtin registered.
    pub fn new(config: Config) -> Self {
        Self::with_parts(config, CommandRegistry::with_builtins(), Environment::new())
    }

    /// Session with a custom command table and environment.
    pub fn with_parts(config: Config, registry: CommandRegistry, env: Environment) -> Self {
        Self {
            env,
            history: History::new(),
            registry,
            config,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Expand, record, parse and run one submitted line.
    ///
    /// Surrounding whitespace is ignored when matching `exit` and `!N` and
    /// when parsing, but a typed line is recorded untrimmed.
    ///
    /// A recalled `!N` line is echoed to `term` before it runs. When the last
    /// stage sent its output to a file, that output is not returned for
    /// display.
    pub fn execute_line(
        &mut self,
        line: &str,
        keys: &mut dyn KeySource,
        term: &mut dyn Write,
    ) -> Result<LineOutcome> {
        let raw = line;
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineOutcome::Empty);
        }
        log::debug!("submitted: {line}");

        // History keeps a typed line exactly as submitted; a recall stores
        // the text it expanded to.
        let (line, entry) = match self.history.expand(line) {
            Ok(Expansion::Literal(text)) => (text.to_string(), raw.to_string()),
            Ok(Expansion::Recalled(text)) => {
                log::debug!("recalled: {text}");
                writeln!(term, "{text}")?;
                (text.trim().to_string(), text)
            }
            Err(e) => {
                log::debug!("recall failed: {e}");
                return Ok(LineOutcome::Completed(CommandResult::failure(e.to_string())));
            }
        };
        if line == "exit" {
            return Ok(LineOutcome::Exit);
        }
        self.history.record(&entry);

        let segments = match parse_pipeline(&line) {
            Ok(segments) => segments,
            Err(e) => {
                log::info!("parse error in {line:?}: {e}");
                return Ok(LineOutcome::Completed(CommandResult::failure(e.to_string())));
            }
        };
        let redirected = segments.last().is_some_and(|s| s.outfile.is_some());

        let mut ctx = Context {
            env: &mut self.env,
            history: &self.history,
            keys,
            term,
            config: &self.config,
        };
        let mut result = run_pipeline(segments, &self.registry, &mut ctx);

        if self.env.should_exit {
            return Ok(LineOutcome::Interrupted);
        }
        if redirected && !result.is_error() {
            result.output = None;
        }
        Ok(LineOutcome::Completed(result))
    }

    /// Write a result as its output line followed by its error line.
    pub fn render(result: &CommandResult, term: &mut dyn Write) -> io::Result<()> {
        for text in [&result.output, &result.error].into_iter().flatten() {
            if !text.is_empty() {
                writeln!(term, "{text}")?;
            }
        }
        term.flush()
    }

    fn farewell(&self, term: &mut dyn Write) -> io::Result<()> {
        writeln!(term, "{}", self.config.shell.farewell)?;
        term.flush()
    }

    /// Keystroke-level loop: feed every key to the line editor, redraw after
    /// each edit, run submitted lines.
    pub fn repl(&mut self, keys: &mut dyn KeySource, term: &mut dyn Write) -> Result<ExitReason> {
        let prompt = self.config.shell.prompt.clone();
        let mut editor = LineEditor::new();
        editor.redraw(&prompt, term)?;

        loop {
            let Some(byte) = keys.next_key()? else {
                writeln!(term)?;
                term.flush()?;
                return Ok(ExitReason::EndOfInput);
            };
            match editor.feed(byte, &mut self.history) {
                KeyOutcome::Pending => {}
                KeyOutcome::Redraw => editor.redraw(&prompt, term)?,
                KeyOutcome::Interrupt => {
                    writeln!(term)?;
                    self.farewell(term)?;
                    return Ok(ExitReason::Interrupted);
                }
                KeyOutcome::Submit(line) => {
                    writeln!(term)?;
                    self.history.reset_cursor();
                    match self.execute_line(&line, keys, term)? {
                        LineOutcome::Empty => {}
                        LineOutcome::Exit => {
                            self.farewell(term)?;
                            return Ok(ExitReason::Exit);
                        }
                        LineOutcome::Interrupted => {
                            self.farewell(term)?;
                            return Ok(ExitReason::Interrupted);
                        }
                        LineOutcome::Completed(result) => Self::render(&result, term)?,
                    }
                    editor.redraw(&prompt, term)?;
                }
            }
        }
    }

    /// Line-oriented loop for when stdin is not a terminal.
    ///
    /// Lines come from rustyline; there is no keystroke navigation but `!N`
    /// recall works. The pager never pauses here.
    pub fn repl_lines(&mut self) -> Result<ExitReason> {
        let mut rl = DefaultEditor::new()?;
        let mut keys = ScriptedKeys::default();
        let mut out = io::stdout();
        let prompt = self.config.shell.prompt.clone();

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    match self.execute_line(&line, &mut keys, &mut out)? {
                        LineOutcome::Empty => {}
                        LineOutcome::Exit => {
                            self.farewell(&mut out)?;
                            return Ok(ExitReason::Exit);
                        }
                        LineOutcome::Interrupted => {
                            self.farewell(&mut out)?;
                            return Ok(ExitReason::Interrupted);
                        }
                        LineOutcome::Completed(result) => Self::render(&result, &mut out)?,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    self.farewell(&mut out)?;
                    return Ok(ExitReason::Interrupted);
                }
                Err(ReadlineError::Eof) => return Ok(ExitReason::EndOfInput),
                Err(err) => return Err(err.into()),
            }
        }
    }
}
