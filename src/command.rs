use crate::config::Config;
use crate::env::Environment;
use crate::history::History;
use crate::terminal::KeySource;
use std::collections::{BTreeSet, HashMap};
use std::io::Write;

/// One pipeline stage as produced by the parser and handed to a [`Command`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// Command name; matched case-insensitively against the registry.
    pub command: String,
    /// Positional operands in the order they were typed.
    pub params: Vec<String>,
    /// Union of the letters of every `-xyz` token in the stage.
    pub flags: BTreeSet<char>,
    /// Text fed to the command: the previous stage's output or `infile` contents.
    pub input: Option<String>,
    /// File named by `<`.
    pub infile: Option<String>,
    /// File named by `>` or `>>`.
    pub outfile: Option<String>,
    /// True only when the output operator was `>>`.
    pub append: bool,
}

impl Segment {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(&flag)
    }
}

/// Outcome of a single command, and of a whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub output: Option<String>,
    pub error: Option<String>,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            error: None,
        }
    }

    /// A successful result that produced no text.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            output: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Session state a command may touch while it runs.
///
/// `env` (working directory) and `history` are the only shared state a
/// command is expected to read; `keys` and `term` are there for interactive
/// commands such as the pager.
pub struct Context<'a> {
    pub env: &'a mut Environment,
    pub history: &'a History,
    pub keys: &'a mut dyn KeySource,
    pub term: &'a mut dyn Write,
    pub config: &'a Config,
}

/// Object-safe trait for anything the registry can dispatch a segment to.
///
/// Implementations must not panic on bad input; every failure is reported
/// through [`CommandResult::error`].
pub trait Command {
    /// Canonical (lower-case) name of the command.
    fn name(&self) -> &str;

    /// Run the command against one parsed segment.
    fn execute(&self, segment: &Segment, ctx: &mut Context<'_>) -> CommandResult;
}

/// Case-insensitive name → command lookup.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under its own name, replacing any previous one.
    pub fn register(&mut self, command: Box<dyn Command>) {
        let key = command.name().to_lowercase();
        if self.commands.insert(key.clone(), command).is_some() {
            log::debug!("command {key} re-registered");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(&name.to_lowercase()).map(|c| c.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look the segment's command up and run it.
    pub fn dispatch(&self, segment: &Segment, ctx: &mut Context<'_>) -> CommandResult {
        match self.get(&segment.command) {
            Some(command) => command.execute(segment, ctx),
            None => CommandResult::failure(format!("command not found: {}", segment.command)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;

    struct Upper;

    impl Command for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn execute(&self, segment: &Segment, _ctx: &mut Context<'_>) -> CommandResult {
            CommandResult::success(segment.input.clone().unwrap_or_default().to_uppercase())
        }
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(Upper));
        let mut fx = Fixture::new("/");

        let mut seg = Segment::new("UpPeR");
        seg.input = Some("abc".to_string());
        let res = registry.dispatch(&seg, &mut fx.ctx());
        assert_eq!(res, CommandResult::success("ABC"));
    }

    #[test]
    fn test_unknown_command_reports_not_found() {
        let registry = CommandRegistry::new();
        let mut fx = Fixture::new("/");
        let res = registry.dispatch(&Segment::new("frobnicate"), &mut fx.ctx());
        assert_eq!(res.output, None);
        assert_eq!(res.error.as_deref(), Some("command not found: frobnicate"));
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(Upper));
        assert_eq!(registry.names(), vec!["upper"]);
        assert!(registry.get("UPPER").is_some());
        assert!(registry.get("lower").is_none());
    }
}
