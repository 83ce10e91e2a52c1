//! Commands shipped with the shell.
//!
//! Every builtin is a unit struct implementing [`BuiltinCommand`]; a blanket
//! impl turns it into a [`Command`] that can be put in the registry and that
//! reports any `Err` as the stage's error text instead of propagating it.

use crate::command::{Command, CommandRegistry, CommandResult, Context, Segment};
use anyhow::{Context as _, Result, anyhow};
use std::fs;

mod files;
mod nav;
mod session;
mod text;

pub use files::{Chmod, Cp, Mv, Rm};
pub use nav::{Cd, Ls, Mkdir, Pwd};
pub use session::{Less, ShowHistory};
pub use text::{Cat, Echo, Grep, Head, Sort, Tail, WC};

/// Commands known to the shell at compile time.
pub(crate) trait BuiltinCommand {
    /// Canonical name of the command, e.g. "echo" or "cd".
    const NAME: &'static str;

    /// Run the command. `Ok(None)` means it succeeded without output.
    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>>;
}

impl<T: BuiltinCommand> Command for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn execute(&self, segment: &Segment, ctx: &mut Context<'_>) -> CommandResult {
        match self.run(segment, ctx) {
            Ok(output) => CommandResult {
                output,
                error: None,
            },
            Err(e) => {
                log::debug!("{} failed: {e:#}", T::NAME);
                CommandResult::failure(format!("{e:#}"))
            }
        }
    }
}

/// Add every builtin to `registry`.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(Box::new(Pwd));
    registry.register(Box::new(Cd));
    registry.register(Box::new(Ls));
    registry.register(Box::new(Mkdir));
    registry.register(Box::new(Cp));
    registry.register(Box::new(Mv));
    registry.register(Box::new(Rm));
    registry.register(Box::new(Chmod));
    registry.register(Box::new(Echo));
    registry.register(Box::new(Cat));
    registry.register(Box::new(Head));
    registry.register(Box::new(Tail));
    registry.register(Box::new(Grep));
    registry.register(Box::new(WC));
    registry.register(Box::new(Sort));
    registry.register(Box::new(ShowHistory));
    registry.register(Box::new(Less));
}

impl CommandRegistry {
    /// A registry holding every builtin.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }
}

/// Read a whole file relative to the session directory.
pub(crate) fn read_file(name: &str, file: &str, ctx: &Context<'_>) -> Result<String> {
    fs::read_to_string(ctx.env.resolve(file)).with_context(|| format!("{name}: {file}"))
}

/// The texts a filter works on: each named file in order, or the stage input
/// when no file is named. Absent input counts as empty text.
pub(crate) fn read_sources(
    name: &str,
    files: &[String],
    segment: &Segment,
    ctx: &Context<'_>,
) -> Result<Vec<(Option<String>, String)>> {
    if files.is_empty() {
        return Ok(vec![(None, segment.input.clone().unwrap_or_default())]);
    }
    files
        .iter()
        .map(|f| Ok((Some(f.clone()), read_file(name, f, ctx)?)))
        .collect()
}

/// Join lines with `\n`, without a trailing newline.
pub(crate) fn join_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }
    out
}

pub(crate) fn missing_operand(name: &str) -> anyhow::Error {
    anyhow!("{name}: missing operand")
}

/// Parse the count operand of `-n N`.
///
/// Flags may sit anywhere in a stage, so the count is the first positional
/// when that is a number, otherwise the first later positional that is.
/// The remaining positionals are returned in order.
pub(crate) fn line_count(name: &str, segment: &Segment) -> Result<(usize, Vec<String>)> {
    let params = &segment.params;
    if !segment.has_flag('n') {
        return Ok((10, params.clone()));
    }
    let Some(first) = params.first() else {
        return Err(anyhow!("{name}: option requires an argument -- 'n'"));
    };
    let Some((at, count)) = params
        .iter()
        .enumerate()
        .find_map(|(i, p)| p.parse::<usize>().ok().map(|n| (i, n)))
    else {
        return Err(anyhow!("{name}: invalid number of lines: '{first}'"));
    };
    let mut rest = params.clone();
    rest.remove(at);
    Ok((count, rest))
}
