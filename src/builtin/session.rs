use super::{BuiltinCommand, join_lines, read_sources};
use crate::command::{Context, Segment};
use crate::editor::KEY_INTERRUPT;
use anyhow::{Context as _, Result, anyhow};
use std::io::Write;

/// Numbered listing of the session history.
pub struct ShowHistory;

impl BuiltinCommand for ShowHistory {
    const NAME: &'static str = "history";

    fn run(&self, _segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        Ok(Some(join_lines(
            ctx.history
                .entries()
                .iter()
                .enumerate()
                .map(|(i, line)| format!("{:>5}  {line}", i + 1)),
        )))
    }
}

/// Page a file (or the input) to the terminal.
///
/// After every `page_lines` lines a `--More--` prompt waits for one key:
/// `q` stops, the interrupt byte stops and ends the session, anything else
/// shows the next page. When the key source runs dry the rest is printed
/// without pausing. Nothing is captured as output.
pub struct Less;

const MORE_PROMPT: &str = "--More--";

impl BuiltinCommand for Less {
    const NAME: &'static str = "less";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        if segment.params.len() > 1 {
            return Err(anyhow!("less: too many operands"));
        }
        let sources = read_sources(Self::NAME, &segment.params, segment, ctx)?;
        let text = sources.into_iter().map(|(_, t)| t).collect::<String>();
        let lines: Vec<&str> = text.lines().collect();
        let page = ctx.config.pager.page_lines.max(1);

        let mut pages = lines.chunks(page).peekable();
        let mut paused = true;
        while let Some(chunk) = pages.next() {
            for line in chunk {
                writeln!(ctx.term, "{line}").context("less: write failed")?;
            }
            if !paused || pages.peek().is_none() {
                continue;
            }
            write!(ctx.term, "{MORE_PROMPT}").context("less: write failed")?;
            ctx.term.flush().context("less: write failed")?;
            let key = ctx.keys.next_key().context("less: reading key")?;
            write!(ctx.term, "\r\x1b[K").context("less: write failed")?;
            match key {
                Some(b'q') | Some(b'Q') => break,
                Some(KEY_INTERRUPT) => {
                    log::debug!("less: interrupted");
                    ctx.env.should_exit = true;
                    break;
                }
                Some(_) => {}
                None => paused = false,
            }
        }
        ctx.term.flush().context("less: write failed")?;
        Ok(None)
    }
}
