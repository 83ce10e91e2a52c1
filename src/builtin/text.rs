use super::{BuiltinCommand, join_lines, line_count, read_sources};
use crate::command::{Context, Segment};
use anyhow::{Context as _, Result, anyhow};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// Write the arguments separated by single spaces.
pub struct Echo;

impl BuiltinCommand for Echo {
    const NAME: &'static str = "echo";

    fn run(&self, segment: &Segment, _ctx: &mut Context<'_>) -> Result<Option<String>> {
        Ok(Some(segment.params.join(" ")))
    }
}

/// Concatenate files, or pass the input through. `n` numbers the lines.
pub struct Cat;

impl BuiltinCommand for Cat {
    const NAME: &'static str = "cat";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let sources = read_sources(Self::NAME, &segment.params, segment, ctx)?;
        let joined = join_lines(
            sources
                .iter()
                .map(|(_, text)| text.strip_suffix('\n').unwrap_or(text)),
        );
        if !segment.has_flag('n') {
            return Ok(Some(joined));
        }
        Ok(Some(join_lines(
            joined
                .lines()
                .enumerate()
                .map(|(i, line)| format!("{:>6}\t{line}", i + 1)),
        )))
    }
}

/// Shared body of `head` and `tail`: pick lines from each source, with a
/// `==> name <==` header when several files are named.
fn slice_sources(
    name: &str,
    segment: &Segment,
    ctx: &Context<'_>,
    pick: fn(&[&str], usize) -> Vec<String>,
) -> Result<Option<String>> {
    let (count, files) = line_count(name, segment)?;
    let sources = read_sources(name, &files, segment, ctx)?;
    let headers = sources.len() > 1;
    let mut blocks = Vec::new();
    for (file, text) in &sources {
        let lines: Vec<&str> = text.lines().collect();
        let body = join_lines(pick(&lines, count));
        match file {
            Some(file) if headers => blocks.push(format!("==> {file} <==\n{body}")),
            _ => blocks.push(body),
        }
    }
    Ok(Some(blocks.join("\n\n")))
}

/// Print the first lines (10, or N with `-n N`).
pub struct Head;

impl BuiltinCommand for Head {
    const NAME: &'static str = "head";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        slice_sources(Self::NAME, segment, ctx, |lines, n| {
            lines.iter().take(n).map(|l| l.to_string()).collect()
        })
    }
}

/// Print the last lines (10, or N with `-n N`).
pub struct Tail;

impl BuiltinCommand for Tail {
    const NAME: &'static str = "tail";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        slice_sources(Self::NAME, segment, ctx, |lines, n| {
            lines[lines.len().saturating_sub(n)..]
                .iter()
                .map(|l| l.to_string())
                .collect()
        })
    }
}

/// Print lines matching a pattern.
///
/// Flags: `i` ignore case, `w` whole words, `v` invert, `c` count only,
/// `n` prefix line numbers.
pub struct Grep;

impl Grep {
    fn build_regex(segment: &Segment, pattern: &str) -> Result<Regex> {
        let full = if segment.has_flag('w') {
            format!(r"\b({pattern})\b")
        } else {
            pattern.to_string()
        };
        RegexBuilder::new(&full)
            .case_insensitive(segment.has_flag('i'))
            .build()
            .with_context(|| format!("grep: invalid pattern '{pattern}'"))
    }
}

impl BuiltinCommand for Grep {
    const NAME: &'static str = "grep";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let Some((pattern, files)) = segment.params.split_first() else {
            return Err(anyhow!("grep: missing pattern"));
        };
        let re = Self::build_regex(segment, pattern)?;
        let invert = segment.has_flag('v');
        let sources = read_sources(Self::NAME, files, segment, ctx)?;
        let prefix_files = sources.len() > 1;

        let mut out = Vec::new();
        for (file, text) in &sources {
            let prefix = match file {
                Some(f) if prefix_files => format!("{f}:"),
                _ => String::new(),
            };
            let matching = text
                .lines()
                .enumerate()
                .filter(|(_, line)| re.is_match(line) != invert);
            if segment.has_flag('c') {
                out.push(format!("{prefix}{}", matching.count()));
                continue;
            }
            for (i, line) in matching {
                if segment.has_flag('n') {
                    out.push(format!("{prefix}{}:{line}", i + 1));
                } else {
                    out.push(format!("{prefix}{line}"));
                }
            }
        }
        Ok(Some(join_lines(out)))
    }
}

/// Count lines, words and bytes. `l`, `w`, `c` select columns.
pub struct WC;

#[derive(Default, Clone, Copy)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
}

impl WC {
    fn format(segment: &Segment, counts: Counts, name: Option<&str>) -> String {
        let all = !(segment.has_flag('l') || segment.has_flag('w') || segment.has_flag('c'));
        let mut cols = Vec::new();
        if all || segment.has_flag('l') {
            cols.push(counts.lines.to_string());
        }
        if all || segment.has_flag('w') {
            cols.push(counts.words.to_string());
        }
        if all || segment.has_flag('c') {
            cols.push(counts.bytes.to_string());
        }
        if let Some(name) = name {
            cols.push(name.to_string());
        }
        cols.join(" ")
    }
}

impl BuiltinCommand for WC {
    const NAME: &'static str = "wc";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let sources = read_sources(Self::NAME, &segment.params, segment, ctx)?;
        let mut total = Counts::default();
        let mut out = Vec::new();
        for (file, text) in &sources {
            let counts = Counts {
                lines: text.lines().count(),
                words: text.split_whitespace().count(),
                bytes: text.len(),
            };
            total.lines += counts.lines;
            total.words += counts.words;
            total.bytes += counts.bytes;
            out.push(Self::format(segment, counts, file.as_deref()));
        }
        if sources.len() > 1 {
            out.push(Self::format(segment, total, Some("total")));
        }
        Ok(Some(join_lines(out)))
    }
}

/// Sort lines. `r` reverses, `n` compares leading numbers, `u` drops duplicates.
pub struct Sort;

/// Value of the longest numeric prefix of `line`; 0 when there is none.
fn numeric_key(line: &str) -> f64 {
    let trimmed = line.trim_start();
    let mut best = 0.0;
    for (i, c) in trimmed.char_indices() {
        if !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))) {
            break;
        }
        if let Ok(v) = trimmed[..=i].parse::<f64>() {
            best = v;
        }
    }
    best
}

impl BuiltinCommand for Sort {
    const NAME: &'static str = "sort";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let sources = read_sources(Self::NAME, &segment.params, segment, ctx)?;
        let mut lines: Vec<&str> = sources.iter().flat_map(|(_, t)| t.lines()).collect();

        if segment.has_flag('n') {
            lines.sort_by(|a, b| {
                numeric_key(a)
                    .partial_cmp(&numeric_key(b))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.cmp(b))
            });
        } else {
            lines.sort();
        }
        if segment.has_flag('r') {
            lines.reverse();
        }
        if segment.has_flag('u') {
            lines.dedup();
        }
        Ok(Some(join_lines(lines)))
    }
}
