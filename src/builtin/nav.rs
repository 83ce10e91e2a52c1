use super::{BuiltinCommand, join_lines, missing_operand};
use crate::command::{Context, Segment};
use anyhow::{Context as _, Result, anyhow};
use chrono::{DateTime, Local};
use std::env;
use std::fs::{self, Metadata};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

/// Print the current working directory.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    const NAME: &'static str = "pwd";

    fn run(&self, _segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        Ok(Some(ctx.env.current_dir.to_string_lossy().into_owned()))
    }
}

/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME variable.
pub struct Cd;

impl BuiltinCommand for Cd {
    const NAME: &'static str = "cd";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let target = match segment.params.as_slice() {
            [] => match ctx.env.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => return Err(anyhow!("cd: no target and HOME not set")),
            },
            [t] if !t.is_empty() => PathBuf::from(t),
            [_] => return Err(anyhow!("cd: empty directory name")),
            _ => return Err(anyhow!("cd: too many arguments")),
        };

        let new_dir = ctx.env.resolve(&target);
        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: {}", target.display()))?;
        if !canonical.is_dir() {
            return Err(anyhow!("cd: {}: Not a directory", target.display()));
        }

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        log::debug!("cd: now in {}", canonical.display());
        ctx.env.current_dir = canonical;
        Ok(None)
    }
}

/// List directory contents.
///
/// Flags: `a` shows dot files, `l` uses the long format, `h` prints sizes
/// in K/M/G in the long format.
pub struct Ls;

struct Entry {
    name: String,
    meta: Metadata,
}

impl Ls {
    fn render(&self, entries: &[Entry], segment: &Segment) -> String {
        if !segment.has_flag('l') {
            return join_lines(entries.iter().map(|e| e.name.as_str()));
        }
        let human = segment.has_flag('h');
        let sizes: Vec<String> = entries
            .iter()
            .map(|e| format_size(e.meta.len(), human))
            .collect();
        let width = sizes.iter().map(String::len).max().unwrap_or(0);
        join_lines(entries.iter().zip(&sizes).map(|(e, size)| {
            format!(
                "{} {:>width$} {} {}",
                mode_string(&e.meta),
                size,
                format_mtime(&e.meta),
                e.name
            )
        }))
    }
}

impl BuiltinCommand for Ls {
    const NAME: &'static str = "ls";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let targets: Vec<&str> = if segment.params.is_empty() {
            vec!["."]
        } else {
            segment.params.iter().map(String::as_str).collect()
        };
        let show_headers = targets.len() > 1;

        let mut sections = Vec::new();
        for target in targets {
            let path = ctx.env.resolve(target);
            let meta = fs::metadata(&path)
                .with_context(|| format!("ls: cannot access '{target}'"))?;
            if !meta.is_dir() {
                let entry = Entry {
                    name: target.to_string(),
                    meta,
                };
                sections.push(self.render(&[entry], segment));
                continue;
            }

            let mut entries = Vec::new();
            let dir = fs::read_dir(&path)
                .with_context(|| format!("ls: cannot open directory '{target}'"))?;
            for item in dir {
                let item = item.with_context(|| format!("ls: reading '{target}'"))?;
                let name = item.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') && !segment.has_flag('a') {
                    continue;
                }
                let meta = item
                    .metadata()
                    .with_context(|| format!("ls: cannot access '{name}'"))?;
                entries.push(Entry { name, meta });
            }
            entries.sort_by(|a, b| a.name.cmp(&b.name));

            let body = self.render(&entries, segment);
            if show_headers {
                sections.push(format!("{target}:\n{body}"));
            } else {
                sections.push(body);
            }
        }
        Ok(Some(sections.join("\n\n")))
    }
}

/// `drwxr-xr-x`-style type and permission bits.
fn mode_string(meta: &Metadata) -> String {
    let kind = if meta.is_dir() {
        'd'
    } else if meta.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };
    let mode = meta.permissions().mode();
    let mut s = String::with_capacity(10);
    s.push(kind);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

fn format_size(bytes: u64, human: bool) -> String {
    if !human || bytes < 1024 {
        return bytes.to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 'B';
    for u in ['K', 'M', 'G', 'T'] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{value:.1}{unit}")
}

fn format_mtime(meta: &Metadata) -> String {
    match meta.modified() {
        Ok(t) => DateTime::<Local>::from(t).format("%b %e %H:%M").to_string(),
        Err(_) => "?".to_string(),
    }
}

/// Create directories. With `p`, parents are created and existing
/// directories are not an error.
pub struct Mkdir;

impl BuiltinCommand for Mkdir {
    const NAME: &'static str = "mkdir";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        if segment.params.is_empty() {
            return Err(missing_operand(Self::NAME));
        }
        for dir in &segment.params {
            let path = ctx.env.resolve(dir);
            let created = if segment.has_flag('p') {
                fs::create_dir_all(&path)
            } else {
                fs::create_dir(&path)
            };
            created.with_context(|| format!("mkdir: cannot create directory '{dir}'"))?;
        }
        Ok(None)
    }
}
