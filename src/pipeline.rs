//! Sequential execution of parsed pipeline stages.
//!
//! Stages run strictly one after the other. Each stage's captured output is
//! carried forward as the next stage's input unless that stage redirects its
//! input from a file. The first stage that reports an error stops the run.

use crate::command::{CommandRegistry, CommandResult, Context, Segment};
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Run `segments` left to right and return the result of the last stage that ran.
pub fn run_pipeline(
    segments: Vec<Segment>,
    registry: &CommandRegistry,
    ctx: &mut Context<'_>,
) -> CommandResult {
    let mut carry: Option<String> = None;
    let mut result = CommandResult::empty();

    for (i, mut segment) in segments.into_iter().enumerate() {
        if let Some(infile) = &segment.infile {
            let path = ctx.env.resolve(infile);
            match fs::read_to_string(&path) {
                Ok(text) => segment.input = Some(text),
                Err(e) => {
                    log::warn!("stage {i}: can't read {}: {e}", path.display());
                    return CommandResult::failure(format!("{infile}: {e}"));
                }
            }
        } else if let Some(previous) = carry.take() {
            segment.input = Some(previous);
        }

        log::debug!(
            "stage {i}: dispatching {} params={:?} flags={:?}",
            segment.command,
            segment.params,
            segment.flags
        );
        result = registry.dispatch(&segment, ctx);

        if let Some(err) = &result.error {
            log::debug!("stage {i}: {} failed: {err}", segment.command);
            return result;
        }
        if ctx.env.should_exit {
            log::info!("stage {i}: interrupted");
            return result;
        }

        if let Some(outfile) = &segment.outfile {
            let text = result.output.as_deref().unwrap_or("");
            if let Err(e) = write_redirect(ctx, outfile, segment.append, text) {
                log::warn!("stage {i}: can't write {outfile}: {e}");
                return CommandResult::failure(format!("{outfile}: {e}"));
            }
        }

        carry = result.output.clone();
    }

    result
}

fn write_redirect(
    ctx: &Context<'_>,
    outfile: &str,
    append: bool,
    text: &str,
) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(ctx.env.resolve(outfile))?;
    writeln!(file, "{text}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::command::test_support::Fixture;
    use crate::parser::parse_pipeline;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(String, Option<String>)>>>;

    /// Records the input it saw and answers with `<name>(<input>)`.
    struct Probe {
        name: &'static str,
        seen: Log,
        fail: bool,
    }

    impl Command for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn execute(&self, segment: &Segment, _ctx: &mut Context<'_>) -> CommandResult {
            self.seen
                .borrow_mut()
                .push((self.name.to_string(), segment.input.clone()));
            if self.fail {
                return CommandResult::failure(format!("{} failed", self.name));
            }
            let input = segment.input.clone().unwrap_or_default();
            CommandResult::success(format!("{}({})", self.name, input))
        }
    }

    fn registry(seen: &Log, failing: &[&'static str]) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        for name in ["a", "b", "c"] {
            registry.register(Box::new(Probe {
                name,
                seen: seen.clone(),
                fail: failing.contains(&name),
            }));
        }
        registry
    }

    fn run(line: &str, registry: &CommandRegistry, fx: &mut Fixture) -> CommandResult {
        let segments = parse_pipeline(line).unwrap();
        run_pipeline(segments, registry, &mut fx.ctx())
    }

    #[test]
    fn test_output_feeds_next_stage_in_order() {
        let seen = Log::default();
        let reg = registry(&seen, &[]);
        let mut fx = Fixture::new("/");

        let res = run("a | b | c", &reg, &mut fx);

        assert_eq!(res, CommandResult::success("c(b(a()))"));
        let seen = seen.borrow();
        assert_eq!(seen[0], ("a".to_string(), None));
        assert_eq!(seen[1], ("b".to_string(), Some("a()".to_string())));
        assert_eq!(seen[2], ("c".to_string(), Some("b(a())".to_string())));
    }

    #[test]
    fn test_failing_stage_stops_the_pipeline() {
        let seen = Log::default();
        let reg = registry(&seen, &["b"]);
        let mut fx = Fixture::new("/");

        let res = run("a | b | c", &reg, &mut fx);

        assert_eq!(res, CommandResult::failure("b failed"));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_unknown_command_aborts_at_that_stage() {
        let seen = Log::default();
        let reg = registry(&seen, &[]);
        let mut fx = Fixture::new("/");

        let res = run("a | nope | c", &reg, &mut fx);

        assert_eq!(res.error.as_deref(), Some("command not found: nope"));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_infile_takes_precedence_over_carried_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("in.txt"), "from file").unwrap();
        let seen = Log::default();
        let reg = registry(&seen, &[]);
        let mut fx = Fixture::new(dir.path());

        let res = run("a | b < in.txt", &reg, &mut fx);

        assert_eq!(res, CommandResult::success("b(from file)"));
        assert_eq!(seen.borrow()[1].1.as_deref(), Some("from file"));
    }

    #[test]
    fn test_unreadable_infile_fails_whole_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Log::default();
        let reg = registry(&seen, &[]);
        let mut fx = Fixture::new(dir.path());

        let res = run("a | b < missing.txt | c", &reg, &mut fx);

        let err = res.error.expect("expected an error");
        assert!(err.starts_with("missing.txt: "), "got {err}");
        assert_eq!(res.output, None);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_outfile_is_truncated_or_appended_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Log::default();
        let reg = registry(&seen, &[]);
        let mut fx = Fixture::new(dir.path());
        let out = dir.path().join("out.txt");
        fs::write(&out, "stale\n").unwrap();

        run("a > out.txt", &reg, &mut fx);
        assert_eq!(fs::read_to_string(&out).unwrap(), "a()\n");

        run("b >> out.txt", &reg, &mut fx);
        assert_eq!(fs::read_to_string(&out).unwrap(), "a()\nb()\n");
    }

    #[test]
    fn test_redirected_stage_still_feeds_the_next_one() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Log::default();
        let reg = registry(&seen, &[]);
        let mut fx = Fixture::new(dir.path());

        let res = run("a > mid.txt | b", &reg, &mut fx);

        assert_eq!(res, CommandResult::success("b(a())"));
        assert_eq!(
            fs::read_to_string(dir.path().join("mid.txt")).unwrap(),
            "a()\n"
        );
    }

    #[test]
    fn test_write_failure_replaces_result() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Log::default();
        let reg = registry(&seen, &[]);
        let mut fx = Fixture::new(dir.path());

        let res = run("a > no/such/dir/out.txt | b", &reg, &mut fx);

        assert!(res.error.unwrap().starts_with("no/such/dir/out.txt: "));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_empty_pipeline_is_an_empty_success() {
        let reg = CommandRegistry::new();
        let mut fx = Fixture::new("/");
        assert_eq!(
            run_pipeline(Vec::new(), &reg, &mut fx.ctx()),
            CommandResult::empty()
        );
    }
}
