use rawsh::command::{Command, CommandResult, Context, Segment};
use rawsh::env::Environment;
use rawsh::{CommandRegistry, Config, ExitReason, Interpreter, LineOutcome, ScriptedKeys};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn session_in(dir: &Path) -> Interpreter {
    Interpreter::with_parts(
        Config::default(),
        CommandRegistry::with_builtins(),
        Environment::at(dir),
    )
}

fn drive(sh: &mut Interpreter, keys: &[u8]) -> (ExitReason, String) {
    let mut keys = ScriptedKeys::new(keys.to_vec());
    let mut term = Vec::new();
    let reason = sh.repl(&mut keys, &mut term).unwrap();
    (reason, String::from_utf8(term).unwrap())
}

fn completed(outcome: LineOutcome) -> CommandResult {
    match outcome {
        LineOutcome::Completed(result) => result,
        other => panic!("expected a completed line, got {other:?}"),
    }
}

fn line(sh: &mut Interpreter, text: &str) -> CommandResult {
    completed(
        sh.execute_line(text, &mut ScriptedKeys::default(), &mut Vec::new())
            .unwrap(),
    )
}

#[test]
fn test_files_flow_through_redirects_and_pipes() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    assert_eq!(line(&mut sh, "echo cherry > fruit.txt"), CommandResult::empty());
    assert_eq!(line(&mut sh, "echo apple >> fruit.txt"), CommandResult::empty());
    assert_eq!(line(&mut sh, "echo banana >> fruit.txt"), CommandResult::empty());
    assert_eq!(
        fs::read_to_string(dir.path().join("fruit.txt")).unwrap(),
        "cherry\napple\nbanana\n"
    );

    let res = line(&mut sh, "sort < fruit.txt | head -n 2");
    assert_eq!(res.output.as_deref(), Some("apple\nbanana"));

    let res = line(&mut sh, "cat fruit.txt | grep -c an");
    assert_eq!(res.output.as_deref(), Some("1"));

    line(&mut sh, "cat fruit.txt | sort -r > sorted.txt");
    assert_eq!(
        fs::read_to_string(dir.path().join("sorted.txt")).unwrap(),
        "cherry\nbanana\napple\n"
    );
}

#[test]
fn test_first_failing_stage_stops_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    let res = line(&mut sh, "echo x | frobnicate | wc > never.txt");
    assert_eq!(res.error.as_deref(), Some("command not found: frobnicate"));
    assert!(!dir.path().join("never.txt").exists());

    let res = line(&mut sh, "wc < missing.txt");
    assert!(res.error.unwrap().starts_with("missing.txt: "));
}

#[test]
fn test_quoted_pipes_and_flags_stay_literal() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    let res = line(&mut sh, "echo 'a | b' \"-n\"");
    assert_eq!(res.output.as_deref(), Some("a | b -n"));
    let res = line(&mut sh, r"echo a\|b");
    assert_eq!(res.output.as_deref(), Some("a|b"));
}

#[test]
fn test_keystroke_session_with_editing_and_history() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    // "ecoh hi", fix the typo with Left/Backspace, then recall it with Up.
    let mut keys = Vec::new();
    keys.extend_from_slice(b"ecoh hi");
    keys.extend_from_slice(b"\x1b[D\x1b[D\x1b[D");
    keys.extend_from_slice(&[0x7f, 0x7f]);
    keys.extend_from_slice(b"ho\r");
    keys.extend_from_slice(b"\x1b[A\r");
    keys.extend_from_slice(b"!1\r");
    keys.extend_from_slice(b"exit\r");

    let (reason, term) = drive(&mut sh, &keys);
    assert_eq!(reason, ExitReason::Exit);
    assert_eq!(term.matches("\nhi\n").count(), 3, "got {term:?}");
    assert!(term.contains("\necho hi\nhi\n"));
    assert!(term.ends_with("Bye.\n"));
    assert_eq!(sh.history().entries(), ["echo hi", "echo hi", "echo hi"]);
}

#[test]
fn test_up_after_a_blank_submit_recalls_the_newest_entry() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    let mut keys = Vec::new();
    keys.extend_from_slice(b"echo one\recho two\r");
    // Recall "echo one", erase it and submit the blank line.
    keys.extend_from_slice(b"\x1b[A\x1b[A");
    keys.extend_from_slice(&[0x7f; 8]);
    keys.extend_from_slice(b"\r");
    keys.extend_from_slice(b"\x1b[A\r");

    let (reason, term) = drive(&mut sh, &keys);
    assert_eq!(reason, ExitReason::EndOfInput);
    assert_eq!(term.matches("\ntwo\n").count(), 2, "got {term:?}");
    assert_eq!(sh.history().entries(), ["echo one", "echo two", "echo two"]);
}

#[test]
fn test_failed_recall_does_not_leave_navigation_mid_history() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    let mut keys = Vec::new();
    keys.extend_from_slice(b"echo one\recho two\r");
    // Walk back to the oldest entry, replace it with a bad recall.
    keys.extend_from_slice(b"\x1b[A\x1b[A");
    keys.extend_from_slice(&[0x7f; 8]);
    keys.extend_from_slice(b"!9\r");
    keys.extend_from_slice(b"\x1b[A\r");

    let (_, term) = drive(&mut sh, &keys);
    assert!(term.contains("no such history entry: 9"));
    assert_eq!(sh.history().entries(), ["echo one", "echo two", "echo two"]);
}

#[test]
fn test_prompt_is_redrawn_with_cursor_position() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    let (reason, term) = drive(&mut sh, b"ab\x1b[D");
    assert_eq!(reason, ExitReason::EndOfInput);
    assert!(term.starts_with("\r\x1b[K$ \r\x1b[2C"));
    assert!(term.contains("\r\x1b[K$ ab\r\x1b[4C"));
    assert!(term.contains("\r\x1b[K$ ab\r\x1b[3C"));
}

#[test]
fn test_interrupt_key_ends_the_session() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());

    let (reason, term) = drive(&mut sh, b"echo never\x03echo after\r");
    assert_eq!(reason, ExitReason::Interrupted);
    assert!(!term.contains("after"));
    assert!(sh.history().is_empty());
}

#[test]
fn test_pager_reads_keys_from_the_same_source() {
    let dir = TempDir::new().unwrap();
    let body: String = (1..=30).map(|i| format!("row {i}\n")).collect();
    fs::write(dir.path().join("long.txt"), body).unwrap();
    let mut sh = session_in(dir.path());

    let (reason, term) = drive(&mut sh, b"less long.txt\rqexit\r");
    assert_eq!(reason, ExitReason::Exit);
    assert!(term.contains("row 20\n--More--"));
    assert!(!term.contains("row 21"));

    let (reason, _) = drive(&mut sh, b"less long.txt\r\x03");
    assert_eq!(reason, ExitReason::Interrupted);
}

struct Shout;

impl Command for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn execute(&self, segment: &Segment, _ctx: &mut Context<'_>) -> CommandResult {
        let text = segment.input.clone().unwrap_or_else(|| segment.params.join(" "));
        CommandResult::success(text.to_uppercase())
    }
}

#[test]
fn test_custom_commands_join_the_registry() {
    let dir = TempDir::new().unwrap();
    let mut sh = session_in(dir.path());
    sh.registry_mut().register(Box::new(Shout));

    let res = line(&mut sh, "echo quiet | SHOUT");
    assert_eq!(res.output.as_deref(), Some("QUIET"));
}
