use anyhow::{Context as _, Result};
use argh::FromArgs;
use rawsh::interpreter::{Interpreter, LineOutcome};
use rawsh::terminal::RawTerminal;
use rawsh::{Config, CrlfWriter, ScriptedKeys, logging};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

/// rawsh: a small interactive shell.
#[derive(FromArgs, Debug)]
struct Args {
    /// prompt shown before every line
    #[argh(option)]
    prompt: Option<String>,

    /// log level: off, error, warn, info, debug, trace
    #[argh(option)]
    log_level: Option<String>,

    /// configuration file to merge over the defaults
    #[argh(option)]
    config: Option<PathBuf>,

    /// run one command line and exit
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// read whole lines instead of raw keystrokes
    #[argh(switch)]
    line_mode: bool,
}

fn run(args: Args) -> Result<ExitCode> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(prompt) = args.prompt {
        config.shell.prompt = prompt;
    }
    let level = args
        .log_level
        .as_deref()
        .map(logging::parse_level)
        .transpose()?;
    logging::init(&config.log, level)?;

    let mut sh = Interpreter::new(config);

    if let Some(line) = args.command {
        let mut out = io::stdout();
        let outcome = sh
            .execute_line(&line, &mut ScriptedKeys::default(), &mut out)
            .context("running command")?;
        return Ok(match outcome {
            LineOutcome::Completed(result) => {
                Interpreter::render(&result, &mut out)?;
                if result.is_error() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            _ => ExitCode::SUCCESS,
        });
    }

    let reason = if io::stdin().is_terminal() && !args.line_mode {
        let mut terminal = RawTerminal::enable()?;
        let mut term = CrlfWriter::new(io::stdout());
        sh.repl(&mut terminal, &mut term)?
    } else {
        sh.repl_lines()?
    };
    log::info!("session ended: {reason:?}");
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("rawsh: {e:#}");
            ExitCode::FAILURE
        }
    }
}
