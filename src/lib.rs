//! A small interactive shell with a keystroke-level line editor.
//!
//! Keys are read one at a time from a [`KeySource`] and fed to the
//! [`LineEditor`], which keeps the edit buffer, the cursor and history
//! navigation. A submitted line goes through `!N` recall ([`History`]), is
//! split into pipeline stages by [`parse_pipeline`] and run by
//! [`run_pipeline`]: every stage's output is captured as text and handed to the
//! next stage, optionally redirected from or to files.
//!
//! Commands are looked up by name in a [`CommandRegistry`]; the builtins in
//! [`builtin`] cover the usual file and text utilities. [`Interpreter`] ties
//! the pieces into a session that can run on a raw terminal or be driven
//! entirely from memory with [`ScriptedKeys`].

pub mod builtin;
pub mod command;
pub mod config;
pub mod editor;
pub mod env;
pub mod history;
pub mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod terminal;

pub use command::{Command, CommandRegistry, CommandResult, Context, Segment};
pub use config::Config;
pub use editor::LineEditor;
pub use history::History;
pub use interpreter::{ExitReason, Interpreter, LineOutcome};
pub use io_adapters::{CrlfWriter, ScriptedKeys};
pub use parser::{ParseError, parse_pipeline};
pub use pipeline::run_pipeline;
pub use terminal::KeySource;
