//! Command-line driver (SPEC_FULL §6). Grounded on the teacher's
//! `rhai-cli::bin::rhai` entry point, trimmed of the LSP/formatter
//! subcommands this interpreter has no equivalent for.

mod args;
mod config;
mod logging;

use args::{Command, NatiqArgs};
use clap::Parser;
use config::Config;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;
use std::process::exit;

fn main() {
    let args = NatiqArgs::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            exit(2);
        }
    };

    let resolved = config.resolve_logging(&args);
    logging::setup_stderr_logging(resolved.verbose, resolved.colors);

    let code = match args.cmd.clone() {
        Some(Command::Run { path }) => run_command(path),
        None => repl_command(),
    };
    exit(code);
}

/// Execute a single script to completion. Exit code 2 means the script
/// itself could not be obtained (missing file, unreadable stdin); 1 means
/// it was read but failed to lex, parse, or evaluate; 0 is success.
fn run_command(path: Option<PathBuf>) -> i32 {
    let source = match &path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                tracing::error!(error = %err, path = %path.display(), "failed to read script");
                return 2;
            }
        },
        None => {
            let mut buf = String::new();
            if let Err(err) = std::io::stdin().read_to_string(&mut buf) {
                tracing::error!(error = %err, "failed to read standard input");
                return 2;
            }
            buf
        }
    };

    match natiq::run(&source) {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "operation failed");
            1
        }
    }
}

/// A line-at-a-time REPL: one engine persists across inputs so top-level
/// variables and function definitions accumulate, matching spec.md §6.
/// Per-line errors are reported and the session continues; only an I/O
/// failure reading stdin itself ends the loop early, with exit code 2.
fn repl_command() -> i32 {
    let mut engine = natiq::Engine::new();
    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        line.clear();
        print!("> ");
        if std::io::stdout().flush().is_err() {
            return 2;
        }

        match stdin.lock().read_line(&mut line) {
            Ok(0) => return 0,
            Ok(_) => {}
            Err(err) => {
                tracing::error!(error = %err, "failed to read standard input");
                return 2;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        if let Err(err) = engine.run_source(&line) {
            tracing::error!(error = %err, "operation failed");
        }
    }
}
