//! Command-line surface (SPEC_FULL §6). Grounded on the teacher's
//! `rhai_cli::args::RhaiArgs`: one top-level struct carrying global logging
//! flags plus an optional subcommand, with a `clap::ValueEnum` for the
//! tri-state color switch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[clap(name = "natiq", bin_name = "natiq", version)]
pub struct NatiqArgs {
    /// Whether to colorize diagnostic output.
    #[clap(long, value_enum, global = true, default_value = "auto")]
    pub colors: Colors,
    /// Enable verbose (debug-level) logging.
    #[clap(long, global = true)]
    pub verbose: bool,
    /// Path to a `natiq.toml` configuration file; defaults to one
    /// discovered next to the current directory, if any.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a script file.
    Run {
        /// Path to the script to execute. Omit to read from standard input.
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Colors {
    /// Colorize when standard error is a terminal.
    Auto,
    /// Always colorize.
    Always,
    /// Never colorize.
    Never,
}
