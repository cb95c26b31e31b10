//! Stderr logging setup (SPEC_FULL §6.J). Grounded on the teacher's
//! `rhai_common::log::setup_stderr_logging`: a `tracing_subscriber` fmt
//! layer writing to stderr, verbosity controlled by a flag rather than
//! `RUST_LOG`, colors controlled independently of verbosity.

use tracing_subscriber::EnvFilter;

pub fn setup_stderr_logging(verbose: bool, colors: Option<bool>) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(verbose);

    match colors {
        Some(enabled) => builder.with_ansi(enabled).init(),
        None => builder.init(),
    }
}
