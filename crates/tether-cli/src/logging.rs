use crate::error::Result;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Level shown on the terminal: warnings by default, one step more detail per `-v`, and
/// errors only under `--quiet`.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Level written to `--log-file`. The file always keeps the per-iteration relaxation
/// summaries (DEBUG), whatever the terminal shows.
pub fn file_level_for(verbosity: u8) -> LevelFilter {
    level_for(verbosity, false).max(LevelFilter::DEBUG)
}

/// Installs the global subscriber: a compact stderr layer plus, when requested, a
/// plain-text file layer with its own level.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let terminal = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(level_for(verbosity, quiet));

    let file = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(File::create(path)?)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_filter(file_level_for(verbosity)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(terminal)
        .with(file)
        .init();
    Ok(())
}
