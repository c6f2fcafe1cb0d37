//! Common logging initializer
//!
//! The console gets `info` and above on stdout (`RUST_LOG` or `-v` can change that), the
//! optional log file gets everything from `debug` up through a size-capped writer.
//!

use std::io;
use std::path::PathBuf;

use eyre::{Report, Result};
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::{SizeCappedFile, MAX_LOG_SIZE};

/// What the binaries tell us about logging, taken from the command line.
///
#[derive(Clone, Debug, Default)]
pub struct LogOpts {
    /// Number of `-v`
    pub verbose: u8,
    /// Optional log file
    pub log_file: Option<PathBuf>,
}

/// Keep this alive until the end of `main()` or the file writer loses its tail.
///
#[derive(Debug)]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Build and install the global subscriber.  Call once, early.
///
pub fn init_logging(opts: &LogOpts) -> Result<LogGuard> {
    // Load filters from environment unless asked to be more verbose
    //
    let filter = match opts.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let console = fmt::layer()
        .with_writer(io::stdout)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    // Log to file?
    //
    let (file, guard) = match &opts.log_file {
        Some(path) => {
            let writer = SizeCappedFile::open(path, MAX_LOG_SIZE)?;
            let (writer, guard) = tracing_appender::non_blocking(writer);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Combine both
    //
    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;

    Ok(LogGuard { _file: guard })
}

/// Last words before exiting on an error nobody handled.
///
pub fn log_fatal(report: &Report) {
    error!("Exception detected, script exiting");
    error!("{report}");
    error!("{}", flatten(&format!("{report:?}")));
}

/// Put a multi-line message on a single line, ` | ` separated.
///
pub fn flatten(msg: &str) -> String {
    msg.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
