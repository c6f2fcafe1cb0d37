use std::env;
use std::fs;
use std::process::ExitCode;

use clap::{crate_authors, crate_description, crate_version, CommandFactory, Parser};
use eyre::Result;
use tracing::{debug, info, trace, warn};

use fetch_attachments::{download_all, resolve_layers, Opts};
use portal_client::Portal;
use portal_common::{fix_args, init_logging, log_fatal, Config, ConfigFile};

/// Binary name, using a different binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();
/// Authors
pub const AUTHORS: &str = crate_authors!();

fn main() -> ExitCode {
    let opts = Opts::parse_from(fix_args(env::args_os(), &Opts::command()));

    let _guard = match init_logging(&opts.portal.log_opts()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{NAME}: can not initialise logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<()> {
    trace!("{NAME}/{VERSION} by {AUTHORS}: {}", crate_description!());
    debug!("using {} and {}", portal_common::version(), portal_client::version());

    let target = opts.target()?;
    let cfg = ConfigFile::<Config>::load(opts.portal.config.as_deref())?;

    info!("Authenticating...");
    let portal = Portal::connect(&opts.portal, cfg.inner())?;

    let layers = resolve_layers(&portal, &target)?;

    fs::create_dir_all(&opts.out_folder)?;
    let report = download_all(&portal, &layers, &opts.filter, &opts.out_folder);

    // Partial results are still results.
    //
    if report.failed_attachments() + report.failed_layers() > 0 {
        warn!("{report}");
    } else {
        info!("{report}");
    }
    info!("Completed successfully!");
    Ok(())
}
