use std::env;
use std::process::ExitCode;

use clap::{crate_authors, crate_description, crate_version, CommandFactory, Parser};
use eyre::Result;
use tracing::{debug, error, info, trace};

use copy_form::{copy_form_between_maps, MergeError, Opts};
use portal_client::Portal;
use portal_common::{fix_args, init_logging, log_fatal, Config, ConfigFile};

/// Binary name, using a different binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();
/// Authors
pub const AUTHORS: &str = crate_authors!();

/// Exit code when a form is already there and `--overwrite` was not given
const EXIT_CONFLICT: u8 = 2;

fn main() -> ExitCode {
    let opts = Opts::parse_from(fix_args(env::args_os(), &Opts::command()));

    // Initialise logging early, we need it for everything else.
    //
    let _guard = match init_logging(&opts.portal.log_opts()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{NAME}: can not initialise logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<MergeError>() {
            Some(conflict) => {
                error!("{conflict}");
                ExitCode::from(EXIT_CONFLICT)
            }
            None => {
                log_fatal(&e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(opts: &Opts) -> Result<()> {
    trace!("{NAME}/{VERSION} by {AUTHORS}: {}", crate_description!());
    debug!("using {} and {}", portal_common::version(), portal_client::version());

    let cfg = ConfigFile::<Config>::load(opts.portal.config.as_deref())?;

    info!("Authenticating...");
    let portal = Portal::connect(&opts.portal, cfg.inner())?;

    copy_form_between_maps(&portal, &opts.copy_opts())?;

    info!("Completed!");
    Ok(())
}
