//! This library is there to share some common code amongst all the portal tools.
//!
//! - logging initialisation (console + optional size-capped file)
//! - optional HCL configuration file
//! - command-line fixups for the single-dash long options
//!

use clap::{crate_name, crate_version};

pub use args::*;
pub use config::*;
pub use logging::*;
pub use rotate::*;

mod args;
mod config;
mod logging;
mod rotate;

#[macro_use]
mod macros;

const NAME: &str = crate_name!();
const VERSION: &str = crate_version!();

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
