//! Command-line options of `copy-form`.
//!
//! Long options are historically written with a single dash (`-source-map-id`), see
//! `portal_common::fix_args()`.
//!

use clap::{crate_authors, crate_description, crate_name, crate_version, Parser};

use portal_common::PortalArgs;

use crate::{CopyOpts, MergePolicy};

/// CLI options
#[derive(Debug, Parser)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
pub struct Opts {
    /// Credentials, portal and logging.
    #[clap(flatten)]
    pub portal: PortalArgs,
    /// The item id of the map you want to copy the form(s) from
    #[clap(long = "source-map-id")]
    pub source: String,
    /// The item id of the map you want to copy the form(s) to
    #[clap(long = "dest-map-id")]
    pub dest: String,
    /// An optional specific layer you want to copy. If this is not provided, all matching
    /// layers will have their forms copied
    #[clap(long)]
    pub layer_name: Option<String>,
    /// Provide this parameter if you would like to overwrite an existing form
    #[clap(long)]
    pub overwrite: bool,
}

impl Opts {
    pub fn copy_opts(&self) -> CopyOpts {
        CopyOpts {
            source: self.source.clone(),
            dest: self.dest.clone(),
            policy: MergePolicy {
                overwrite: self.overwrite,
                layer_name: self.layer_name.clone(),
            },
        }
    }
}
