//! Command-line options of `fetch-attachments`.
//!

use std::path::PathBuf;

use clap::{crate_authors, crate_description, crate_name, crate_version, ArgGroup, Parser};
use eyre::{eyre, Result};

use portal_common::PortalArgs;

use crate::Target;

/// CLI options
#[derive(Debug, Parser)]
#[clap(name = crate_name!(), about = crate_description!())]
#[clap(version = crate_version!(), author = crate_authors!())]
#[clap(group(ArgGroup::new("target").required(true).args(["item_id", "layer_url"])))]
pub struct Opts {
    /// Credentials, portal and logging.
    #[clap(flatten)]
    pub portal: PortalArgs,
    /// The item id of the feature service whose layers and tables should be processed
    #[clap(long)]
    pub item_id: Option<String>,
    /// The url of a single feature layer or table
    #[clap(long)]
    pub layer_url: Option<String>,
    /// Where to put the attachments
    #[clap(long, default_value = "./attachments")]
    pub out_folder: PathBuf,
    /// Filter on the attachments
    #[clap(long = "where", default_value = "1=1", allow_hyphen_values = true)]
    pub filter: String,
}

impl Opts {
    /// What we have been asked to go through.
    ///
    pub fn target(&self) -> Result<Target> {
        match (&self.item_id, &self.layer_url) {
            (Some(id), None) => Ok(Target::Item(id.clone())),
            (None, Some(url)) => Ok(Target::Layer(url.clone())),
            _ => Err(eyre!("exactly one of --item-id or --layer-url is needed")),
        }
    }
}
