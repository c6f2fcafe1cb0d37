//! Module to deal with the content API of a hosted GIS portal.
//!
//! The different submodules deal with:
//!
//! - authentication (username/password traded for a token)
//! - items: lookup, data, update, layers of a service item
//! - attachments of feature layers and tables: search and download
//!
//! Everything is blocking and sequential.  The two traits below are what the tools use so that
//! the logic can be exercised without a portal.
//!

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use serde_json::Value;

// Re-export these modules for a shorted import path.
//
pub use attachments::*;
pub use error::*;
pub use item::*;
pub use portal::*;
pub use token::*;

mod attachments;
mod error;
mod item;
mod portal;
mod token;

#[macro_use]
mod macros;

pub trait Expirable: Debug + Clone {
    fn key(&self) -> String;
    fn is_expired(&self) -> bool;
}

/// Item-level operations of the content API.
///
pub trait Content: Debug {
    /// Lookup an item, `None` if it does not exist or is not visible to us
    fn get_item(&self, id: &str) -> Result<Option<Item>, PortalError>;
    /// JSON data attached to the item (the map document for a web map)
    fn item_data(&self, item: &Item) -> Result<Value, PortalError>;
    /// Replace the JSON data of the item
    fn update_item_data(&self, item: &Item, data: &Value) -> Result<(), PortalError>;
    /// Layers then tables of a service item
    fn item_layers(&self, item: &Item) -> Result<Vec<FeatureLayer>, PortalError>;
}

/// Attachment operations on a feature layer or table.
///
pub trait Attachments: Debug {
    /// Every attachment whose parent feature matches `filter`
    fn search_attachments(
        &self,
        layer: &FeatureLayer,
        filter: &str,
    ) -> Result<Vec<Attachment>, PortalError>;
    /// Save one attachment under `dir`, returns the file written
    fn download_attachment(
        &self,
        layer: &FeatureLayer,
        attachment: &Attachment,
        dir: &Path,
    ) -> Result<PathBuf, PortalError>;
}

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
