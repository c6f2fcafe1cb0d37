//! Library part of the `fetch-attachments` utility.
//!
//! Layers are resolved either from an item (every layer and table of its service) or from a
//! single layer url, then every attachment matching the filter is downloaded.  Unlike the form
//! copy, failures here are recorded and skipped: see `DownloadReport`.
//!

pub use cli::*;
pub use download::*;

mod cli;
mod download;
