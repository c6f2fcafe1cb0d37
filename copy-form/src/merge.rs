//! Layer matching & form merge.
//!
//! A destination layer receives the `formInfo` of every source layer sharing its `url`:
//!
//! - source layers without a form are ignored
//! - with a layer name given, only destination layers with that exact title are considered
//! - a destination already carrying a form is only replaced when `overwrite` is set, otherwise
//!   the whole run stops on the first such layer (`MergeError::Conflict`)
//!
//! Nothing here mutates its input: the merge builds a new destination collection.
//!

use thiserror::Error;
use tracing::{debug, trace};

use crate::{LayerDescriptor, MapDocument};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("Existing form is detected on {title} ({url}). Pass --overwrite to overwrite the form")]
    Conflict { url: String, title: String },
}

/// What to copy and how hard.
///
#[derive(Clone, Debug, Default)]
pub struct MergePolicy {
    /// Replace existing forms
    pub overwrite: bool,
    /// Only destination layers with this exact title
    pub layer_name: Option<String>,
}

impl MergePolicy {
    fn accepts(&self, layer: &LayerDescriptor) -> bool {
        match &self.layer_name {
            Some(name) => layer.title.as_deref() == Some(name.as_str()),
            None => true,
        }
    }
}

/// Result of merging one collection
///
#[derive(Clone, Debug, PartialEq)]
pub struct Merged {
    /// New destination collection
    pub layers: Vec<LayerDescriptor>,
    /// Did anything change?
    pub modified: bool,
    /// Labels of the layers which got a form
    pub touched: Vec<String>,
}

/// Copy forms from `source` into the matching entries of `destination`.
///
#[tracing::instrument(skip(source, destination))]
pub fn merge_forms(
    source: &[LayerDescriptor],
    destination: &[LayerDescriptor],
    policy: &MergePolicy,
) -> Result<Merged, MergeError> {
    let mut layers = destination.to_vec();
    let mut touched = vec![];

    for src in source.iter().filter(|s| s.has_form()) {
        let Some(url) = src.url.as_deref() else {
            trace!("{} has a form but no url", src.label());
            continue;
        };

        for dst in layers.iter_mut().filter(|d| d.url.as_deref() == Some(url)) {
            if !policy.accepts(dst) {
                trace!("skipping {}", dst.label());
                continue;
            }
            if dst.has_form() && !policy.overwrite {
                return Err(MergeError::Conflict {
                    url: url.to_string(),
                    title: dst.label(),
                });
            }
            debug!("copying form into {}", dst.label());
            dst.form_info = src.form_info.clone();
            touched.push(dst.label());
        }
    }

    Ok(Merged {
        layers,
        modified: !touched.is_empty(),
        touched,
    })
}

/// Result of merging a whole map
///
#[derive(Clone, Debug, PartialEq)]
pub struct FormCopy {
    /// New destination document
    pub document: MapDocument,
    /// True if at least one layer or table changed
    pub modified: bool,
    /// Labels of the layers and tables which got a form
    pub touched: Vec<String>,
}

/// Run the merge on operational layers then on tables.
///
/// Either pass can hit a conflict; the destination document is only rebuilt when both succeed.
///
#[tracing::instrument(skip(source, destination))]
pub fn copy_forms(
    source: &MapDocument,
    destination: &MapDocument,
    policy: &MergePolicy,
) -> Result<FormCopy, MergeError> {
    let layers = merge_forms(source.layers(), destination.layers(), policy)?;
    let tables = merge_forms(source.tables(), destination.tables(), policy)?;

    let mut document = destination.clone();
    if layers.modified {
        document.operational_layers = Some(layers.layers);
    }
    if tables.modified {
        document.tables = Some(tables.layers);
    }

    let touched: Vec<String> = layers.touched.into_iter().chain(tables.touched).collect();
    Ok(FormCopy {
        document,
        modified: layers.modified || tables.modified,
        touched,
    })
}
