//! Typed view of a web map document.
//!
//! Only `operationalLayers`, `tables` and, inside them, `url`, `title` and `formInfo` are looked
//! at.  Everything else is kept in the flattened `rest` maps and written back as-is.
//!

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One operational layer or table of a map.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LayerDescriptor {
    /// Layer endpoint, this is the identity used for matching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Opaque form definition
    #[serde(rename = "formInfo", default, skip_serializing_if = "Option::is_none")]
    pub form_info: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl LayerDescriptor {
    /// A `null` or `{}` form is no form at all.
    ///
    pub fn has_form(&self) -> bool {
        match &self.form_info {
            None | Some(Value::Null) => false,
            Some(Value::Object(m)) => !m.is_empty(),
            Some(_) => true,
        }
    }

    /// Something to show in the logs
    ///
    pub fn label(&self) -> String {
        match (&self.title, &self.url) {
            (Some(title), _) => title.clone(),
            (None, Some(url)) => url.clone(),
            (None, None) => "<unnamed>".to_string(),
        }
    }
}

/// The JSON data of a web map item.
///
/// Both collections are optional so that a map without `tables` is written back without one.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MapDocument {
    #[serde(
        rename = "operationalLayers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operational_layers: Option<Vec<LayerDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<LayerDescriptor>>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl MapDocument {
    pub fn from_value(data: Value) -> serde_json::Result<Self> {
        serde_json::from_value(data)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    #[inline]
    pub fn layers(&self) -> &[LayerDescriptor] {
        self.operational_layers.as_deref().unwrap_or_default()
    }

    #[inline]
    pub fn tables(&self) -> &[LayerDescriptor] {
        self.tables.as_deref().unwrap_or_default()
    }
}
