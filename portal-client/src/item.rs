//! Portal items and the `Content` implementation for `Portal`.
//!

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{Content, FeatureLayer, Portal, PortalError};

/// Type of the items we copy forms between
pub const WEB_MAP: &str = "web map";

/// A uniquely identified content object on the portal.  Only what we use is kept.
///
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    /// "Web Map", "Feature Service", …
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub owner: String,
    /// Folder id when not in the owner's root folder
    #[serde(default)]
    pub owner_folder: Option<String>,
    /// Service endpoint for service items
    #[serde(default)]
    pub url: Option<String>,
}

impl Item {
    /// Case does not matter, the portal says "Web Map".
    ///
    #[inline]
    pub fn is_web_map(&self) -> bool {
        self.kind.eq_ignore_ascii_case(WEB_MAP)
    }

    /// Path of the `update` endpoint, relative to the REST root.
    ///
    pub fn update_path(&self) -> String {
        match self.owner_folder.as_deref() {
            Some(folder) if !folder.is_empty() => format!(
                "content/users/{}/{}/items/{}/update",
                self.owner, folder, self.id
            ),
            _ => format!("content/users/{}/items/{}/update", self.owner, self.id),
        }
    }
}

/// Reply from `update`
///
#[derive(Debug, Deserialize)]
struct UpdateReply {
    #[serde(default)]
    success: bool,
}

/// One entry of a service's `layers` or `tables`
///
#[derive(Debug, Deserialize)]
struct ServiceEntry {
    id: i64,
    #[serde(default)]
    name: String,
}

/// Service description
///
#[derive(Debug, Default, Deserialize)]
struct ServiceInfo {
    #[serde(default)]
    layers: Vec<ServiceEntry>,
    #[serde(default)]
    tables: Vec<ServiceEntry>,
}

impl Content for Portal {
    #[tracing::instrument(skip(self))]
    fn get_item(&self, id: &str) -> Result<Option<Item>, PortalError> {
        let url = self.rest(&format!("content/items/{id}"));

        match self.get_json::<Item>(&url, &[("f", "json")]) {
            Ok(item) => {
                debug!("found {} ({})", item.id, item.kind);
                Ok(Some(item))
            }
            Err(e) if e.is_not_found() => {
                debug!("no item {id}: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self))]
    fn item_data(&self, item: &Item) -> Result<Value, PortalError> {
        let url = self.rest(&format!("content/items/{}/data", item.id));
        self.get_json(&url, &[("f", "json")])
    }

    #[tracing::instrument(skip(self, data))]
    fn update_item_data(&self, item: &Item, data: &Value) -> Result<(), PortalError> {
        let url = self.rest(&item.update_path());
        let text = data.to_string();
        trace!("update {} with {} bytes", item.id, text.len());

        let reply: UpdateReply = self.post_form(&url, &[("text", text.as_str()), ("f", "json")])?;
        if reply.success {
            Ok(())
        } else {
            Err(PortalError::UpdateFailed(item.id.clone()))
        }
    }

    #[tracing::instrument(skip(self))]
    fn item_layers(&self, item: &Item) -> Result<Vec<FeatureLayer>, PortalError> {
        let base = match item.url.as_deref() {
            Some(url) if !url.is_empty() => url.trim_end_matches('/'),
            _ => return Err(PortalError::NoServiceUrl(item.id.clone())),
        };
        let info: ServiceInfo = self.get_json(base, &[("f", "json")])?;

        let res: Vec<_> = info
            .layers
            .iter()
            .chain(info.tables.iter())
            .map(|e| FeatureLayer::new(&format!("{}/{}", base, e.id), &e.name))
            .collect();
        debug!("{} layers/tables in {}", res.len(), item.id);
        Ok(res)
    }
}
