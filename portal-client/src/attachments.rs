//! Attachments of feature layers and tables.
//!
//! Searching goes through `queryAttachments` with the filter as `definitionExpression`, the reply
//! groups attachments per parent feature and we flatten it.  Downloading streams the binary
//! content of `<layer>/<oid>/attachments/<id>` into `<dir>/<layer>/<oid>/<id>-<name>`, which is
//! unique for every attachment of every layer.  The content goes to `<file>.part` first and is
//! renamed once complete.
//!

use std::fmt::{Display, Formatter};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use portal_common::makepath;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::{decode_reply, Attachments, Portal, PortalError};

/// A feature layer or table endpoint
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureLayer {
    /// Full endpoint url, ending with the layer id
    pub url: String,
    /// Display name, the url when we do not know better
    pub name: String,
}

impl FeatureLayer {
    pub fn new(url: &str, name: &str) -> Self {
        let url = url.trim_end_matches('/').to_string();
        let name = if name.is_empty() {
            url.clone()
        } else {
            name.to_string()
        };
        FeatureLayer { url, name }
    }

    /// When all we have is the url
    ///
    pub fn from_url(url: &str) -> Self {
        FeatureLayer::new(url, "")
    }

    /// Directory name for this layer, made from the url after `/rest/services/` (or after the
    /// host), e.g. `Inspections_FeatureServer_0`.
    ///
    pub fn dir_name(&self) -> String {
        let path = self.url.split_once("://").map_or(self.url.as_str(), |(_, r)| r);
        let path = match path.split_once("/rest/services/") {
            Some((_, p)) => p,
            None => path.split_once('/').map_or("", |(_, p)| p),
        };
        let name: String = path
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if name.is_empty() {
            "layer".to_string()
        } else {
            name
        }
    }

    /// Where an attachment of this layer goes, relative to the output directory.
    ///
    pub fn attachment_path(&self, attachment: &Attachment) -> PathBuf {
        makepath!(
            self.dir_name(),
            attachment.parent_object_id.to_string(),
            format!("{}-{}", attachment.id, attachment.file_name())
        )
    }
}

impl Display for FeatureLayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One attachment, as returned by the search.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub id: i64,
    pub name: String,
    pub parent_object_id: i64,
    pub content_type: Option<String>,
    pub size: Option<u64>,
}

impl Attachment {
    /// Keep only the last component of the name, the portal does not forbid `/` in there.
    ///
    pub fn file_name(&self) -> String {
        Path::new(&self.name)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("attachment-{}", self.id))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentInfo {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentGroup {
    parent_object_id: i64,
    #[serde(default)]
    attachment_infos: Vec<AttachmentInfo>,
}

/// Payload from `queryAttachments`
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentReply {
    #[serde(default)]
    attachment_groups: Vec<AttachmentGroup>,
}

impl From<AttachmentReply> for Vec<Attachment> {
    fn from(reply: AttachmentReply) -> Self {
        reply
            .attachment_groups
            .into_iter()
            .flat_map(|g| {
                let oid = g.parent_object_id;
                g.attachment_infos.into_iter().map(move |a| Attachment {
                    id: a.id,
                    name: a.name,
                    parent_object_id: oid,
                    content_type: a.content_type,
                    size: a.size,
                })
            })
            .collect()
    }
}

impl Attachments for Portal {
    #[tracing::instrument(skip(self))]
    fn search_attachments(
        &self,
        layer: &FeatureLayer,
        filter: &str,
    ) -> Result<Vec<Attachment>, PortalError> {
        let url = format!("{}/queryAttachments", layer.url);
        let reply: AttachmentReply = self.get_json(
            &url,
            &[
                ("definitionExpression", filter),
                ("returnMetadata", "false"),
                ("f", "json"),
            ],
        )?;

        let res: Vec<Attachment> = reply.into();
        debug!("{} attachments in {}", res.len(), layer);
        Ok(res)
    }

    #[tracing::instrument(skip(self))]
    fn download_attachment(
        &self,
        layer: &FeatureLayer,
        attachment: &Attachment,
        dir: &Path,
    ) -> Result<PathBuf, PortalError> {
        let url = format!(
            "{}/{}/attachments/{}",
            layer.url, attachment.parent_object_id, attachment.id
        );
        let mut resp = self.get_raw(&url)?;

        // Errors come back as JSON with a 200, but so could a genuine .json attachment.
        //
        let is_json = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));

        let fname = dir.join(layer.attachment_path(attachment));
        if let Some(parent) = fname.parent() {
            fs::create_dir_all(parent)?;
        }
        trace!("writing {fname:?}");

        let n = if is_json {
            let text = resp.text()?;
            let _: Value = decode_reply(&url, &text)?;
            save_stream(&fname, &mut text.as_bytes())?
        } else {
            save_stream(&fname, &mut resp)?
        };
        debug!("{n} bytes in {fname:?}");
        Ok(fname)
    }
}

/// Copy `body` into `<fname>.part` then rename it to `fname`.  Nothing is left behind when
/// the copy fails.
///
fn save_stream<R: Read>(fname: &Path, body: &mut R) -> io::Result<u64> {
    let mut part = OsString::from(fname.as_os_str());
    part.push(".part");
    let part = PathBuf::from(part);

    let mut file = File::create(&part)?;
    match io::copy(body, &mut file) {
        Ok(n) => {
            drop(file);
            fs::rename(&part, fname)?;
            Ok(n)
        }
        Err(e) => {
            drop(file);
            if let Err(rm) = fs::remove_file(&part) {
                debug!("can not remove {part:?}: {rm}");
            }
            Err(e)
        }
    }
}
