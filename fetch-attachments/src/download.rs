//! Resolving layers and downloading their attachments.
//!
//! Nothing in the loop is fatal: a layer whose search fails is skipped, an attachment which
//! can not be fetched is skipped, and every decision ends up in the `DownloadReport`.
//!

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use eyre::Result;
use tracing::{debug, error, info, trace, warn};

use portal_client::{Attachment, Attachments, Content, FeatureLayer, LookupError};

/// Where the layers come from
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Item id of a service, all its layers then all its tables
    Item(String),
    /// One layer or table endpoint
    Layer(String),
}

/// Turn the target into a list of layers.
///
#[tracing::instrument(skip(portal))]
pub fn resolve_layers<C: Content + ?Sized>(portal: &C, target: &Target) -> Result<Vec<FeatureLayer>> {
    trace!("resolve_layers");

    match target {
        Target::Item(id) => {
            let item = portal
                .get_item(id)?
                .ok_or_else(|| LookupError::NotFound(id.clone()))?;
            let layers = portal.item_layers(&item)?;
            info!("{} layers and tables found in {}", layers.len(), item.title);
            Ok(layers)
        }
        Target::Layer(url) => Ok(vec![FeatureLayer::from_url(url)]),
    }
}

/// What happened to one attachment or one layer
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Downloaded {
        layer: FeatureLayer,
        attachment: Attachment,
        path: PathBuf,
    },
    AttachmentFailed {
        layer: FeatureLayer,
        attachment: Attachment,
        reason: String,
    },
    /// The search itself failed, nothing was tried on that layer
    LayerFailed { layer: FeatureLayer, reason: String },
}

impl Outcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Downloaded { .. })
    }
}

/// Ordered list of outcomes, in processing order.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub outcomes: Vec<Outcome>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_attachments(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::AttachmentFailed { .. }))
            .count()
    }

    pub fn failed_layers(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::LayerFailed { .. }))
            .count()
    }
}

impl Display for DownloadReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} attachment(s) downloaded, {} failed, {} layer(s) skipped",
            self.downloaded(),
            self.failed_attachments(),
            self.failed_layers()
        )
    }
}

/// Search every layer with `filter` and download what matches below `out`.
///
#[tracing::instrument(skip(portal, layers))]
pub fn download_all<A: Attachments + ?Sized>(
    portal: &A,
    layers: &[FeatureLayer],
    filter: &str,
    out: &Path,
) -> DownloadReport {
    trace!("download_all");

    info!("Downloading attachments");
    let mut report = DownloadReport::default();

    for layer in layers {
        let found = match portal.search_attachments(layer, filter) {
            Ok(found) => found,
            Err(e) => {
                error!("Unable to search attachments in {layer}: {e}");
                report.outcomes.push(Outcome::LayerFailed {
                    layer: layer.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        info!("{}: {} attachment(s)", layer, found.len());

        for attachment in found {
            debug!(
                "{}/{}: {}",
                attachment.parent_object_id, attachment.id, attachment.name
            );
            let outcome = match portal.download_attachment(layer, &attachment, out) {
                Ok(path) => Outcome::Downloaded {
                    layer: layer.clone(),
                    attachment,
                    path,
                },
                Err(e) => {
                    warn!(
                        "Unable to download attachment {} of feature {} in {layer}: {e}",
                        attachment.id, attachment.parent_object_id
                    );
                    Outcome::AttachmentFailed {
                        layer: layer.clone(),
                        attachment,
                        reason: e.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::fs;

    use portal_client::{Item, PortalError};
    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;

    /// Layers and attachments held in memory, writing files for real.
    ///
    #[derive(Debug, Default)]
    struct FakePortal {
        layers: BTreeMap<String, Vec<Attachment>>,
        broken_layers: BTreeSet<String>,
        broken_attachments: BTreeSet<i64>,
        item: Option<Item>,
    }

    fn attachment(id: i64, oid: i64, name: &str) -> Attachment {
        Attachment {
            id,
            name: name.to_string(),
            parent_object_id: oid,
            content_type: Some("image/jpeg".to_string()),
            size: None,
        }
    }

    impl Attachments for FakePortal {
        fn search_attachments(
            &self,
            layer: &FeatureLayer,
            _filter: &str,
        ) -> Result<Vec<Attachment>, PortalError> {
            if self.broken_layers.contains(&layer.url) {
                return Err(PortalError::Remote {
                    code: 400,
                    message: "Unable to complete operation.".to_string(),
                    details: vec![],
                });
            }
            Ok(self.layers.get(&layer.url).cloned().unwrap_or_default())
        }

        fn download_attachment(
            &self,
            layer: &FeatureLayer,
            attachment: &Attachment,
            dir: &Path,
        ) -> Result<PathBuf, PortalError> {
            if self.broken_attachments.contains(&attachment.id) {
                return Err(PortalError::Status {
                    status: 500,
                    url: format!("attachments/{}", attachment.id),
                });
            }
            let path = dir.join(layer.attachment_path(attachment));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, format!("{}:{}", layer.url, attachment.id))?;
            Ok(path)
        }
    }

    impl Content for FakePortal {
        fn get_item(&self, id: &str) -> Result<Option<Item>, PortalError> {
            Ok(self.item.clone().filter(|i| i.id == id))
        }

        fn item_data(&self, _item: &Item) -> Result<Value, PortalError> {
            Ok(Value::Null)
        }

        fn update_item_data(&self, _item: &Item, _data: &Value) -> Result<(), PortalError> {
            Ok(())
        }

        fn item_layers(&self, _item: &Item) -> Result<Vec<FeatureLayer>, PortalError> {
            Ok(self.layers.keys().map(|u| FeatureLayer::from_url(u)).collect())
        }
    }

    fn fake() -> FakePortal {
        let mut layers = BTreeMap::new();
        layers.insert(
            "https://x/rest/services/s/FeatureServer/0".to_string(),
            vec![attachment(1, 10, "a.jpg"), attachment(2, 10, "b.jpg")],
        );
        layers.insert(
            "https://x/rest/services/s/FeatureServer/1".to_string(),
            vec![attachment(3, 20, "c.jpg")],
        );
        FakePortal {
            layers,
            ..FakePortal::default()
        }
    }

    #[test]
    fn test_download_all() {
        let dir = tempdir().unwrap();
        let p = fake();
        let layers: Vec<_> = p.layers.keys().map(|u| FeatureLayer::from_url(u)).collect();

        let report = download_all(&p, &layers, "1=1", dir.path());

        assert_eq!(3, report.downloaded());
        assert_eq!(0, report.failed_attachments());
        assert!(dir.path().join("s_FeatureServer_0/10/1-a.jpg").exists());
        assert!(dir.path().join("s_FeatureServer_0/10/2-b.jpg").exists());
        assert!(dir.path().join("s_FeatureServer_1/20/3-c.jpg").exists());
        assert_eq!(
            "3 attachment(s) downloaded, 0 failed, 0 layer(s) skipped",
            report.to_string()
        );
    }

    #[test]
    fn test_download_layer_failure_continues() {
        let dir = tempdir().unwrap();
        let mut p = fake();
        p.broken_layers.insert("https://x/rest/services/s/FeatureServer/0".to_string());
        let layers: Vec<_> = p.layers.keys().map(|u| FeatureLayer::from_url(u)).collect();

        let report = download_all(&p, &layers, "1=1", dir.path());

        assert_eq!(1, report.failed_layers());
        assert_eq!(1, report.downloaded());
        assert!(matches!(
            &report.outcomes[0],
            Outcome::LayerFailed { layer, .. } if layer.url == "https://x/rest/services/s/FeatureServer/0"
        ));
        assert!(dir.path().join("s_FeatureServer_1/20/3-c.jpg").exists());
    }

    #[test]
    fn test_download_attachment_failure_continues() {
        let dir = tempdir().unwrap();
        let mut p = fake();
        p.broken_attachments.insert(1);
        let layers: Vec<_> = p.layers.keys().map(|u| FeatureLayer::from_url(u)).collect();

        let report = download_all(&p, &layers, "1=1", dir.path());

        assert_eq!(3, report.outcomes.len());
        assert_eq!(2, report.downloaded());
        assert_eq!(1, report.failed_attachments());
        assert!(matches!(
            &report.outcomes[0],
            Outcome::AttachmentFailed { attachment, .. } if attachment.id == 1
        ));
        assert!(!dir.path().join("s_FeatureServer_0/10/1-a.jpg").exists());
        assert!(dir.path().join("s_FeatureServer_0/10/2-b.jpg").exists());
    }

    #[test]
    fn test_download_same_names_kept_apart() {
        let dir = tempdir().unwrap();
        let mut p = FakePortal::default();
        p.layers.insert(
            "https://x/rest/services/s/FeatureServer/0".to_string(),
            vec![attachment(10, 1, "photo.jpg"), attachment(11, 1, "photo.jpg")],
        );
        p.layers.insert(
            "https://x/rest/services/s/FeatureServer/1".to_string(),
            vec![attachment(10, 1, "photo.jpg")],
        );
        let layers: Vec<_> = p.layers.keys().map(|u| FeatureLayer::from_url(u)).collect();

        let report = download_all(&p, &layers, "1=1", dir.path());

        assert_eq!(3, report.downloaded());
        let paths: BTreeSet<PathBuf> = report
            .outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Downloaded { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(3, paths.len());
        assert_eq!(
            "https://x/rest/services/s/FeatureServer/0:10",
            fs::read_to_string(dir.path().join("s_FeatureServer_0/1/10-photo.jpg")).unwrap()
        );
        assert_eq!(
            "https://x/rest/services/s/FeatureServer/0:11",
            fs::read_to_string(dir.path().join("s_FeatureServer_0/1/11-photo.jpg")).unwrap()
        );
        assert_eq!(
            "https://x/rest/services/s/FeatureServer/1:10",
            fs::read_to_string(dir.path().join("s_FeatureServer_1/1/10-photo.jpg")).unwrap()
        );
    }

    #[test]
    fn test_download_nothing() {
        let dir = tempdir().unwrap();
        let p = FakePortal::default();

        let report = download_all(&p, &[], "1=1", dir.path());

        assert_eq!(DownloadReport::default(), report);
    }

    #[test]
    fn test_resolve_layer_url() {
        let p = FakePortal::default();

        let r = resolve_layers(&p, &Target::Layer("https://x/FeatureServer/3/".to_string()))
            .unwrap();

        assert_eq!(vec![FeatureLayer::from_url("https://x/FeatureServer/3")], r);
    }

    #[test]
    fn test_resolve_item() {
        let mut p = fake();
        p.item = Some(Item {
            id: "abc".to_string(),
            kind: "Feature Service".to_string(),
            title: "Inspections".to_string(),
            ..Item::default()
        });

        let r = resolve_layers(&p, &Target::Item("abc".to_string())).unwrap();

        assert_eq!(2, r.len());
        assert_eq!("https://x/rest/services/s/FeatureServer/0", r[0].url);
    }

    #[test]
    fn test_resolve_missing_item() {
        let p = fake();

        let r = resolve_layers(&p, &Target::Item("nope".to_string()));

        let err = r.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LookupError>(),
            Some(LookupError::NotFound(id)) if id == "nope"
        ));
    }
}
