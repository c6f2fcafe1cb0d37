//! This is the module handling the actual copy between two maps.
//!

use eyre::Result;
use tracing::{info, trace};

use portal_client::{Content, Item, LookupError};

use crate::{copy_forms, MapDocument, MergePolicy};

/// What to copy
///
#[derive(Clone, Debug)]
pub struct CopyOpts {
    /// Source map item id
    pub source: String,
    /// Destination map item id
    pub dest: String,
    pub policy: MergePolicy,
}

/// How it went
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyStatus {
    /// Destination saved, with the layers and tables which got a form
    Saved(Vec<String>),
    /// Nothing matched, destination left alone
    Unchanged,
}

/// Fetch the item and make sure this is a web map
///
fn get_web_map<C: Content + ?Sized>(portal: &C, id: &str) -> Result<Item> {
    let item = portal
        .get_item(id)?
        .ok_or_else(|| LookupError::NotFound(id.to_string()))?;

    if !item.is_web_map() {
        return Err(LookupError::NotWebMap {
            id: item.id.clone(),
            kind: item.kind.clone(),
        }
        .into());
    }
    Ok(item)
}

/// Copy forms from one map to the other, saving the destination only if something changed.
///
/// A `MergeError` comes back untouched inside the report so the caller can tell it apart.
///
#[tracing::instrument(skip(portal))]
pub fn copy_form_between_maps<C: Content + ?Sized>(
    portal: &C,
    opts: &CopyOpts,
) -> Result<CopyStatus> {
    trace!("copy_form_between_maps");

    // Get the maps
    //
    let source = get_web_map(portal, &opts.source)?;
    let dest = get_web_map(portal, &opts.dest)?;

    info!("Iterating through layers");
    let src_doc = MapDocument::from_value(portal.item_data(&source)?)?;
    let dst_doc = MapDocument::from_value(portal.item_data(&dest)?)?;

    let copy = copy_forms(&src_doc, &dst_doc, &opts.policy)?;

    if copy.modified {
        info!("Saving form(s) to destination map: {}", copy.touched.join(", "));
        portal.update_item_data(&dest, &copy.document.to_value()?)?;
        Ok(CopyStatus::Saved(copy.touched))
    } else {
        info!("No matching layers were found! Your destination map was not modified");
        Ok(CopyStatus::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use portal_client::{FeatureLayer, PortalError};
    use serde_json::{json, Value};

    use super::*;
    use crate::MergeError;

    /// In-memory portal
    ///
    #[derive(Debug, Default)]
    struct FakePortal {
        items: BTreeMap<String, (Item, Value)>,
        updates: RefCell<Vec<(String, Value)>>,
    }

    impl FakePortal {
        fn with(mut self, id: &str, kind: &str, data: Value) -> Self {
            let item = Item {
                id: id.to_string(),
                kind: kind.to_string(),
                owner: "john".to_string(),
                ..Item::default()
            };
            self.items.insert(id.to_string(), (item, data));
            self
        }
    }

    impl Content for FakePortal {
        fn get_item(&self, id: &str) -> Result<Option<Item>, PortalError> {
            Ok(self.items.get(id).map(|(i, _)| i.clone()))
        }

        fn item_data(&self, item: &Item) -> Result<Value, PortalError> {
            Ok(self.items[&item.id].1.clone())
        }

        fn update_item_data(&self, item: &Item, data: &Value) -> Result<(), PortalError> {
            self.updates
                .borrow_mut()
                .push((item.id.clone(), data.clone()));
            Ok(())
        }

        fn item_layers(&self, _item: &Item) -> Result<Vec<FeatureLayer>, PortalError> {
            Ok(vec![])
        }
    }

    fn opts(overwrite: bool) -> CopyOpts {
        CopyOpts {
            source: "src".to_string(),
            dest: "dst".to_string(),
            policy: MergePolicy {
                overwrite,
                layer_name: None,
            },
        }
    }

    fn portal(dst_tables: Value) -> FakePortal {
        FakePortal::default()
            .with(
                "src",
                "Web Map",
                json!({"operationalLayers": [], "tables": [{"url": "X", "formInfo": {"f": 1}}]}),
            )
            .with(
                "dst",
                "Web Map",
                json!({"operationalLayers": [], "tables": dst_tables}),
            )
    }

    #[test]
    fn test_copy_saves_destination() {
        let p = portal(json!([{"url": "X", "title": "T"}]));

        let r = copy_form_between_maps(&p, &opts(false)).unwrap();

        assert_eq!(CopyStatus::Saved(vec!["T".to_string()]), r);
        let updates = p.updates.borrow();
        assert_eq!(1, updates.len());
        assert_eq!("dst", updates[0].0);
        assert_eq!(
            json!({"operationalLayers": [], "tables": [{"url": "X", "title": "T", "formInfo": {"f": 1}}]}),
            updates[0].1
        );
    }

    #[test]
    fn test_copy_conflict_saves_nothing() {
        let p = portal(json!([{"url": "X", "title": "T", "formInfo": {"f": 0}}]));

        let r = copy_form_between_maps(&p, &opts(false));

        let err = r.unwrap_err();
        assert!(err.downcast_ref::<MergeError>().is_some());
        assert!(p.updates.borrow().is_empty());
    }

    #[test]
    fn test_copy_conflict_overwrite() {
        let p = portal(json!([{"url": "X", "title": "T", "formInfo": {"f": 0}}]));

        let r = copy_form_between_maps(&p, &opts(true)).unwrap();

        assert_eq!(CopyStatus::Saved(vec!["T".to_string()]), r);
        assert_eq!(1, p.updates.borrow().len());
    }

    #[test]
    fn test_copy_no_match_saves_nothing() {
        let p = portal(json!([{"url": "Y", "title": "T"}]));

        let r = copy_form_between_maps(&p, &opts(false)).unwrap();

        assert_eq!(CopyStatus::Unchanged, r);
        assert!(p.updates.borrow().is_empty());
    }

    #[test]
    fn test_copy_missing_map() {
        let p = FakePortal::default().with("src", "Web Map", json!({}));

        let r = copy_form_between_maps(&p, &opts(false));

        let err = r.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LookupError>(),
            Some(LookupError::NotFound(id)) if id == "dst"
        ));
    }

    #[test]
    fn test_copy_not_a_web_map() {
        let p = FakePortal::default()
            .with("src", "Web Map", json!({}))
            .with("dst", "Feature Service", json!({}));

        let r = copy_form_between_maps(&p, &opts(false));

        let err = r.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LookupError>(),
            Some(LookupError::NotWebMap { .. })
        ));
        assert!(p.updates.borrow().is_empty());
    }
}
