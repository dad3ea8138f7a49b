//! Per-attribute comparison of a modified feature.

use geovc_store::ObjectStore;
use geovc_types::{AttributeValue, EntryKind, ObjectId, RevFeature, RevFeatureType, RevObject};

use crate::entry::{ChangeType, DiffEntry};
use crate::error::{DiffError, DiffResult};

/// One attribute whose value differs between the two sides of a feature.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeChange {
    pub name: String,
    pub old: AttributeValue,
    pub new: AttributeValue,
}

/// Resolve a modified feature entry into per-attribute changes.
///
/// Returns `Ok(None)` when the entry is not a feature modification that both
/// sides describe with the same schema: additions, removals, subtree changes,
/// entries without a metadata id, and schema changes (differing metadata ids)
/// all stay at the entry level. Values beyond the shorter side compare
/// against [`AttributeValue::Null`].
pub fn attribute_diff(
    store: &dyn ObjectStore,
    entry: &DiffEntry,
) -> DiffResult<Option<Vec<AttributeChange>>> {
    if entry.change != ChangeType::Modified {
        return Ok(None);
    }
    let (Some(old), Some(new)) = (&entry.old, &entry.new) else {
        return Ok(None);
    };
    if old.kind != EntryKind::Feature || new.kind != EntryKind::Feature {
        return Ok(None);
    }
    let (Some(schema_id), Some(new_schema_id)) = (old.metadata_id, new.metadata_id) else {
        return Ok(None);
    };
    if schema_id != new_schema_id {
        return Ok(None);
    }

    let schema = load_feature_type(store, &schema_id)?;
    let old_feature = load_feature(store, &old.object_id)?;
    let new_feature = load_feature(store, &new.object_id)?;

    let len = old_feature.values.len().max(new_feature.values.len());
    let mut changes = Vec::new();
    for i in 0..len {
        let ov = old_feature
            .values
            .get(i)
            .cloned()
            .unwrap_or(AttributeValue::Null);
        let nv = new_feature
            .values
            .get(i)
            .cloned()
            .unwrap_or(AttributeValue::Null);
        if ov != nv {
            let name = schema
                .attributes
                .get(i)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| format!("attribute-{i}"));
            changes.push(AttributeChange {
                name,
                old: ov,
                new: nv,
            });
        }
    }
    Ok(Some(changes))
}

fn load_feature(store: &dyn ObjectStore, id: &ObjectId) -> DiffResult<RevFeature> {
    match store.get(id)? {
        RevObject::Feature(f) => Ok(f),
        other => Err(DiffError::UnexpectedKind {
            id: *id,
            expected: "feature",
            actual: other.kind().to_string(),
        }),
    }
}

fn load_feature_type(store: &dyn ObjectStore, id: &ObjectId) -> DiffResult<RevFeatureType> {
    match store.get(id)? {
        RevObject::FeatureType(t) => Ok(t),
        other => Err(DiffError::UnexpectedKind {
            id: *id,
            expected: "featuretype",
            actual: other.kind().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geovc_store::HeapObjectStore;
    use geovc_types::{AttributeDescriptor, AttributeKind, NodeEntry};

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    fn road_schema(store: &HeapObjectStore) -> ObjectId {
        store
            .put(&RevObject::FeatureType(RevFeatureType::new(
                "roads",
                vec![
                    AttributeDescriptor::new("name", AttributeKind::Text),
                    AttributeDescriptor::new("lanes", AttributeKind::Int),
                ],
            )))
            .unwrap()
    }

    fn feature(store: &HeapObjectStore, values: Vec<AttributeValue>) -> ObjectId {
        store.put(&RevObject::Feature(RevFeature::new(values))).unwrap()
    }

    #[test]
    fn reports_only_changed_attributes_by_name() {
        let store = HeapObjectStore::new();
        let schema = road_schema(&store);
        let old_id = feature(
            &store,
            vec![AttributeValue::Text("main st".into()), AttributeValue::Int(2)],
        );
        let new_id = feature(
            &store,
            vec![AttributeValue::Text("main st".into()), AttributeValue::Int(4)],
        );

        let entry = DiffEntry::modified(
            "roads/f1".into(),
            NodeEntry::feature("f1", old_id).with_metadata(schema),
            NodeEntry::feature("f1", new_id).with_metadata(schema),
        );

        let changes = attribute_diff(&store, &entry).unwrap().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name, "lanes");
        assert_eq!(changes[0].old, AttributeValue::Int(2));
        assert_eq!(changes[0].new, AttributeValue::Int(4));
    }

    #[test]
    fn shorter_value_list_pads_with_null() {
        let store = HeapObjectStore::new();
        let schema = road_schema(&store);
        let old_id = feature(&store, vec![AttributeValue::Text("ave".into())]);
        let new_id = feature(
            &store,
            vec![AttributeValue::Text("ave".into()), AttributeValue::Int(1)],
        );

        let entry = DiffEntry::modified(
            "roads/f2".into(),
            NodeEntry::feature("f2", old_id).with_metadata(schema),
            NodeEntry::feature("f2", new_id).with_metadata(schema),
        );

        let changes = attribute_diff(&store, &entry).unwrap().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].name, "lanes");
        assert_eq!(changes[0].old, AttributeValue::Null);
        assert_eq!(changes[0].new, AttributeValue::Int(1));
    }

    #[test]
    fn schema_change_stays_at_entry_level() {
        let store = HeapObjectStore::new();
        let entry = DiffEntry::modified(
            "f".into(),
            NodeEntry::feature("f", oid(1)).with_metadata(oid(7)),
            NodeEntry::feature("f", oid(2)).with_metadata(oid(8)),
        );
        assert!(attribute_diff(&store, &entry).unwrap().is_none());
    }

    #[test]
    fn non_modifications_resolve_to_none() {
        let store = HeapObjectStore::new();
        let added = DiffEntry::added("f".into(), NodeEntry::feature("f", oid(1)));
        assert!(attribute_diff(&store, &added).unwrap().is_none());

        let subtree = DiffEntry::modified(
            "layer".into(),
            NodeEntry::subtree("layer", oid(1)).with_metadata(oid(7)),
            NodeEntry::subtree("layer", oid(2)).with_metadata(oid(7)),
        );
        assert!(attribute_diff(&store, &subtree).unwrap().is_none());

        let untyped = DiffEntry::modified(
            "f".into(),
            NodeEntry::feature("f", oid(1)),
            NodeEntry::feature("f", oid(2)),
        );
        assert!(attribute_diff(&store, &untyped).unwrap().is_none());
    }

    #[test]
    fn wrong_metadata_kind_is_an_error() {
        let store = HeapObjectStore::new();
        // Metadata id pointing at a feature instead of a feature type.
        let bogus = feature(&store, vec![AttributeValue::Int(1)]);
        let old_id = feature(&store, vec![AttributeValue::Int(1)]);
        let new_id = feature(&store, vec![AttributeValue::Int(2)]);
        let entry = DiffEntry::modified(
            "f".into(),
            NodeEntry::feature("f", old_id).with_metadata(bogus),
            NodeEntry::feature("f", new_id).with_metadata(bogus),
        );
        assert!(matches!(
            attribute_diff(&store, &entry),
            Err(DiffError::UnexpectedKind { .. })
        ));
    }
}
