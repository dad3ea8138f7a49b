//! Canonical encoder: one fixed byte layout per object kind.

use geovc_types::{
    AttributeDescriptor, AttributeKind, AttributeValue, Bucket, Envelope, EntryKind, NodeEntry,
    PersonIdent, RevCommit, RevFeature, RevFeatureType, RevObject, RevTag, RevTree, TreeNode,
};

pub(crate) const KIND_COMMIT: u8 = 1;
pub(crate) const KIND_TREE: u8 = 2;
pub(crate) const KIND_FEATURE: u8 = 3;
pub(crate) const KIND_FEATURE_TYPE: u8 = 4;
pub(crate) const KIND_TAG: u8 = 5;

pub(crate) const NODE_LEAF: u8 = 0;
pub(crate) const NODE_BUCKETS: u8 = 1;

pub(crate) const ENTRY_FEATURE: u8 = 0;
pub(crate) const ENTRY_TREE: u8 = 1;

pub(crate) const VALUE_NULL: u8 = 0;
pub(crate) const VALUE_BOOL: u8 = 1;
pub(crate) const VALUE_INT: u8 = 2;
pub(crate) const VALUE_LONG: u8 = 3;
pub(crate) const VALUE_DOUBLE: u8 = 4;
pub(crate) const VALUE_TEXT: u8 = 5;
pub(crate) const VALUE_BYTES: u8 = 6;
pub(crate) const VALUE_GEOMETRY: u8 = 7;

/// Produce the canonical byte encoding of a revision object.
pub fn encode(object: &RevObject) -> Vec<u8> {
    let mut w = Writer::default();
    match object {
        RevObject::Commit(c) => encode_commit(&mut w, c),
        RevObject::Tree(t) => encode_tree(&mut w, t),
        RevObject::Feature(f) => encode_feature(&mut w, f),
        RevObject::FeatureType(t) => encode_feature_type(&mut w, t),
        RevObject::Tag(t) => encode_tag(&mut w, t),
    }
    w.out
}

#[derive(Default)]
struct Writer {
    out: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, v: u8) {
        self.out.push(v);
    }

    fn u32(&mut self, v: u32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn f64(&mut self, v: f64) {
        self.out.extend_from_slice(&v.to_bits().to_be_bytes());
    }

    fn bytes(&mut self, v: &[u8]) {
        self.u32(v.len() as u32);
        self.out.extend_from_slice(v);
    }

    fn string(&mut self, v: &str) {
        self.bytes(v.as_bytes());
    }

    fn object_id(&mut self, id: &geovc_types::ObjectId) {
        self.out.extend_from_slice(id.as_bytes());
    }

    fn envelope(&mut self, e: &Envelope) {
        self.f64(e.min_x);
        self.f64(e.min_y);
        self.f64(e.max_x);
        self.f64(e.max_y);
    }

    fn opt_object_id(&mut self, id: &Option<geovc_types::ObjectId>) {
        match id {
            None => self.u8(0),
            Some(id) => {
                self.u8(1);
                self.object_id(id);
            }
        }
    }

    fn opt_envelope(&mut self, e: &Option<Envelope>) {
        match e {
            None => self.u8(0),
            Some(e) => {
                self.u8(1);
                self.envelope(e);
            }
        }
    }

    fn ident(&mut self, ident: &PersonIdent) {
        self.string(&ident.name);
        self.string(&ident.email);
        self.i64(ident.timestamp_ms);
        self.i32(ident.tz_offset_min);
    }
}

fn encode_commit(w: &mut Writer, c: &RevCommit) {
    w.u8(KIND_COMMIT);
    w.object_id(&c.tree_id);
    w.u32(c.parent_ids.len() as u32);
    for parent in &c.parent_ids {
        w.object_id(parent);
    }
    w.ident(&c.author);
    w.ident(&c.committer);
    w.string(&c.message);
}

fn encode_tree(w: &mut Writer, t: &RevTree) {
    w.u8(KIND_TREE);
    w.u64(t.size);
    w.opt_envelope(&t.extent);
    match &t.node {
        TreeNode::Leaf { entries } => {
            w.u8(NODE_LEAF);
            // Canonical order is ascending name order regardless of how the
            // in-memory vector was assembled.
            let mut sorted: Vec<&NodeEntry> = entries.iter().collect();
            sorted.sort_by(|a, b| a.name.cmp(&b.name));
            w.u32(sorted.len() as u32);
            for entry in sorted {
                encode_entry(w, entry);
            }
        }
        TreeNode::Buckets { buckets } => {
            w.u8(NODE_BUCKETS);
            let mut sorted: Vec<&Bucket> = buckets.iter().collect();
            sorted.sort_by_key(|b| b.index);
            w.u32(sorted.len() as u32);
            for bucket in sorted {
                w.u8(bucket.index);
                w.object_id(&bucket.tree_id);
            }
        }
    }
}

fn encode_entry(w: &mut Writer, e: &NodeEntry) {
    w.string(&e.name);
    w.object_id(&e.object_id);
    w.u8(match e.kind {
        EntryKind::Feature => ENTRY_FEATURE,
        EntryKind::Tree => ENTRY_TREE,
    });
    w.opt_object_id(&e.metadata_id);
    w.opt_envelope(&e.extent);
}

fn encode_feature(w: &mut Writer, f: &RevFeature) {
    w.u8(KIND_FEATURE);
    w.u32(f.values.len() as u32);
    for value in &f.values {
        encode_value(w, value);
    }
}

fn encode_value(w: &mut Writer, v: &AttributeValue) {
    match v {
        AttributeValue::Null => w.u8(VALUE_NULL),
        AttributeValue::Bool(b) => {
            w.u8(VALUE_BOOL);
            w.u8(u8::from(*b));
        }
        AttributeValue::Int(i) => {
            w.u8(VALUE_INT);
            w.i32(*i);
        }
        AttributeValue::Long(i) => {
            w.u8(VALUE_LONG);
            w.i64(*i);
        }
        AttributeValue::Double(d) => {
            w.u8(VALUE_DOUBLE);
            w.f64(*d);
        }
        AttributeValue::Text(s) => {
            w.u8(VALUE_TEXT);
            w.string(s);
        }
        AttributeValue::Bytes(b) => {
            w.u8(VALUE_BYTES);
            w.bytes(b);
        }
        AttributeValue::Geometry { wkb, envelope } => {
            w.u8(VALUE_GEOMETRY);
            w.bytes(wkb);
            w.envelope(envelope);
        }
    }
}

fn encode_feature_type(w: &mut Writer, t: &RevFeatureType) {
    w.u8(KIND_FEATURE_TYPE);
    w.string(&t.name);
    w.u32(t.attributes.len() as u32);
    for attr in &t.attributes {
        encode_descriptor(w, attr);
    }
}

fn encode_descriptor(w: &mut Writer, d: &AttributeDescriptor) {
    w.string(&d.name);
    w.u8(attr_kind_tag(d.kind));
}

// Exhaustive both ways, so adding an AttributeKind variant fails to compile
// until the tag is assigned here and recognized by the decoder.
pub(crate) fn attr_kind_tag(kind: AttributeKind) -> u8 {
    match kind {
        AttributeKind::Bool => 0,
        AttributeKind::Int => 1,
        AttributeKind::Long => 2,
        AttributeKind::Double => 3,
        AttributeKind::Text => 4,
        AttributeKind::Bytes => 5,
        AttributeKind::Geometry => 6,
    }
}

pub(crate) fn attr_kind_from_tag(tag: u8) -> Option<AttributeKind> {
    Some(match tag {
        0 => AttributeKind::Bool,
        1 => AttributeKind::Int,
        2 => AttributeKind::Long,
        3 => AttributeKind::Double,
        4 => AttributeKind::Text,
        5 => AttributeKind::Bytes,
        6 => AttributeKind::Geometry,
        _ => return None,
    })
}

fn encode_tag(w: &mut Writer, t: &RevTag) {
    w.u8(KIND_TAG);
    w.string(&t.name);
    w.object_id(&t.commit_id);
    w.string(&t.message);
    w.ident(&t.tagger);
}
