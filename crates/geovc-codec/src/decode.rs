//! Canonical decoder with strict validation.
//!
//! Anything the encoder would not have produced is rejected: truncation,
//! unknown tags, invalid UTF-8, out-of-order entries, trailing bytes.

use geovc_types::{
    AttributeDescriptor, AttributeValue, Bucket, Envelope, EntryKind, NodeEntry, ObjectId,
    PersonIdent, RevCommit, RevFeature, RevFeatureType, RevObject, RevTag, RevTree, TreeNode,
};

use crate::encode::{
    attr_kind_from_tag, ENTRY_FEATURE, ENTRY_TREE, KIND_COMMIT, KIND_FEATURE, KIND_FEATURE_TYPE,
    KIND_TAG, KIND_TREE, NODE_BUCKETS, NODE_LEAF, VALUE_BOOL, VALUE_BYTES, VALUE_DOUBLE,
    VALUE_GEOMETRY, VALUE_INT, VALUE_LONG, VALUE_NULL, VALUE_TEXT,
};
use crate::error::{CodecError, CodecResult};

/// Decode a revision object from its canonical bytes.
pub fn decode(bytes: &[u8]) -> CodecResult<RevObject> {
    let mut r = Reader { bytes, pos: 0 };
    let object = decode_object(&mut r)?;
    if r.pos != r.bytes.len() {
        return Err(CodecError::TrailingBytes(r.bytes.len() - r.pos));
    }
    Ok(object)
}

/// Decode and verify that the bytes hash to the id they were fetched by.
pub fn decode_verified(bytes: &[u8], expected: &ObjectId) -> CodecResult<RevObject> {
    let computed = crate::hash(bytes);
    if computed != *expected {
        return Err(CodecError::HashMismatch {
            expected: *expected,
            computed,
        });
    }
    decode(bytes)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> CodecResult<i64> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f64(&mut self) -> CodecResult<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(
            self.take(8)?.try_into().unwrap(),
        )))
    }

    fn bytes_field(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn string(&mut self) -> CodecResult<String> {
        let raw = self.bytes_field()?;
        String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8)
    }

    fn object_id(&mut self) -> CodecResult<ObjectId> {
        let raw: [u8; 32] = self.take(32)?.try_into().unwrap();
        Ok(ObjectId::from_hash(raw))
    }

    fn envelope(&mut self) -> CodecResult<Envelope> {
        Ok(Envelope::new(self.f64()?, self.f64()?, self.f64()?, self.f64()?))
    }

    fn presence(&mut self, what: &'static str) -> CodecResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::BadTag { what, value }),
        }
    }

    fn opt_object_id(&mut self) -> CodecResult<Option<ObjectId>> {
        if self.presence("optional id")? {
            Ok(Some(self.object_id()?))
        } else {
            Ok(None)
        }
    }

    fn opt_envelope(&mut self) -> CodecResult<Option<Envelope>> {
        if self.presence("optional envelope")? {
            Ok(Some(self.envelope()?))
        } else {
            Ok(None)
        }
    }

    fn ident(&mut self) -> CodecResult<PersonIdent> {
        Ok(PersonIdent {
            name: self.string()?,
            email: self.string()?,
            timestamp_ms: self.i64()?,
            tz_offset_min: self.i32()?,
        })
    }
}

fn decode_object(r: &mut Reader<'_>) -> CodecResult<RevObject> {
    let kind = r.u8()?;
    match kind {
        KIND_COMMIT => decode_commit(r).map(RevObject::Commit),
        KIND_TREE => decode_tree(r).map(RevObject::Tree),
        KIND_FEATURE => decode_feature(r).map(RevObject::Feature),
        KIND_FEATURE_TYPE => decode_feature_type(r).map(RevObject::FeatureType),
        KIND_TAG => decode_tag(r).map(RevObject::Tag),
        value => Err(CodecError::BadTag {
            what: "object kind",
            value,
        }),
    }
}

fn decode_commit(r: &mut Reader<'_>) -> CodecResult<RevCommit> {
    let tree_id = r.object_id()?;
    let parent_count = r.u32()? as usize;
    let mut parent_ids = Vec::with_capacity(parent_count.min(16));
    for _ in 0..parent_count {
        parent_ids.push(r.object_id()?);
    }
    Ok(RevCommit {
        tree_id,
        parent_ids,
        author: r.ident()?,
        committer: r.ident()?,
        message: r.string()?,
    })
}

fn decode_tree(r: &mut Reader<'_>) -> CodecResult<RevTree> {
    let size = r.u64()?;
    let extent = r.opt_envelope()?;
    let node = match r.u8()? {
        NODE_LEAF => {
            let count = r.u32()? as usize;
            let mut entries = Vec::with_capacity(count.min(1024));
            let mut prev_name: Option<String> = None;
            for _ in 0..count {
                let entry = decode_entry(r)?;
                if let Some(prev) = &prev_name {
                    if *prev >= entry.name {
                        return Err(CodecError::UnsortedEntries(entry.name));
                    }
                }
                prev_name = Some(entry.name.clone());
                entries.push(entry);
            }
            TreeNode::Leaf { entries }
        }
        NODE_BUCKETS => {
            let count = r.u32()? as usize;
            let mut buckets = Vec::with_capacity(count.min(256));
            let mut prev_index: Option<u8> = None;
            for _ in 0..count {
                let index = r.u8()?;
                if let Some(prev) = prev_index {
                    if prev >= index {
                        return Err(CodecError::UnsortedEntries(format!("bucket {index}")));
                    }
                }
                prev_index = Some(index);
                buckets.push(Bucket::new(index, r.object_id()?));
            }
            TreeNode::Buckets { buckets }
        }
        value => {
            return Err(CodecError::BadTag {
                what: "tree node",
                value,
            })
        }
    };
    Ok(RevTree { size, extent, node })
}

fn decode_entry(r: &mut Reader<'_>) -> CodecResult<NodeEntry> {
    let name = r.string()?;
    let object_id = r.object_id()?;
    let kind = match r.u8()? {
        ENTRY_FEATURE => EntryKind::Feature,
        ENTRY_TREE => EntryKind::Tree,
        value => {
            return Err(CodecError::BadTag {
                what: "entry kind",
                value,
            })
        }
    };
    Ok(NodeEntry {
        name,
        object_id,
        kind,
        metadata_id: r.opt_object_id()?,
        extent: r.opt_envelope()?,
    })
}

fn decode_feature(r: &mut Reader<'_>) -> CodecResult<RevFeature> {
    let count = r.u32()? as usize;
    let mut values = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        values.push(decode_value(r)?);
    }
    Ok(RevFeature { values })
}

fn decode_value(r: &mut Reader<'_>) -> CodecResult<AttributeValue> {
    let tag = r.u8()?;
    let value = match tag {
        VALUE_NULL => AttributeValue::Null,
        VALUE_BOOL => match r.u8()? {
            0 => AttributeValue::Bool(false),
            1 => AttributeValue::Bool(true),
            value => {
                return Err(CodecError::BadTag {
                    what: "bool value",
                    value,
                })
            }
        },
        VALUE_INT => AttributeValue::Int(r.i32()?),
        VALUE_LONG => AttributeValue::Long(r.i64()?),
        VALUE_DOUBLE => AttributeValue::Double(r.f64()?),
        VALUE_TEXT => AttributeValue::Text(r.string()?),
        VALUE_BYTES => AttributeValue::Bytes(r.bytes_field()?),
        VALUE_GEOMETRY => AttributeValue::Geometry {
            wkb: r.bytes_field()?,
            envelope: r.envelope()?,
        },
        value => {
            return Err(CodecError::BadTag {
                what: "attribute value",
                value,
            })
        }
    };
    Ok(value)
}

fn decode_feature_type(r: &mut Reader<'_>) -> CodecResult<RevFeatureType> {
    let name = r.string()?;
    let count = r.u32()? as usize;
    let mut attributes = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        let attr_name = r.string()?;
        let tag = r.u8()?;
        let kind = attr_kind_from_tag(tag).ok_or(CodecError::BadTag {
            what: "attribute kind",
            value: tag,
        })?;
        attributes.push(AttributeDescriptor { name: attr_name, kind });
    }
    Ok(RevFeatureType { name, attributes })
}

fn decode_tag(r: &mut Reader<'_>) -> CodecResult<RevTag> {
    Ok(RevTag {
        name: r.string()?,
        commit_id: r.object_id()?,
        message: r.string()?,
        tagger: r.ident()?,
    })
}
