use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;

/// The declared type of a feature attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Bool,
    Int,
    Long,
    Double,
    Text,
    Bytes,
    Geometry,
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Geometry => "geometry",
        };
        write!(f, "{s}")
    }
}

/// A single attribute value of a feature.
///
/// Geometries are carried as opaque WKB plus a pre-computed envelope; the
/// core never interprets the geometry bytes (schema adapters for external
/// geospatial toolkits live outside this engine).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Geometry { wkb: Vec<u8>, envelope: Envelope },
}

impl AttributeValue {
    /// The declared kind this value conforms to, or `None` for null.
    pub fn kind(&self) -> Option<AttributeKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(AttributeKind::Bool),
            Self::Int(_) => Some(AttributeKind::Int),
            Self::Long(_) => Some(AttributeKind::Long),
            Self::Double(_) => Some(AttributeKind::Double),
            Self::Text(_) => Some(AttributeKind::Text),
            Self::Bytes(_) => Some(AttributeKind::Bytes),
            Self::Geometry { .. } => Some(AttributeKind::Geometry),
        }
    }

    /// The spatial extent of this value, if it has one.
    pub fn envelope(&self) -> Option<Envelope> {
        match self {
            Self::Geometry { envelope, .. } => Some(*envelope),
            _ => None,
        }
    }
}

/// One `(name, type)` pair of a feature schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kind_matches_variant() {
        assert_eq!(AttributeValue::Null.kind(), None);
        assert_eq!(AttributeValue::Bool(true).kind(), Some(AttributeKind::Bool));
        assert_eq!(
            AttributeValue::Text("road".into()).kind(),
            Some(AttributeKind::Text)
        );
        let geom = AttributeValue::Geometry {
            wkb: vec![1, 2, 3],
            envelope: Envelope::point(1.0, 2.0),
        };
        assert_eq!(geom.kind(), Some(AttributeKind::Geometry));
    }

    #[test]
    fn only_geometry_has_envelope() {
        assert!(AttributeValue::Long(7).envelope().is_none());
        let geom = AttributeValue::Geometry {
            wkb: vec![],
            envelope: Envelope::new(0.0, 0.0, 1.0, 1.0),
        };
        assert_eq!(geom.envelope(), Some(Envelope::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn kind_display() {
        assert_eq!(format!("{}", AttributeKind::Geometry), "geometry");
        assert_eq!(format!("{}", AttributeKind::Long), "long");
    }
}
