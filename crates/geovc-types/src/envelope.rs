use serde::{Deserialize, Serialize};

/// Two-dimensional bounding extent.
///
/// Every canonical tree node carries the union of the extents beneath it so
/// external query layers can prune whole subtrees spatially without reading
/// them. The null envelope (`min > max`) means "no extent known" and is the
/// identity element of [`expand_to_include`].
///
/// [`expand_to_include`]: Envelope::expand_to_include
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A degenerate envelope covering a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// The null envelope: contains nothing, unions to the other operand.
    pub fn null() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_null(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow this envelope to cover `other`.
    pub fn expand_to_include(&mut self, other: &Envelope) {
        if other.is_null() {
            return;
        }
        if self.is_null() {
            *self = *other;
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// The union of two envelopes.
    pub fn union(&self, other: &Envelope) -> Envelope {
        let mut out = *self;
        out.expand_to_include(other);
        out
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        !self.is_null() && x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_envelope_is_null() {
        assert!(Envelope::null().is_null());
        assert!(!Envelope::new(0.0, 0.0, 1.0, 1.0).is_null());
    }

    #[test]
    fn expand_from_null_adopts_other() {
        let mut e = Envelope::null();
        let other = Envelope::new(1.0, 2.0, 3.0, 4.0);
        e.expand_to_include(&other);
        assert_eq!(e, other);
    }

    #[test]
    fn expand_with_null_is_identity() {
        let mut e = Envelope::new(1.0, 2.0, 3.0, 4.0);
        e.expand_to_include(&Envelope::null());
        assert_eq!(e, Envelope::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn union_covers_both() {
        let a = Envelope::new(0.0, 0.0, 1.0, 1.0);
        let b = Envelope::new(2.0, -1.0, 3.0, 0.5);
        let u = a.union(&b);
        assert_eq!(u, Envelope::new(0.0, -1.0, 3.0, 1.0));
    }

    #[test]
    fn intersects_overlapping() {
        let a = Envelope::new(0.0, 0.0, 2.0, 2.0);
        let b = Envelope::new(1.0, 1.0, 3.0, 3.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn disjoint_do_not_intersect() {
        let a = Envelope::new(0.0, 0.0, 1.0, 1.0);
        let b = Envelope::new(5.0, 5.0, 6.0, 6.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn null_never_intersects() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&Envelope::null()));
        assert!(!Envelope::null().intersects(&a));
    }

    #[test]
    fn contains_point_boundaries() {
        let e = Envelope::new(0.0, 0.0, 1.0, 1.0);
        assert!(e.contains_point(0.0, 0.0));
        assert!(e.contains_point(1.0, 1.0));
        assert!(!e.contains_point(1.1, 0.5));
    }
}
