use std::fmt;

use serde::{Deserialize, Serialize};

/// Author or committer identity attached to commits and tags.
///
/// Timestamps are epoch milliseconds with an explicit timezone offset in
/// minutes, so an identity renders the same wall-clock time everywhere while
/// the canonical encoding stays a pair of plain integers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonIdent {
    pub name: String,
    pub email: String,
    /// Milliseconds since the Unix epoch, UTC.
    pub timestamp_ms: i64,
    /// Timezone offset from UTC in minutes at the time of the action.
    pub tz_offset_min: i32,
}

impl PersonIdent {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp_ms: i64,
        tz_offset_min: i32,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp_ms,
            tz_offset_min,
        }
    }
}

impl fmt::Display for PersonIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_name_and_email() {
        let ident = PersonIdent::new("Ada", "ada@example.com", 1_700_000_000_000, -300);
        assert_eq!(format!("{ident}"), "Ada <ada@example.com>");
    }

    #[test]
    fn serde_roundtrip() {
        let ident = PersonIdent::new("Ada", "ada@example.com", 42, 60);
        let json = serde_json::to_string(&ident).unwrap();
        let parsed: PersonIdent = serde_json::from_str(&json).unwrap();
        assert_eq!(ident, parsed);
    }
}
