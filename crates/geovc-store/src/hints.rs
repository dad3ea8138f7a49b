/// Construction hints for a store backend.
///
/// Passed explicitly to the backend constructor; there is no ambient
/// configuration lookup anywhere in the core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreHints {
    /// Open the object store read-only; every write fails with
    /// [`StoreError::ReadOnly`](crate::StoreError::ReadOnly).
    pub objects_read_only: bool,
}

impl StoreHints {
    pub fn read_only() -> Self {
        Self {
            objects_read_only: true,
        }
    }
}
