//! In-progress tier collection bound to the product creation form.

use super::{TierError, TierRow};

/// Ordered, position-addressed tier rows being edited before submission.
///
/// Nothing here validates `units >= 1` or `min_qty >= 1`; rows are
/// submitted exactly as edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierForm<T> {
    rows: Vec<T>,
}

impl<T> Default for TierForm<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: TierRow> TierForm<T> {
    /// An empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a form from existing rows, keeping their order.
    #[must_use]
    pub const fn from_rows(rows: Vec<T>) -> Self {
        Self { rows }
    }

    /// Append a default tier and return its index.
    pub fn add_tier(&mut self) -> usize {
        self.rows.push(T::default_row());
        self.rows.len() - 1
    }

    /// Append an already-filled tier.
    pub fn push(&mut self, row: T) {
        self.rows.push(row);
    }

    /// Set one field of the tier at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TierError::IndexOutOfBounds`] if `index` is past the end, or
    /// [`TierError::InvalidNumber`] if a numeric field receives non-numeric
    /// text. The row is left unchanged on error.
    pub fn update_tier(&mut self, index: usize, field: T::Field, value: &str) -> Result<(), TierError> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(TierError::IndexOutOfBounds { index, len })?;
        row.set_field(field, value)
    }

    /// Remove the tier at `index`, shifting later tiers down.
    ///
    /// Out-of-range indices are a no-op and return `None`.
    pub fn remove_tier(&mut self, index: usize) -> Option<T> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Rows in submission order.
    #[must_use]
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Consume the form and return its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the form has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop all rows.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
