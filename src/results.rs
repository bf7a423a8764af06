use serde::Serialize;

/// The tabular outcome of one query or mutation.
///
/// Column names and rows are captured in statement order; every cell is
/// coerced to its string form regardless of the underlying storage type.
/// `error` is `None` on success, so callers must inspect it even when the
/// entry point returned `Ok`. Results are created fresh per call and owned
/// by the caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccessResult {
    /// Field names of the resultant table (empty for mutations).
    pub column_names: Vec<String>,
    /// Row data, one string per cell.
    pub rows: Vec<Vec<String>>,
    /// Description of any bind or execution error, `None` when the call
    /// succeeded.
    pub error: Option<String>,
}

impl AccessResult {
    /// Record an error description. Embedded double quotes are normalized to
    /// single quotes so the description stays safe to embed in JSON
    /// transports.
    pub fn set_error(&mut self, description: &str) {
        self.error = Some(description.replace('"', "'"));
    }

    pub(crate) fn failed(description: &str) -> Self {
        let mut result = Self::default();
        result.set_error(description);
        result
    }

    /// Whether this result carries an error description.
    #[must_use]
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Number of rows captured.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Look up one cell by row index and column name.
    #[must_use]
    pub fn get(&self, row: usize, column_name: &str) -> Option<&str> {
        let idx = self
            .column_names
            .iter()
            .position(|name| name == column_name)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}
