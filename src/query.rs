use rusqlite::types::ValueRef;
use rusqlite::{Statement, ToSql};

use crate::error::DataAccessError;
use crate::results::AccessResult;

/// Coerce one cell to its string form regardless of storage type.
///
/// NULL becomes the empty string; blobs are decoded as UTF-8 with lossy
/// replacement.
fn cell_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Walk a query's cursor into a string-coerced result table.
///
/// Column names are captured once from the prepared statement, then every
/// row is visited in cursor order.
///
/// # Errors
/// Returns [`DataAccessError::SqliteError`] if binding, stepping, or cell
/// extraction fails.
pub(crate) fn build_access_result(
    stmt: &mut Statement,
    params: &[String],
) -> Result<AccessResult, DataAccessError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = column_names.len();

    let mut result = AccessResult {
        column_names,
        ..AccessResult::default()
    };

    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
    let mut rows_iter = stmt.query(&param_refs[..])?;
    while let Some(row) = rows_iter.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            cells.push(cell_to_string(row.get_ref(idx)?));
        }
        result.rows.push(cells);
    }

    Ok(result)
}
