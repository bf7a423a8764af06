use rusqlite::types::Value;

use crate::error::DataAccessError;
use crate::types::ParamValue;

/// Convert a single bind parameter to the matching `SQLite` value.
#[must_use]
pub(crate) fn param_to_sqlite_value(value: &ParamValue) -> Value {
    match value {
        ParamValue::Int(i) => Value::Integer(*i),
        ParamValue::Float(f) => Value::Real(*f),
        ParamValue::Text(s) => Value::Text(s.clone()),
        ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
        ParamValue::Null => Value::Null,
    }
}

/// Owned `SQLite` parameter container for the write path.
pub(crate) struct SqliteParams(pub(crate) Vec<Value>);

impl SqliteParams {
    pub(crate) fn convert(params: &[ParamValue]) -> Self {
        Self(params.iter().map(param_to_sqlite_value).collect())
    }
}

/// Coerce read-path parameters to their string form.
///
/// The read path binds strings only. Integers and floats use their display
/// form; blobs and NULLs have no faithful string form, so they are rejected
/// rather than bound as garbage.
pub(crate) fn params_as_strings(params: &[ParamValue]) -> Result<Vec<String>, DataAccessError> {
    params
        .iter()
        .enumerate()
        .map(|(idx, param)| match param {
            ParamValue::Text(s) => Ok(s.clone()),
            ParamValue::Int(i) => Ok(i.to_string()),
            ParamValue::Float(f) => Ok(f.to_string()),
            ParamValue::Blob(_) => Err(DataAccessError::ParameterError(format!(
                "parameter {idx} is a blob; blob parameters are not supported on the read path"
            ))),
            ParamValue::Null => Err(DataAccessError::ParameterError(format!(
                "parameter {idx} is null; null parameters are not supported on the read path"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rusqlite::types::Value;

    use super::{param_to_sqlite_value, params_as_strings};
    use crate::error::DataAccessError;
    use crate::types::ParamValue;

    #[test]
    fn write_path_maps_every_variant() {
        assert_eq!(
            param_to_sqlite_value(&ParamValue::Int(3)),
            Value::Integer(3)
        );
        assert_eq!(
            param_to_sqlite_value(&ParamValue::Float(2.5)),
            Value::Real(2.5)
        );
        assert_eq!(
            param_to_sqlite_value(&ParamValue::Text("a".into())),
            Value::Text("a".into())
        );
        assert_eq!(
            param_to_sqlite_value(&ParamValue::Blob(vec![9])),
            Value::Blob(vec![9])
        );
        assert_eq!(param_to_sqlite_value(&ParamValue::Null), Value::Null);
    }

    #[test]
    fn read_path_coerces_scalars_to_strings() {
        let strings = params_as_strings(&[
            ParamValue::Int(7),
            ParamValue::Float(1.5),
            ParamValue::Text("x".into()),
        ])
        .unwrap();
        assert_eq!(strings, vec!["7", "1.5", "x"]);
    }

    #[test]
    fn read_path_rejects_blob_and_null() {
        for bad in [ParamValue::Blob(vec![1]), ParamValue::Null] {
            let err = params_as_strings(std::slice::from_ref(&bad)).unwrap_err();
            assert!(matches!(err, DataAccessError::ParameterError(_)));
        }
    }
}
