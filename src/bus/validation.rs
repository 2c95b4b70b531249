//! Structural validation of bus messages.

use super::message::{Message, SCHEMA_VERSION};
use super::payload::{DataKind, Payload, SerializedTable};
use serde_json::Value;
use thiserror::Error;

/// Why a message was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0} must be a non-empty string")]
    EmptyField(&'static str),

    #[error("Invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    #[error("Unsupported message version {found} (expected {expected})")]
    VersionMismatch { found: String, expected: String },

    #[error("data_type '{data_type}' requires a {expected:?} payload, got {found}")]
    PayloadMismatch {
        data_type: String,
        expected: DataKind,
        found: &'static str,
    },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

const REQUIRED_FIELDS: [&str; 6] = [
    "source_tab_id",
    "source_tab_type",
    "data_type",
    "data",
    "timestamp",
    "version",
];

/// Validate a typed message. Returns every problem found, empty when valid.
pub fn validate_message(message: &Message) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if message.source_tab_id().is_empty() {
        errors.push(ValidationError::EmptyField("source_tab_id"));
    }
    if message.source_tab_type().is_empty() {
        errors.push(ValidationError::EmptyField("source_tab_type"));
    }
    if message.data_type().is_empty() {
        errors.push(ValidationError::EmptyField("data_type"));
    }
    if !is_iso8601(message.timestamp()) {
        errors.push(ValidationError::InvalidTimestamp(
            message.timestamp().to_string(),
        ));
    }
    if message.schema_version() != SCHEMA_VERSION {
        errors.push(ValidationError::VersionMismatch {
            found: message.schema_version().to_string(),
            expected: SCHEMA_VERSION.to_string(),
        });
    }

    let kind = DataKind::for_data_type(message.data_type());
    if !kind.accepts(message.payload()) {
        errors.push(ValidationError::PayloadMismatch {
            data_type: message.data_type().to_string(),
            expected: kind,
            found: message.payload().kind_name(),
        });
    }
    errors.extend(payload_errors(message.payload()));

    errors
}

fn payload_errors(payload: &Payload) -> Vec<ValidationError> {
    let table_errors = |table: &SerializedTable| {
        table
            .consistency_errors()
            .into_iter()
            .map(ValidationError::MalformedPayload)
            .collect::<Vec<_>>()
    };

    match payload {
        Payload::Table(table) => table_errors(table),
        Payload::FittingData(fit) => {
            let mut errors = table_errors(&fit.data);
            if fit.cleaned_shape != fit.data.shape {
                errors.push(ValidationError::MalformedPayload(format!(
                    "cleaned_shape {:?} does not match table shape {:?}",
                    fit.cleaned_shape, fit.data.shape
                )));
            }
            errors
        }
        Payload::Array(array) => {
            let expected: usize = array.shape.iter().product();
            if array.element_count() != expected {
                vec![ValidationError::MalformedPayload(format!(
                    "array shape {:?} holds {} elements, data has {}",
                    array.shape,
                    expected,
                    array.element_count()
                ))]
            } else {
                Vec::new()
            }
        }
        Payload::Results(results) => {
            if !results.coefficients_uncertainties.is_empty()
                && results.coefficients_uncertainties.len() != results.coefficients.len()
            {
                vec![ValidationError::MalformedPayload(
                    "coefficient uncertainties do not match coefficients".to_string(),
                )]
            } else {
                Vec::new()
            }
        }
        Payload::Parameters(_)
        | Payload::Text(_)
        | Payload::Number(_)
        | Payload::Integer(_)
        | Payload::List(_)
        | Payload::Json(_) => Vec::new(),
    }
}

/// Validate a wire-shaped message (e.g. one read back from disk).
///
/// Checks required keys, string-typed header fields, the timestamp, and that
/// `data` has the shape `data_type` declares (a `dataframe` carries the bare
/// `{data, columns, dtypes, index, shape}` map).
pub fn validate_raw_message(raw: &Value) -> Vec<ValidationError> {
    let Some(obj) = raw.as_object() else {
        return vec![ValidationError::MalformedPayload(
            "message must be a JSON object".to_string(),
        )];
    };

    let mut errors: Vec<ValidationError> = REQUIRED_FIELDS
        .iter()
        .filter(|key| !obj.contains_key(**key))
        .map(|key| ValidationError::MissingField(*key))
        .collect();

    for key in ["source_tab_id", "source_tab_type", "data_type"] {
        if let Some(value) = obj.get(key)
            && value.as_str().is_none_or(str::is_empty)
        {
            errors.push(ValidationError::EmptyField(key));
        }
    }

    if let Some(ts) = obj.get("timestamp") {
        match ts.as_str() {
            Some(ts) if is_iso8601(ts) => {}
            _ => errors.push(ValidationError::InvalidTimestamp(ts.to_string())),
        }
    }

    if let (Some(Value::String(data_type)), Some(data)) = (obj.get("data_type"), obj.get("data"))
    {
        // `data_type` picks the variant, so a shape mismatch surfaces as a decode error
        match Payload::from_wire(data_type, data.clone()) {
            Ok(payload) => errors.extend(payload_errors(&payload)),
            Err(e) => errors.push(ValidationError::MalformedPayload(format!(
                "{data_type} data: {e}"
            ))),
        }
    }

    errors
}

/// Accepts RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS[.ffffff]` timestamps.
pub(crate) fn is_iso8601(ts: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(ts).is_ok()
        || chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::payload::SerializedArray;
    use serde_json::json;

    fn table() -> SerializedTable {
        SerializedTable::from_rows(vec!["x".into()], vec![vec![json!(1)], vec![json!(2)]])
    }

    #[test]
    fn test_valid_table_message() {
        let msg = Message::new("s_1", "spreadsheet", "dataframe", Payload::Table(table()), None);
        assert!(validate_message(&msg).is_empty());
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let msg = Message::new("s_1", "spreadsheet", "dataframe", Payload::Text("x".into()), None);
        let errors = validate_message(&msg);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::PayloadMismatch { expected: DataKind::Table, .. }]
        ));
    }

    #[test]
    fn test_empty_ids_rejected() {
        let msg = Message::new("", "", "", Payload::Integer(1), None);
        assert_eq!(validate_message(&msg).len(), 3);
    }

    #[test]
    fn test_inconsistent_array_rejected() {
        let arr = SerializedArray {
            data: vec![json!(1), json!(2), json!(3)],
            dtype: "int64".into(),
            shape: vec![2],
        };
        let msg = Message::new("s_1", "solver", "numpy_array", Payload::Array(arr), None);
        assert!(matches!(
            validate_message(&msg).as_slice(),
            [ValidationError::MalformedPayload(_)]
        ));
    }

    #[test]
    fn test_raw_message_roundtrip_is_valid() {
        let msg = Message::new("s_1", "spreadsheet", "dataframe", Payload::Table(table()), None);
        assert!(validate_raw_message(&msg.to_json().unwrap()).is_empty());
    }

    #[test]
    fn test_raw_dataframe_message_in_table_shape_is_valid() {
        let raw = json!({
            "source_tab_id": "spreadsheet_1",
            "source_tab_type": "spreadsheet",
            "data_type": "dataframe",
            "data": {
                "data": [{"a": 1}],
                "columns": ["a"],
                "dtypes": {"a": "int64"},
                "index": [0],
                "shape": [1, 1]
            },
            "metadata": {},
            "timestamp": "2025-01-01T10:00:00.000001",
            "version": "1.0"
        });
        assert_eq!(validate_raw_message(&raw), vec![]);
    }

    #[test]
    fn test_raw_dataframe_message_with_non_table_data() {
        let mut raw = Message::new("s_1", "spreadsheet", "dataframe", Payload::Table(table()), None)
            .to_json()
            .unwrap();
        raw["data"] = json!([1, 2, 3]);
        assert!(matches!(
            validate_raw_message(&raw).as_slice(),
            [ValidationError::MalformedPayload(_)]
        ));
    }

    #[test]
    fn test_raw_message_missing_fields() {
        let errors = validate_raw_message(&json!({"source_tab_id": "a"}));
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, ValidationError::MissingField(_)))
                .count(),
            5
        );
    }

    #[test]
    fn test_raw_message_bad_timestamp() {
        let mut raw = Message::new("s_1", "x", "text", Payload::Text("t".into()), None)
            .to_json()
            .unwrap();
        raw["timestamp"] = json!("yesterday");
        assert!(matches!(
            validate_raw_message(&raw).as_slice(),
            [ValidationError::InvalidTimestamp(_)]
        ));
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(is_iso8601("2025-01-01T10:00:00"));
        assert!(is_iso8601("2025-01-01T10:00:00.123456"));
        assert!(is_iso8601("2025-01-01T10:00:00Z"));
        assert!(!is_iso8601("01/01/2025"));
    }
}
