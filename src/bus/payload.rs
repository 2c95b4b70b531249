//! Typed message payloads.
//!
//! Each `data_type` key that has a known shape maps to one [`Payload`]
//! variant through [`DataKind`]; everything else travels as one of the
//! scalar/raw variants.
//!
//! On the wire a payload is the bare value (a `dataframe` is the
//! `{data, columns, dtypes, index, shape}` map itself), so decoding needs the
//! message's `data_type`: see [`Payload::from_wire`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Payload carried by a [`Message`](super::Message).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Row-oriented table (the `dataframe` data type)
    Table(SerializedTable),
    /// N-dimensional numeric array (the `numpy_array` data type)
    Array(SerializedArray),
    /// Cleaned x/y(/weights) table ready for curve fitting
    FittingData(FittingData),
    /// Output of a fit
    Results(FittingResults),
    /// Named parameter values
    Parameters(Map<String, Value>),
    Text(String),
    Number(f64),
    Integer(i64),
    List(Vec<Value>),
    /// Anything else, passed through untouched
    Json(Value),
}

impl Payload {
    /// Short name of the variant, used in logs and validation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Table(_) => "table",
            Payload::Array(_) => "array",
            Payload::FittingData(_) => "fitting_data",
            Payload::Results(_) => "results",
            Payload::Parameters(_) => "parameters",
            Payload::Text(_) => "text",
            Payload::Number(_) => "number",
            Payload::Integer(_) => "integer",
            Payload::List(_) => "list",
            Payload::Json(_) => "json",
        }
    }

    /// Decode a wire `data` value into the variant `data_type` declares.
    ///
    /// Undeclared data types are inferred from the JSON value itself.
    pub fn from_wire(data_type: &str, data: Value) -> serde_json::Result<Self> {
        Ok(match DataKind::for_data_type(data_type) {
            DataKind::Table => Payload::Table(serde_json::from_value(data)?),
            DataKind::Array => Payload::Array(serde_json::from_value(data)?),
            DataKind::FittingData => Payload::FittingData(serde_json::from_value(data)?),
            DataKind::Results => Payload::Results(serde_json::from_value(data)?),
            DataKind::Parameters => Payload::Parameters(serde_json::from_value(data)?),
            DataKind::Any => Payload::infer(data),
        })
    }

    fn infer(data: Value) -> Self {
        match data {
            Value::String(text) => Payload::Text(text),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Payload::Integer(i),
                None => n
                    .as_f64()
                    .map(Payload::Number)
                    .unwrap_or_else(|| Payload::Json(Value::Number(n))),
            },
            Value::Array(items) => Payload::List(items),
            other => Payload::Json(other),
        }
    }

    pub fn as_table(&self) -> Option<&SerializedTable> {
        match self {
            Payload::Table(table) => Some(table),
            Payload::FittingData(fit) => Some(&fit.data),
            _ => None,
        }
    }
}

/// The payload shape a `data_type` key declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Table,
    Array,
    FittingData,
    Results,
    Parameters,
    /// No declared shape; every payload is accepted
    Any,
}

impl DataKind {
    pub fn for_data_type(data_type: &str) -> Self {
        match data_type {
            "dataframe" => DataKind::Table,
            "numpy_array" => DataKind::Array,
            "fitting_data" => DataKind::FittingData,
            "fitting_results" => DataKind::Results,
            "parameters" => DataKind::Parameters,
            _ => DataKind::Any,
        }
    }

    pub fn accepts(self, payload: &Payload) -> bool {
        matches!(
            (self, payload),
            (DataKind::Any, _)
                | (DataKind::Table, Payload::Table(_))
                | (DataKind::Array, Payload::Array(_))
                | (DataKind::FittingData, Payload::FittingData(_))
                | (DataKind::Results, Payload::Results(_))
                | (DataKind::Parameters, Payload::Parameters(_))
        )
    }
}

/// Serialized table: row records plus column metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedTable {
    /// One map per row, keyed by column name
    pub data: Vec<Map<String, Value>>,
    /// Column order
    pub columns: Vec<String>,
    /// Column name -> dtype name (`int64`, `float64`, `bool`, `object`)
    pub dtypes: BTreeMap<String, String>,
    /// Row labels
    pub index: Vec<Value>,
    /// (rows, columns)
    pub shape: (usize, usize),
}

impl SerializedTable {
    /// Build a table from column names and positional rows.
    ///
    /// Rows shorter than `columns` are padded with nulls; extra cells are
    /// dropped. The index is `0..rows` and dtypes are inferred per column.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let data: Vec<Map<String, Value>> = rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                columns
                    .iter()
                    .map(|col| (col.clone(), cells.next().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();
        Self::from_records(columns, data)
    }

    /// Build a table from row records with a default `0..rows` index.
    pub fn from_records(columns: Vec<String>, data: Vec<Map<String, Value>>) -> Self {
        let index = (0..data.len()).map(Value::from).collect();
        Self::with_index(columns, data, index)
    }

    pub fn with_index(
        columns: Vec<String>,
        data: Vec<Map<String, Value>>,
        index: Vec<Value>,
    ) -> Self {
        let dtypes = columns
            .iter()
            .map(|col| {
                let dtype = infer_dtype(data.iter().map(|row| row.get(col)));
                (col.clone(), dtype.to_string())
            })
            .collect();
        let shape = (data.len(), columns.len());
        Self {
            data,
            columns,
            dtypes,
            index,
            shape,
        }
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Values of one column in row order, `None` if the column is unknown.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        if !self.columns.iter().any(|c| c == name) {
            return None;
        }
        Some(
            self.data
                .iter()
                .map(|row| row.get(name).unwrap_or(&Value::Null))
                .collect(),
        )
    }

    /// Check that shape, index and dtypes agree with the records.
    pub fn consistency_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.shape != (self.data.len(), self.columns.len()) {
            errors.push(format!(
                "table shape {:?} does not match {} rows x {} columns",
                self.shape,
                self.data.len(),
                self.columns.len()
            ));
        }
        if self.index.len() != self.data.len() {
            errors.push(format!(
                "table index has {} labels for {} rows",
                self.index.len(),
                self.data.len()
            ));
        }
        for col in self.dtypes.keys() {
            if !self.columns.contains(col) {
                errors.push(format!("dtype declared for unknown column '{col}'"));
            }
        }
        errors
    }
}

fn infer_dtype<'a>(values: impl Iterator<Item = Option<&'a Value>>) -> &'static str {
    let mut saw_int = false;
    let mut saw_float = false;
    let mut saw_bool = false;
    let mut saw_null = false;
    for value in values {
        match value {
            None | Some(Value::Null) => saw_null = true,
            Some(Value::Bool(_)) => saw_bool = true,
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => saw_int = true,
            Some(Value::Number(_)) => saw_float = true,
            Some(_) => return "object",
        }
    }
    match (saw_bool, saw_int, saw_float) {
        (true, false, false) if !saw_null => "bool",
        (false, true, false) if !saw_null => "int64",
        // Integer columns with gaps widen to float, like a NaN-holding column
        (false, _, _) if saw_int || saw_float => "float64",
        _ => "object",
    }
}

/// Serialized numeric array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedArray {
    /// Nested lists, one level per dimension
    pub data: Vec<Value>,
    pub dtype: String,
    pub shape: Vec<usize>,
}

impl SerializedArray {
    pub fn from_vec(values: Vec<f64>) -> Self {
        let shape = vec![values.len()];
        Self {
            data: values.into_iter().map(Value::from).collect(),
            dtype: "float64".to_string(),
            shape,
        }
    }

    /// Number of scalar leaves in `data`.
    pub fn element_count(&self) -> usize {
        fn count(value: &Value) -> usize {
            match value {
                Value::Array(items) => items.iter().map(count).sum(),
                _ => 1,
            }
        }
        self.data.iter().map(count).sum()
    }
}

/// Column names a [`FittingData`] table was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceColumns {
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub weights: Option<String>,
}

/// Cleaned x/y(/weights) data for a fitting consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingData {
    pub data: SerializedTable,
    /// Set when the data was picked out of a spreadsheet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_columns: Option<SourceColumns>,
    pub original_shape: (usize, usize),
    pub cleaned_shape: (usize, usize),
    /// Producer kind when it is not a spreadsheet (e.g. `montecarlo`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_parameters: Option<Map<String, Value>>,
}

/// Result of a curve fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FittingResults {
    pub model_type: String,
    #[serde(default)]
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub coefficients_uncertainties: Vec<f64>,
    #[serde(default)]
    pub equation: String,
    #[serde(default)]
    pub r_squared: Option<f64>,
    #[serde(default)]
    pub rmse: Option<f64>,
    #[serde(default)]
    pub iterations_used: Option<u32>,
    #[serde(default)]
    pub converged: bool,
}
