//! Pure payload transformations shared by tabs that exchange tables.

use super::payload::{FittingData, Payload, SerializedTable, SourceColumns};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{role} column '{column}' not found in data")]
    MissingColumn { role: &'static str, column: String },

    #[error("Monte Carlo results missing simulation_data")]
    MissingSimulationData,

    #[error("Invalid Monte Carlo data format: {0}")]
    InvalidSimulationData(String),
}

/// Extract x/y (and optional weights) columns from a spreadsheet table into
/// a fitting-ready table.
///
/// Cells are coerced to numbers (numeric strings are parsed); rows with any
/// missing or non-numeric cell are dropped. The original row labels are kept.
/// A `weights` column name that is not present is recorded in
/// `source_columns` but produces no weights column.
pub fn spreadsheet_to_fitting(
    table: &SerializedTable,
    x_column: &str,
    y_column: &str,
    weights_column: Option<&str>,
) -> Result<FittingData, TransformError> {
    let x = table.column(x_column).ok_or(TransformError::MissingColumn {
        role: "X",
        column: x_column.to_string(),
    })?;
    let y = table.column(y_column).ok_or(TransformError::MissingColumn {
        role: "Y",
        column: y_column.to_string(),
    })?;
    let weights = weights_column.and_then(|w| table.column(w));

    let mut columns = vec!["x".to_string(), "y".to_string()];
    if weights.is_some() {
        columns.push("weights".to_string());
    }

    let mut records = Vec::new();
    let mut index = Vec::new();
    for row in 0..table.row_count() {
        let w = weights.as_ref().map(|w| as_number(w[row]));
        let (Some(xv), Some(yv)) = (as_number(x[row]), as_number(y[row])) else {
            continue;
        };
        if matches!(w, Some(None)) {
            continue;
        }

        let mut record = Map::new();
        record.insert("x".to_string(), Value::from(xv));
        record.insert("y".to_string(), Value::from(yv));
        if let Some(Some(wv)) = w {
            record.insert("weights".to_string(), Value::from(wv));
        }
        records.push(record);
        index.push(table.index.get(row).cloned().unwrap_or_else(|| Value::from(row)));
    }

    let data = SerializedTable::with_index(columns, records, index);
    let cleaned_shape = data.shape;
    Ok(FittingData {
        data,
        source_columns: Some(SourceColumns {
            x: x_column.to_string(),
            y: y_column.to_string(),
            weights: weights_column.map(str::to_string),
        }),
        original_shape: table.shape,
        cleaned_shape,
        source_type: None,
        simulation_parameters: None,
    })
}

/// Wrap Monte Carlo simulation output as fitting data.
///
/// `results.simulation_data` must be a serialized table; `results.parameters`
/// (an object, when present) travels along as `simulation_parameters`.
pub fn montecarlo_to_fitting(results: &Map<String, Value>) -> Result<FittingData, TransformError> {
    let sim = results
        .get("simulation_data")
        .ok_or(TransformError::MissingSimulationData)?;
    if !sim.as_object().is_some_and(|obj| obj.contains_key("data")) {
        return Err(TransformError::InvalidSimulationData(
            "simulation_data is not a table".to_string(),
        ));
    }
    let data: SerializedTable = serde_json::from_value(sim.clone())
        .map_err(|e| TransformError::InvalidSimulationData(e.to_string()))?;

    let parameters = match results.get("parameters") {
        Some(Value::Object(params)) => params.clone(),
        _ => Map::new(),
    };
    let shape = data.shape;
    Ok(FittingData {
        data,
        source_columns: None,
        original_shape: shape,
        cleaned_shape: shape,
        source_type: Some("montecarlo".to_string()),
        simulation_parameters: Some(parameters),
    })
}

/// Names of columns whose every non-null cell is (or parses as) a number.
pub fn numerical_columns(table: &SerializedTable) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|col| {
            table.column(col).is_some_and(|cells| {
                cells
                    .iter()
                    .all(|cell| cell.is_null() || as_number(cell).is_some())
            })
        })
        .cloned()
        .collect()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Display-oriented summary of a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

impl fmt::Display for DataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(shape) = &self.shape {
            write!(f, " {shape:?}")?;
        }
        if let Some(len) = self.length {
            write!(f, " len={len}")?;
        }
        Ok(())
    }
}

pub fn data_summary(payload: &Payload) -> DataSummary {
    let mut summary = DataSummary {
        kind: payload.kind_name(),
        shape: None,
        columns: None,
        keys: None,
        length: None,
    };
    match payload {
        Payload::Table(table) | Payload::FittingData(FittingData { data: table, .. }) => {
            summary.shape = Some(vec![table.shape.0, table.shape.1]);
            summary.columns = Some(table.columns.clone());
        }
        Payload::Array(array) => {
            summary.shape = Some(array.shape.clone());
            summary.length = Some(array.element_count());
        }
        Payload::Parameters(map) => {
            summary.keys = Some(map.keys().cloned().collect());
            summary.length = Some(map.len());
        }
        Payload::Json(Value::Object(map)) => {
            summary.keys = Some(map.keys().cloned().collect());
            summary.length = Some(map.len());
        }
        Payload::List(items) => summary.length = Some(items.len()),
        Payload::Text(text) => summary.length = Some(text.chars().count()),
        Payload::Results(results) => summary.length = Some(results.coefficients.len()),
        Payload::Number(_) | Payload::Integer(_) | Payload::Json(_) => {}
    }
    summary
}
