//! JSON adapter
//!
//! Accepts an object holding the named number array (`{"rr_intervals": [...]}`)
//! or a bare array. One level of nesting (`[[...]]`, a column vector) is flattened.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use super::IntervalFileAdapter;
use crate::error::ComputeError;

/// `.json` file adapter
pub struct JsonAdapter;

impl IntervalFileAdapter for JsonAdapter {
    fn load(&self, path: &Path, variable: &str) -> Result<Vec<f64>, ComputeError> {
        let file = File::open(path).map_err(|e| ComputeError::io(path, e))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        parse_value(&value, variable).map_err(|reason| match reason {
            ParseFailure::MissingVariable => ComputeError::MissingVariable {
                path: path.to_path_buf(),
                variable: variable.to_string(),
            },
            ParseFailure::NotNumeric(detail) => ComputeError::MalformedInput {
                path: path.to_path_buf(),
                reason: detail,
            },
        })
    }
}

#[derive(Debug, PartialEq)]
enum ParseFailure {
    MissingVariable,
    NotNumeric(String),
}

fn parse_value(value: &Value, variable: &str) -> Result<Vec<f64>, ParseFailure> {
    let array = match value {
        Value::Object(map) => map.get(variable).ok_or(ParseFailure::MissingVariable)?,
        other => other,
    };

    let Value::Array(items) = array else {
        return Err(ParseFailure::NotNumeric(format!(
            "'{variable}' is not an array"
        )));
    };

    let mut intervals = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Number(n) => intervals.push(number(n)?),
            Value::Array(inner) => {
                for v in inner {
                    match v {
                        Value::Number(n) => intervals.push(number(n)?),
                        _ => return Err(ParseFailure::NotNumeric(format!("non-numeric entry {v}"))),
                    }
                }
            }
            _ => return Err(ParseFailure::NotNumeric(format!("non-numeric entry {item}"))),
        }
    }
    Ok(intervals)
}

fn number(n: &serde_json::Number) -> Result<f64, ParseFailure> {
    n.as_f64()
        .ok_or_else(|| ParseFailure::NotNumeric(format!("unrepresentable number {n}")))
}
