use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Name of the record relayed when none is configured
pub const DEFAULT_MEASUREMENT: &str = "temperature";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("body is not a SenML record list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("SenML entry {0} is not a record")]
    NotARecord(usize),

    #[error("{0} reading not found in SenML payload")]
    NotFound(String),

    #[error("{0} record carries no value")]
    MissingValue(String),
}

/// One entry of a SenML pack (RFC 8428).
///
/// Only the fields the relay looks at are kept, anything else the carrier
/// sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Record {
    pub n: Option<String>,
    pub v: Option<Value>,
    pub vs: Option<String>,
    pub vb: Option<bool>,
}

impl Record {
    /// The record value, whichever of `v`, `vs` or `vb` carries it.
    pub fn value(&self) -> Option<Value> {
        self.v
            .clone()
            .or_else(|| self.vs.clone().map(Value::String))
            .or_else(|| self.vb.map(Value::Bool))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub value: Value,
}

/// Find the first record named `name` in a SenML body and return its value
/// untouched.
///
/// Entries are looked at in order and the search stops at the first match,
/// so whatever follows it is never inspected.
pub fn extract(body: &str, name: &str) -> Result<Measurement, ExtractionError> {
    let entries: Vec<Value> = serde_json::from_str(body)?;
    debug!(records = entries.len(), "parsed SenML payload");

    let mut found = None;
    for (index, entry) in entries.into_iter().enumerate() {
        let Value::Object(fields) = entry else {
            return Err(ExtractionError::NotARecord(index));
        };
        if fields.get("n").and_then(Value::as_str) == Some(name) {
            found = Some(fields);
            break;
        }
    }

    let fields = found.ok_or_else(|| ExtractionError::NotFound(name.to_owned()))?;
    let record: Record = serde_json::from_value(Value::Object(fields))?;

    let value = record
        .value()
        .ok_or_else(|| ExtractionError::MissingValue(name.to_owned()))?;

    Ok(Measurement {
        name: name.to_owned(),
        value,
    })
}
