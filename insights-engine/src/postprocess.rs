//! Turns the service's row/field wire shape into [`Record`]s.
//!
//! Every stage is a lazy iterator adapter; [`post_process`] composes them and
//! materialises the result so callers always hold a stable snapshot.

use insights_protocol::results::{ResultField, ResultRow};
use serde_json::Value;

use crate::error::InsightsError;
use crate::record::Record;

/// Maps each raw row to a record. A repeated field name keeps the later value.
pub fn rows_to_records<I>(rows: I) -> impl Iterator<Item = Record>
where
    I: IntoIterator<Item = ResultRow>,
{
    rows.into_iter().map(|row| {
        row.into_iter()
            .map(|ResultField { field, value }| (field, Value::String(value)))
            .collect()
    })
}

/// Replaces string values that start with `{` by their parsed JSON.
///
/// Values that fail to parse stay untouched; this never errors.
pub fn infer_structured_values<I>(records: I) -> impl Iterator<Item = Record>
where
    I: IntoIterator<Item = Record>,
{
    records.into_iter().map(|mut record| {
        for value in record.values_mut() {
            let parsed = match value {
                Value::String(raw) if raw.starts_with('{') => {
                    serde_json::from_str::<Value>(raw).ok()
                }
                _ => None,
            };
            if let Some(parsed) = parsed {
                *value = parsed;
            }
        }
        record
    })
}

/// Strictly decodes the named fields as JSON.
///
/// Missing fields and values that are already structured are skipped; a
/// string that is not valid JSON fails the whole batch.
pub fn parse_named_fields(
    mut records: Vec<Record>,
    fields: &[String],
) -> Result<Vec<Record>, InsightsError> {
    if fields.is_empty() {
        return Ok(records);
    }

    for record in records.iter_mut() {
        for field in fields {
            if let Some(value) = record.get_mut(field) {
                if let Value::String(raw) = value {
                    let parsed = serde_json::from_str::<Value>(raw).map_err(|source| {
                        InsightsError::FieldDecode {
                            field: field.clone(),
                            source,
                        }
                    })?;
                    *value = parsed;
                }
            }
        }
    }

    Ok(records)
}

/// Runs the full pipeline over one snapshot's rows.
pub fn post_process(rows: Vec<ResultRow>, infer_structure: bool) -> Vec<Record> {
    let records = rows_to_records(rows);
    if infer_structure {
        infer_structured_values(records).collect()
    } else {
        records.collect()
    }
}
