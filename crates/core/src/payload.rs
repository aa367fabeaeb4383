//! Validation of JSON request bodies into [`Payload`] and [`DataRecord`].
//!
//! All shape checks happen here, before any document is touched, so a
//! malformed body never produces a partially populated deck.

use crate::error::{Error, Result};
use crate::types::{DataRecord, Payload, SlideData, TableMatrix, Value, SKIP_HEADER_SUFFIX};
use serde_json::{Map, Value as Json};

impl Payload {
    /// Parse a payload from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: Json = serde_json::from_str(text)
            .map_err(|e| Error::InvalidPayload(format!("Invalid JSON data: {}", e)))?;
        Self::from_json(&json)
    }

    /// Interpret an already parsed JSON document.
    ///
    /// An object with a `slides` key is the multi-slide form; any other
    /// object is a single-slide field map.
    pub fn from_json(json: &Json) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::InvalidPayload("payload must be a JSON object".to_string()))?;

        match object.get("slides") {
            Some(slides) => {
                let entries = slides.as_array().ok_or_else(|| {
                    Error::InvalidPayload("'slides' must be an array".to_string())
                })?;
                let slides = entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| parse_slide_entry(i, entry))
                    .collect::<Result<Vec<_>>>()?;
                log::debug!("Parsed multi-slide payload with {} entries", slides.len());
                Ok(Payload::Multi { slides })
            }
            None => {
                let record = DataRecord::from_json_object(object)?;
                log::debug!("Parsed single-slide payload with {} fields", record.len());
                Ok(Payload::Single(record))
            }
        }
    }
}

impl DataRecord {
    /// Build a record from a JSON field map.
    ///
    /// Strings and numbers become text values, arrays of arrays become
    /// tables. A boolean under `<table>_skip_header` is a table option,
    /// not a field.
    pub fn from_json_object(object: &Map<String, Json>) -> Result<Self> {
        let mut record = DataRecord::new();

        for (name, value) in object {
            match value {
                Json::Array(rows) => {
                    record.insert(name.as_str(), Value::Table(parse_matrix(name, rows)?));
                }
                Json::Bool(flag) => match name.strip_suffix(SKIP_HEADER_SUFFIX) {
                    Some(table) if !table.is_empty() => record.set_skip_header(table, *flag),
                    _ => {
                        return Err(Error::InvalidPayload(format!(
                            "field '{}': expected a string or a table, found a boolean",
                            name
                        )))
                    }
                },
                other => {
                    let text = scalar_text(other).ok_or_else(|| {
                        Error::InvalidPayload(format!(
                            "field '{}': expected a string or a table, found {}",
                            name,
                            json_kind(other)
                        ))
                    })?;
                    record.insert(name.as_str(), Value::Text(text));
                }
            }
        }

        Ok(record)
    }
}

fn parse_slide_entry(position: usize, entry: &Json) -> Result<SlideData> {
    let object = entry.as_object().ok_or_else(|| {
        Error::InvalidPayload(format!("slides[{}] must be an object", position))
    })?;

    let slide_index = object
        .get("slide_index")
        .ok_or_else(|| {
            Error::InvalidPayload(format!("slides[{}] is missing 'slide_index'", position))
        })?
        .as_u64()
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| {
            Error::InvalidPayload(format!(
                "slides[{}].slide_index must be a non-negative integer in range",
                position
            ))
        })?;

    let data = match object.get("data") {
        None => DataRecord::new(),
        Some(Json::Object(fields)) => DataRecord::from_json_object(fields)?,
        Some(other) => {
            return Err(Error::InvalidPayload(format!(
                "slides[{}].data must be an object, found {}",
                position,
                json_kind(other)
            )))
        }
    };

    Ok(SlideData::new(slide_index, data))
}

fn parse_matrix(name: &str, rows: &[Json]) -> Result<TableMatrix> {
    let mut matrix = Vec::with_capacity(rows.len());

    for (r, row) in rows.iter().enumerate() {
        let cells = row.as_array().ok_or_else(|| {
            Error::InvalidPayload(format!(
                "field '{}': row {} must be an array of cells",
                name, r
            ))
        })?;
        let cells = cells
            .iter()
            .enumerate()
            .map(|(c, cell)| {
                scalar_text(cell).ok_or_else(|| {
                    Error::InvalidPayload(format!(
                        "field '{}': cell [{}][{}] must be a string, found {}",
                        name,
                        r,
                        c,
                        json_kind(cell)
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        matrix.push(cells);
    }

    Ok(TableMatrix::new(matrix))
}

/// Text for a string or number; `None` for every other JSON kind.
fn scalar_text(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
