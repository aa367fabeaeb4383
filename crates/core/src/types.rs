//! Domain types for template population data and results.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

/// Suffix of the companion key that keeps a table's template header row.
pub const SKIP_HEADER_SUFFIX: &str = "_skip_header";

/// A field value: plain text for text shapes, a cell matrix for tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text for a text shape, possibly containing inline markdown.
    Text(String),
    /// Rows of cell text for a table shape.
    Table(TableMatrix),
}

impl Value {
    /// Short name of the value kind, for log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Table(_) => "table",
        }
    }

    /// Borrow the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Table(_) => None,
        }
    }

    /// Borrow the matrix, if this is a table value.
    pub fn as_table(&self) -> Option<&TableMatrix> {
        match self {
            Value::Table(table) => Some(table),
            Value::Text(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<TableMatrix> for Value {
    fn from(table: TableMatrix) -> Self {
        Value::Table(table)
    }
}

/// Ordered rows of ordered cell text. Row 0 is the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TableMatrix {
    rows: Vec<Vec<String>>,
}

impl TableMatrix {
    /// Create a matrix from owned rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a matrix from anything iterable as rows of string-like cells.
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// All rows, header first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// A single row by index.
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A mapping from field (shape) name to value, in insertion order.
///
/// Tables listed through [`DataRecord::set_skip_header`] keep the
/// template's header row and receive matrix row 0 on template row 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRecord {
    fields: Vec<(String, Value)>,
    header_kept: BTreeSet<String>,
}

impl DataRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any earlier value with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style [`DataRecord::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a field by exact name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Mark whether a table field keeps the template's header row.
    pub fn set_skip_header(&mut self, table: impl Into<String>, skip: bool) {
        let table = table.into();
        if skip {
            self.header_kept.insert(table);
        } else {
            self.header_kept.remove(&table);
        }
    }

    /// Whether a table field keeps the template's header row.
    pub fn skips_header(&self, table: &str) -> bool {
        self.header_kept.contains(table)
    }
}

impl Serialize for DataRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.header_kept.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        for table in &self.header_kept {
            map.serialize_entry(&format!("{}{}", table, SKIP_HEADER_SUFFIX), &true)?;
        }
        map.end()
    }
}

/// Data for one slide of a multi-slide request, or one extracted slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideData {
    /// 0-based index of the template slide.
    pub slide_index: usize,

    /// Field values for that slide.
    pub data: DataRecord,
}

impl SlideData {
    /// Create slide data for the given template slide.
    pub fn new(slide_index: usize, data: DataRecord) -> Self {
        Self { slide_index, data }
    }
}

/// A population request body, in either of its two accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// `{"slides": [{"slide_index": 0, "data": {...}}, ...]}`
    Multi { slides: Vec<SlideData> },
    /// A flat field map for one slide.
    Single(DataRecord),
}

impl Payload {
    /// Whether this is the multi-slide form.
    pub fn is_multi_slide(&self) -> bool {
        matches!(self, Payload::Multi { .. })
    }

    /// Flatten into `(slide_index, record)` pairs. The single-slide form
    /// targets `default_index`.
    pub fn into_slides(self, default_index: usize) -> Vec<SlideData> {
        match self {
            Payload::Multi { slides } => slides,
            Payload::Single(data) => vec![SlideData::new(default_index, data)],
        }
    }
}

/// Outcome of populating one record: which fields found a shape and which did not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationResult {
    /// Field names written into a shape, in record order.
    pub matched: Vec<String>,

    /// Field names with no matching shape, in record order.
    pub unmatched: Vec<String>,
}

impl PopulationResult {
    pub fn record_match(&mut self, name: impl Into<String>) {
        self.matched.push(name.into());
    }

    pub fn record_miss(&mut self, name: impl Into<String>) {
        self.unmatched.push(name.into());
    }

    /// True when every field found its shape.
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Population outcome for one output slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideReport {
    /// Template slide the data was written from.
    pub slide_index: usize,

    /// 0-based position of the populated slide in the output deck.
    pub position: usize,

    /// Whether the slide is a duplicate of the template slide.
    pub cloned: bool,

    /// Matched and unmatched fields.
    pub result: PopulationResult,
}

/// Caller-visible summary of a whole population request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationReport {
    /// Whether the request used the multi-slide payload form.
    pub multi_slide: bool,

    /// One entry per populated slide, in payload order.
    pub slides: Vec<SlideReport>,
}

impl PopulationReport {
    /// Total number of fields written.
    pub fn matched_count(&self) -> usize {
        self.slides.iter().map(|s| s.result.matched.len()).sum()
    }

    /// All matched field names, in payload order.
    pub fn matched_fields(&self) -> Vec<&str> {
        self.slides
            .iter()
            .flat_map(|s| s.result.matched.iter().map(String::as_str))
            .collect()
    }

    /// All unmatched field names, in payload order.
    pub fn unmatched_fields(&self) -> Vec<&str> {
        self.slides
            .iter()
            .flat_map(|s| s.result.unmatched.iter().map(String::as_str))
            .collect()
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        if self.multi_slide {
            format!(
                "Populated {} slide(s), {} field(s) in total",
                self.slides.len(),
                self.matched_count()
            )
        } else {
            format!(
                "Populated {} field(s): {}",
                self.matched_count(),
                self.matched_fields().join(", ")
            )
        }
    }
}
