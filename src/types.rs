use crate::constants::CANONICAL_TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single cell of the extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Build a value from raw text; empty fields are null, as the source extract encodes them
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            Value::Null
        } else {
            Value::Str(text.to_string())
        }
    }

    /// Null, or text that is empty after trimming
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the value; numeric-looking text is parsed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text form used by the output writer
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => render_float(*f),
            Value::Timestamp(ts) => ts.format(CANONICAL_TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub(crate) fn key(&self) -> ValueKey<'_> {
        match self {
            Value::Null => ValueKey::Null,
            Value::Str(s) => ValueKey::Str(s.as_str()),
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::Timestamp(ts) => ValueKey::Timestamp(*ts),
        }
    }
}

/// Hashable identity of a value; floats compare by bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey<'a> {
    Null,
    Str(&'a str),
    Int(i64),
    Float(u64),
    Timestamp(NaiveDateTime),
}

/// Relative error tolerated when trimming binary noise from a float
const RENDER_TOLERANCE: f64 = 1e-9;

/// Shortest decimal form without binary noise: 6 * 3.39 renders as 20.34.
/// Values too small for ten decimals fall back to the exact round-trip form.
fn render_float(f: f64) -> String {
    if !f.is_finite() {
        return f.to_string();
    }
    let fixed = format!("{:.10}", f);
    let trimmed = fixed.trim_end_matches('0');
    let rendered = if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    };
    match rendered.parse::<f64>() {
        Ok(back) if (back - f).abs() <= f.abs() * RENDER_TOLERANCE => rendered,
        _ => f.to_string(),
    }
}

/// One row, positionally aligned with its RecordSet's schema
pub type Record = Vec<Value>;

/// Ordered column names a RecordSet conforms to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index_of(column).is_some()
    }

    /// Append a column at the end and return its position
    pub fn append(mut self, column: &str) -> (Self, usize) {
        self.columns.push(column.to_string());
        let idx = self.columns.len() - 1;
        (self, idx)
    }
}

/// The full collection of records flowing between stages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        debug_assert!(records.iter().all(|r| r.len() == schema.len()));
        Self { schema, records }
    }

    /// Convenience constructor from a header and rows of raw text
    pub fn from_text_rows(header: &[&str], rows: &[Vec<&str>]) -> Self {
        let schema = Schema::new(header.iter().map(|h| h.to_string()).collect());
        let records = rows
            .iter()
            .map(|row| row.iter().map(|cell| Value::from_text(cell)).collect())
            .collect();
        Self::new(schema, records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of `column` in `record`, if the column exists
    pub fn value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a Value> {
        self.schema.index_of(column).and_then(|idx| record.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_float_strips_binary_noise() {
        assert_eq!(Value::Float(6.0 * 3.39).render(), "20.34");
        assert_eq!(Value::Float(3.0).render(), "3.0");
        assert_eq!(Value::Float(0.085).render(), "0.085");
        assert_eq!(Value::Float(0.0).render(), "0.0");
    }

    #[test]
    fn test_render_float_keeps_tiny_values() {
        assert_eq!(Value::Float(4e-11).render(), "0.00000000004");
        assert_eq!(Value::Float(1.5e-12).render(), "0.0000000000015");
        assert_eq!(Value::Float(-4e-11).render(), "-0.00000000004");
    }

    #[test]
    fn test_missing_covers_blank_text() {
        assert!(Value::Null.is_missing());
        assert!(Value::Str("  ".to_string()).is_missing());
        assert!(!Value::Int(0).is_missing());
    }

    #[test]
    fn test_from_text_rows_maps_empty_to_null() {
        let set = RecordSet::from_text_rows(&["a", "b"], &[vec!["x", ""]]);
        assert_eq!(set.records[0][1], Value::Null);
        assert_eq!(set.value(&set.records[0], "a"), Some(&Value::Str("x".to_string())));
        assert_eq!(set.value(&set.records[0], "zzz"), None);
    }
}
