use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use crate::error::Result;
use crate::pipeline::steps::{Stage, StageOutput};
use crate::types::{RecordSet, Schema};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Canonical form of a single column name: trimmed, lower-case, whitespace runs as `_`
pub fn normalize_column_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    WHITESPACE_RUN.replace_all(&lowered, "_").into_owned()
}

/// Canonicalizes column names. Names that collide after normalization get a
/// numeric suffix so lookups by name stay unambiguous.
#[derive(Debug, Default)]
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize_schema(&self, schema: &Schema) -> Schema {
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(schema.len());

        for original in schema.columns() {
            let base = normalize_column_name(original);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            if candidate != *original {
                debug!("Renamed column '{}' -> '{}'", original, candidate);
            }
            columns.push(candidate);
        }

        Schema::new(columns)
    }
}

impl Stage for SchemaNormalizer {
    fn apply(&self, input: RecordSet) -> Result<StageOutput> {
        let schema = self.normalize_schema(&input.schema);
        Ok(StageOutput::unchanged(RecordSet::new(schema, input.records)))
    }

    fn step_name(&self) -> &'static str {
        "normalize_schema"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("InvoiceNo"), "invoiceno");
        assert_eq!(normalize_column_name("  Unit Price "), "unit_price");
        assert_eq!(normalize_column_name("Customer \t  ID"), "customer_id");
    }

    #[test]
    fn test_normalizer_is_idempotent() {
        let set = RecordSet::from_text_rows(&[" Invoice No", "StockCode", "Country "], &[]);
        let once = SchemaNormalizer::new().apply(set).unwrap().records;
        let twice = SchemaNormalizer::new().apply(once.clone()).unwrap().records;
        assert_eq!(once.schema, twice.schema);
        assert_eq!(once.schema.columns(), &["invoice_no", "stockcode", "country"]);
    }

    #[test]
    fn test_colliding_names_get_suffix() {
        let set = RecordSet::from_text_rows(&["Country", "country", "COUNTRY"], &[vec!["a", "b", "c"]]);
        let out = SchemaNormalizer::new().apply(set).unwrap().records;
        assert_eq!(out.schema.columns(), &["country", "country_2", "country_3"]);
        assert_eq!(out.records.len(), 1);
    }
}
