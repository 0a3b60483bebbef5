use rayon::prelude::*;

use crate::config::{ColumnConfig, TransformConfig};
use crate::error::Result;
use crate::pipeline::steps::{Stage, StageOutput};
use crate::types::{RecordSet, Value};

/// Remove characters that could break the tab-delimited output: quotes are dropped,
/// commas, tabs and line breaks become a single space each.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '"')
        .map(|c| match c {
            ',' | '\t' | '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}

/// Sanitizes free-text columns. With no configured columns, every text value is cleaned.
///
/// A customer id left blank by sanitizing gets the unknown-customer sentinel back.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    columns: Vec<String>,
    customer_id: String,
    unknown_customer: String,
}

impl Sanitizer {
    pub fn new(columns: &ColumnConfig, transform: &TransformConfig) -> Self {
        Self {
            columns: transform.free_text_columns.clone(),
            customer_id: columns.customer_id.clone(),
            unknown_customer: transform.unknown_customer.clone(),
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(&ColumnConfig::default(), &TransformConfig::default())
    }
}

impl Stage for Sanitizer {
    fn apply(&self, input: RecordSet) -> Result<StageOutput> {
        let RecordSet { schema, records } = input;

        let targets: Vec<usize> = if self.columns.is_empty() {
            (0..schema.len()).collect()
        } else {
            self.columns.iter().filter_map(|c| schema.index_of(c)).collect()
        };

        let customer_idx = schema.index_of(&self.customer_id);

        let records = records
            .into_par_iter()
            .map(|mut record| {
                for &idx in &targets {
                    if let Value::Str(text) = &mut record[idx] {
                        *text = sanitize_text(text);
                        if Some(idx) == customer_idx && text.trim().is_empty() {
                            *text = self.unknown_customer.clone();
                        }
                    }
                }
                record
            })
            .collect();

        Ok(StageOutput::unchanged(RecordSet::new(schema, records)))
    }

    fn step_name(&self) -> &'static str {
        "sanitize"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["derive_columns"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("WHITE, METAL LANTERN"), "WHITE  METAL LANTERN");
        assert_eq!(sanitize_text("12\" RULER\tBOX"), "12 RULER BOX");
        assert_eq!(sanitize_text("line\r\nbreak"), "line  break");
        assert_eq!(sanitize_text("United Kingdom"), "United Kingdom");
    }

    #[test]
    fn test_only_configured_columns_are_cleaned() {
        let set = RecordSet::from_text_rows(
            &["description", "stockcode"],
            &[vec!["A, \"B\"", "X,Y"]],
        );
        let transform = TransformConfig {
            free_text_columns: vec!["description".into(), "country".into()],
            ..TransformConfig::default()
        };
        let out = Sanitizer::new(&ColumnConfig::default(), &transform).apply(set).unwrap().records;
        assert_eq!(out.records[0][0], Value::Str("A  B".into()));
        assert_eq!(out.records[0][1], Value::Str("X,Y".into()));
    }

    #[test]
    fn test_default_cleans_description_and_country_only() {
        let set = RecordSet::from_text_rows(
            &["description", "country", "stockcode"],
            &[vec!["a\tb", "\"EIRE\"", "X,Y"]],
        );
        let out = Sanitizer::default().apply(set).unwrap().records;
        assert_eq!(
            out.records[0],
            vec![Value::Str("a b".into()), Value::Str("EIRE".into()), Value::Str("X,Y".into())]
        );
    }

    #[test]
    fn test_blanked_customer_id_gets_sentinel() {
        let set = RecordSet::from_text_rows(
            &["description", "customerid"],
            &[vec!["a,b", "\""], vec!["c", "17850"]],
        );
        let transform = TransformConfig {
            free_text_columns: Vec::new(),
            ..TransformConfig::default()
        };
        let out = Sanitizer::new(&ColumnConfig::default(), &transform).apply(set).unwrap().records;
        assert_eq!(out.records[0], vec![Value::Str("a b".into()), Value::Str("UNKNOWN".into())]);
        assert_eq!(out.records[1][1], Value::Str("17850".into()));
    }
}
