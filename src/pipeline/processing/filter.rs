use rayon::prelude::*;
use tracing::debug;

use crate::config::ColumnConfig;
use crate::error::Result;
use crate::pipeline::processing::coerce::{cast_quantity, cast_unit_price};
use crate::pipeline::steps::{collect_outcomes, DropCause, Stage, StageOutput};
use crate::types::{Record, RecordSet, Value};

/// Drops records missing any required field, then casts quantity and unit price
/// to numbers so the domain rules can compare them. A field that will not cast
/// is a completeness failure, not a run failure.
#[derive(Debug, Clone)]
pub struct CompletenessFilter {
    required: Vec<String>,
    quantity: String,
    unit_price: String,
}

impl CompletenessFilter {
    pub fn new(columns: &ColumnConfig) -> Self {
        Self {
            required: columns.required(),
            quantity: columns.quantity.clone(),
            unit_price: columns.unit_price.clone(),
        }
    }
}

impl Stage for CompletenessFilter {
    fn apply(&self, input: RecordSet) -> Result<StageOutput> {
        let RecordSet { schema, records } = input;

        let required: Option<Vec<usize>> = self.required.iter().map(|c| schema.index_of(c)).collect();
        let (Some(required), Some(qty_idx), Some(price_idx)) = (
            required,
            schema.index_of(&self.quantity),
            schema.index_of(&self.unit_price),
        ) else {
            debug!(
                "Required column absent from schema {:?}; every record is incomplete",
                schema.columns()
            );
            let mut out = StageOutput::unchanged(RecordSet::new(schema, Vec::new()));
            if !records.is_empty() {
                out.drops.insert(DropCause::MissingRequired, records.len());
            }
            return Ok(out);
        };

        let outcomes: Vec<std::result::Result<Record, DropCause>> = records
            .into_par_iter()
            .map(|mut record| {
                if required.iter().any(|&idx| record[idx].is_missing()) {
                    return Err(DropCause::MissingRequired);
                }
                let quantity = cast_quantity(&record[qty_idx]).ok_or(DropCause::UnparseableQuantity)?;
                let unit_price = cast_unit_price(&record[price_idx]).ok_or(DropCause::UnparseableUnitPrice)?;
                record[qty_idx] = Value::Int(quantity);
                record[price_idx] = Value::Float(unit_price);
                Ok(record)
            })
            .collect();

        let (kept, drops) = collect_outcomes(outcomes);
        Ok(StageOutput {
            records: RecordSet::new(schema, kept),
            drops,
        })
    }

    fn step_name(&self) -> &'static str {
        "completeness_filter"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["normalize_schema"]
    }
}

/// Drops records whose quantity or unit price is not strictly positive
#[derive(Debug, Clone)]
pub struct DomainFilter {
    quantity: String,
    unit_price: String,
}

impl DomainFilter {
    pub fn new(columns: &ColumnConfig) -> Self {
        Self {
            quantity: columns.quantity.clone(),
            unit_price: columns.unit_price.clone(),
        }
    }
}

// Only already-cast values count; text reaching this stage is a cast defect upstream
fn typed_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Int(i)) => Some(*i as f64),
        Some(Value::Float(f)) if f.is_finite() => Some(*f),
        _ => None,
    }
}

impl Stage for DomainFilter {
    fn apply(&self, input: RecordSet) -> Result<StageOutput> {
        let RecordSet { schema, records } = input;
        let qty_idx = schema.index_of(&self.quantity);
        let price_idx = schema.index_of(&self.unit_price);

        let outcomes: Vec<std::result::Result<Record, DropCause>> = records
            .into_par_iter()
            .map(|record| {
                match typed_number(qty_idx.and_then(|i| record.get(i))) {
                    Some(q) if q > 0.0 => {}
                    _ => return Err(DropCause::NonpositiveQuantity),
                }
                match typed_number(price_idx.and_then(|i| record.get(i))) {
                    Some(p) if p > 0.0 => {}
                    _ => return Err(DropCause::NonpositiveUnitPrice),
                }
                Ok(record)
            })
            .collect();

        let (kept, drops) = collect_outcomes(outcomes);
        Ok(StageOutput {
            records: RecordSet::new(schema, kept),
            drops,
        })
    }

    fn step_name(&self) -> &'static str {
        "domain_filter"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["completeness_filter"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 5] = ["invoiceno", "stockcode", "quantity", "unitprice", "customerid"];

    fn columns() -> ColumnConfig {
        ColumnConfig::default()
    }

    #[test]
    fn test_completeness_drops_missing_required() {
        let set = RecordSet::from_text_rows(
            &HEADER,
            &[
                vec!["536365", "71053", "6", "3.39", ""],
                vec!["", "71053", "6", "3.39", "17850"],
                vec!["536365", "71053", "  ", "3.39", "17850"],
            ],
        );
        let out = CompletenessFilter::new(&columns()).apply(set).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.drops[&DropCause::MissingRequired], 2);
        // customer id is not required
        assert_eq!(out.records.records[0][4], Value::Null);
    }

    #[test]
    fn test_completeness_casts_numbers() {
        let set = RecordSet::from_text_rows(&HEADER, &[vec!["1", "A", "6", "3.39", "x"]]);
        let out = CompletenessFilter::new(&columns()).apply(set).unwrap();
        let record = &out.records.records[0];
        assert_eq!(record[2], Value::Int(6));
        assert_eq!(record[3], Value::Float(3.39));
    }

    #[test]
    fn test_completeness_drops_unparseable_numbers() {
        let set = RecordSet::from_text_rows(
            &HEADER,
            &[vec!["1", "A", "six", "3.39", ""], vec!["1", "A", "6", "cheap", ""]],
        );
        let out = CompletenessFilter::new(&columns()).apply(set).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.drops[&DropCause::UnparseableQuantity], 1);
        assert_eq!(out.drops[&DropCause::UnparseableUnitPrice], 1);
    }

    #[test]
    fn test_completeness_drops_everything_when_column_absent() {
        let set = RecordSet::from_text_rows(&["invoiceno", "quantity"], &[vec!["1", "2"]]);
        let out = CompletenessFilter::new(&columns()).apply(set).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.drops[&DropCause::MissingRequired], 1);
    }

    #[test]
    fn test_domain_filter_drops_nonpositive() {
        let set = RecordSet::from_text_rows(
            &HEADER,
            &[
                vec!["1", "A", "6", "3.39", ""],
                vec!["2", "A", "-3", "3.39", ""],
                vec!["3", "A", "2", "0", ""],
                vec!["4", "A", "0", "1.0", ""],
            ],
        );
        let cast = CompletenessFilter::new(&columns()).apply(set).unwrap().records;
        let out = DomainFilter::new(&columns()).apply(cast).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.drops[&DropCause::NonpositiveQuantity], 2);
        assert_eq!(out.drops[&DropCause::NonpositiveUnitPrice], 1);
    }

    #[test]
    fn test_domain_filter_drops_uncast_text_instead_of_panicking() {
        let set = RecordSet::from_text_rows(&HEADER, &[vec!["1", "A", "6", "3.39", ""]]);
        let out = DomainFilter::new(&columns()).apply(set).unwrap();
        assert!(out.records.is_empty());
        assert_eq!(out.dropped_total(), 1);
    }
}
