use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

use crate::config::{ColumnConfig, TransformConfig};
use crate::error::Result;
use crate::pipeline::steps::{collect_outcomes, DropCause, Stage, StageOutput};
use crate::types::{Record, RecordSet, Value};

static FLOAT_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.0$").expect("valid regex"));

/// Integer quantity; decimal text truncates toward zero
pub fn cast_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => truncate(*f),
        Value::Str(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

fn truncate(f: f64) -> Option<i64> {
    (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
}

pub fn cast_unit_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f64,
        Value::Str(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}

/// Parse an invoice date with the first matching pattern
pub fn parse_invoice_date(text: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let text = text.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Customer ids that went through a float come back as `17850.0`; strip that and
/// substitute the sentinel when nothing is left.
pub fn normalize_customer_id(value: &Value, unknown: &str) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::Str(s) => s.trim().to_string(),
        other => other.render(),
    };
    let stripped = FLOAT_ARTIFACT.replace(&text, "");
    if stripped.is_empty() {
        unknown.to_string()
    } else {
        stripped.into_owned()
    }
}

/// Casts fields to their target types: quantity and unit price (re-asserted),
/// invoice date to a timestamp, customer id to a cleaned identifier.
#[derive(Debug, Clone)]
pub struct TypeCoercion {
    columns: ColumnConfig,
    date_formats: Vec<String>,
    unknown_customer: String,
}

impl TypeCoercion {
    pub fn new(columns: &ColumnConfig, transform: &TransformConfig) -> Self {
        Self {
            columns: columns.clone(),
            date_formats: transform.date_formats.clone(),
            unknown_customer: transform.unknown_customer.clone(),
        }
    }

    fn coerce_record(
        &self,
        mut record: Record,
        idx: &ColumnIndices,
    ) -> std::result::Result<Record, DropCause> {
        if let Some(i) = idx.quantity {
            let q = cast_quantity(&record[i]).ok_or(DropCause::UnparseableQuantity)?;
            record[i] = Value::Int(q);
        }
        if let Some(i) = idx.unit_price {
            let p = cast_unit_price(&record[i]).ok_or(DropCause::UnparseableUnitPrice)?;
            record[i] = Value::Float(p);
        }
        if let Some(i) = idx.invoice_date {
            if let Value::Str(text) = &record[i] {
                let ts = parse_invoice_date(text, &self.date_formats)
                    .ok_or(DropCause::UnparseableInvoiceDate)?;
                record[i] = Value::Timestamp(ts);
            }
        }
        if let Some(i) = idx.customer_id {
            record[i] = Value::Str(normalize_customer_id(&record[i], &self.unknown_customer));
        }
        Ok(record)
    }
}

struct ColumnIndices {
    quantity: Option<usize>,
    unit_price: Option<usize>,
    invoice_date: Option<usize>,
    customer_id: Option<usize>,
}

impl Stage for TypeCoercion {
    fn apply(&self, input: RecordSet) -> Result<StageOutput> {
        let RecordSet { schema, records } = input;
        let idx = ColumnIndices {
            quantity: schema.index_of(&self.columns.quantity),
            unit_price: schema.index_of(&self.columns.unit_price),
            invoice_date: schema.index_of(&self.columns.invoice_date),
            customer_id: schema.index_of(&self.columns.customer_id),
        };

        let outcomes: Vec<_> = records
            .into_par_iter()
            .map(|record| self.coerce_record(record, &idx))
            .collect();

        let (kept, drops) = collect_outcomes(outcomes);
        Ok(StageOutput {
            records: RecordSet::new(schema, kept),
            drops,
        })
    }

    fn step_name(&self) -> &'static str {
        "type_coercion"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["domain_filter"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn coercion() -> TypeCoercion {
        TypeCoercion::new(&ColumnConfig::default(), &TransformConfig::default())
    }

    #[test]
    fn test_cast_quantity() {
        assert_eq!(cast_quantity(&Value::Str("6".into())), Some(6));
        assert_eq!(cast_quantity(&Value::Str(" 6.9 ".into())), Some(6));
        assert_eq!(cast_quantity(&Value::Str("-3".into())), Some(-3));
        assert_eq!(cast_quantity(&Value::Str("NaN".into())), None);
        assert_eq!(cast_quantity(&Value::Null), None);
    }

    #[test]
    fn test_cast_unit_price() {
        assert_eq!(cast_unit_price(&Value::Str("3.39".into())), Some(3.39));
        assert_eq!(cast_unit_price(&Value::Int(2)), Some(2.0));
        assert_eq!(cast_unit_price(&Value::Str("inf".into())), None);
    }

    #[test]
    fn test_parse_invoice_date_without_leading_zeros() {
        let formats = TransformConfig::default().date_formats;
        let expected = NaiveDate::from_ymd_opt(2010, 12, 1)
            .unwrap()
            .and_hms_opt(8, 26, 0)
            .unwrap();
        assert_eq!(parse_invoice_date("12/1/2010 8:26", &formats), Some(expected));
        assert_eq!(parse_invoice_date("2010-12-01 08:26:00", &formats), Some(expected));
        assert_eq!(parse_invoice_date("first of december", &formats), None);
    }

    #[test]
    fn test_normalize_customer_id() {
        assert_eq!(normalize_customer_id(&Value::Str("17850.0".into()), "UNKNOWN"), "17850");
        assert_eq!(normalize_customer_id(&Value::Str("17850.05".into()), "UNKNOWN"), "17850.05");
        assert_eq!(normalize_customer_id(&Value::Float(12583.0), "UNKNOWN"), "12583");
        assert_eq!(normalize_customer_id(&Value::Null, "UNKNOWN"), "UNKNOWN");
        assert_eq!(normalize_customer_id(&Value::Str("  ".into()), "UNKNOWN"), "UNKNOWN");
    }

    #[test]
    fn test_coercion_formats_date_and_drops_bad_dates() {
        let set = RecordSet::from_text_rows(
            &["quantity", "unitprice", "invoicedate", "customerid"],
            &[
                vec!["6", "3.39", "12/1/2010 8:26", "17850.0"],
                vec!["6", "3.39", "yesterday", "17850.0"],
                vec!["6", "3.39", "", ""],
            ],
        );
        let out = coercion().apply(set).unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.drops[&DropCause::UnparseableInvoiceDate], 1);

        let first = &out.records.records[0];
        assert_eq!(first[0], Value::Int(6));
        assert_eq!(first[2].render(), "2010-12-01 08:26:00");
        assert_eq!(first[3], Value::Str("17850".into()));

        let second = &out.records.records[1];
        assert_eq!(second[2], Value::Null);
        assert_eq!(second[3], Value::Str("UNKNOWN".into()));
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let set = RecordSet::from_text_rows(
            &["quantity", "unitprice", "invoicedate", "customerid"],
            &[vec!["6", "3.39", "12/1/2010 8:26", "17850.0"]],
        );
        let once = coercion().apply(set).unwrap().records;
        let twice = coercion().apply(once.clone()).unwrap().records;
        assert_eq!(once, twice);
    }
}
