use rayon::prelude::*;

use crate::config::ColumnConfig;
use crate::error::{EtlError, Result};
use crate::pipeline::steps::{Stage, StageOutput};
use crate::types::{Record, RecordSet, Value};

/// Appends `total_sales = quantity * unit_price`.
///
/// Expects quantity as an integer and unit price as a float. Anything else means
/// the stage ran before coercion, which is a pipeline defect rather than bad data.
#[derive(Debug, Clone)]
pub struct DerivationEngine {
    quantity: String,
    unit_price: String,
    total_sales: String,
}

impl DerivationEngine {
    pub fn new(columns: &ColumnConfig) -> Self {
        Self {
            quantity: columns.quantity.clone(),
            unit_price: columns.unit_price.clone(),
            total_sales: columns.total_sales.clone(),
        }
    }

    fn defect(&self, message: String) -> EtlError {
        EtlError::Defect {
            stage: self.step_name(),
            message,
        }
    }
}

impl Stage for DerivationEngine {
    fn apply(&self, input: RecordSet) -> Result<StageOutput> {
        let RecordSet { schema, records } = input;

        let (Some(qty_idx), Some(price_idx)) =
            (schema.index_of(&self.quantity), schema.index_of(&self.unit_price))
        else {
            return Err(self.defect(format!(
                "columns '{}' and '{}' are required, schema is {:?}",
                self.quantity,
                self.unit_price,
                schema.columns()
            )));
        };

        // Recompute in place when the column already exists
        let (schema, total_idx, append) = match schema.index_of(&self.total_sales) {
            Some(idx) => (schema, idx, false),
            None => {
                let (schema, idx) = schema.append(&self.total_sales);
                (schema, idx, true)
            }
        };

        let derived: std::result::Result<Vec<Record>, String> = records
            .into_par_iter()
            .map(|mut record| {
                let total = match (&record[qty_idx], &record[price_idx]) {
                    (Value::Int(q), Value::Float(p)) => *q as f64 * p,
                    (q, p) => {
                        return Err(format!("expected integer quantity and float price, got {:?} and {:?}", q, p))
                    }
                };
                if append {
                    record.push(Value::Float(total));
                } else {
                    record[total_idx] = Value::Float(total);
                }
                Ok(record)
            })
            .collect();

        let records = derived.map_err(|message| self.defect(message))?;
        Ok(StageOutput::unchanged(RecordSet::new(schema, records)))
    }

    fn step_name(&self) -> &'static str {
        "derive_columns"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["type_coercion"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Schema;

    fn typed_set() -> RecordSet {
        RecordSet::new(
            Schema::new(vec!["quantity".into(), "unitprice".into()]),
            vec![
                vec![Value::Int(6), Value::Float(3.39)],
                vec![Value::Int(12), Value::Float(0.85)],
            ],
        )
    }

    #[test]
    fn test_appends_total_sales_at_end() {
        let out = DerivationEngine::new(&ColumnConfig::default())
            .apply(typed_set())
            .unwrap()
            .records;
        assert_eq!(out.schema.columns(), &["quantity", "unitprice", "total_sales"]);
        match out.records[0][2] {
            Value::Float(total) => assert!((total - 20.34).abs() < 1e-9),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rerun_does_not_duplicate_column() {
        let engine = DerivationEngine::new(&ColumnConfig::default());
        let once = engine.apply(typed_set()).unwrap().records;
        let twice = engine.apply(once.clone()).unwrap().records;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_uncoerced_input_is_a_defect() {
        let set = RecordSet::from_text_rows(&["quantity", "unitprice"], &[vec!["6", "3.39"]]);
        let err = DerivationEngine::new(&ColumnConfig::default()).apply(set).unwrap_err();
        assert!(matches!(err, EtlError::Defect { stage: "derive_columns", .. }));
    }
}
