use std::collections::HashSet;

use crate::error::Result;
use crate::pipeline::steps::{DropCause, DropCounts, Stage, StageOutput};
use crate::types::{RecordSet, ValueKey};

/// Removes whole-record exact duplicates. One representative per duplicate class
/// survives; callers must not rely on which one.
#[derive(Debug, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Deduplicator {
    fn apply(&self, input: RecordSet) -> Result<StageOutput> {
        let RecordSet { schema, records } = input;

        let mut keep = Vec::with_capacity(records.len());
        {
            let mut seen: HashSet<Vec<ValueKey<'_>>> = HashSet::with_capacity(records.len());
            for record in &records {
                let key: Vec<ValueKey<'_>> = record.iter().map(|v| v.key()).collect();
                keep.push(seen.insert(key));
            }
        }

        let before = records.len();
        let survivors: Vec<_> = records
            .into_iter()
            .zip(keep)
            .filter_map(|(record, first)| first.then_some(record))
            .collect();

        let mut drops = DropCounts::new();
        let removed = before - survivors.len();
        if removed > 0 {
            drops.insert(DropCause::Duplicate, removed);
        }

        Ok(StageOutput {
            records: RecordSet::new(schema, survivors),
            drops,
        })
    }

    fn step_name(&self) -> &'static str {
        "deduplicate"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["normalize_schema"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn sample() -> RecordSet {
        RecordSet::from_text_rows(
            &["invoiceno", "customerid"],
            &[
                vec!["1", ""],
                vec!["1", ""],
                vec!["1", "7"],
                vec!["2", "7"],
                vec!["1", "7"],
            ],
        )
    }

    #[test]
    fn test_removes_exact_duplicates_with_nulls_equal() {
        let out = Deduplicator::new().apply(sample()).unwrap();
        assert_eq!(out.records.len(), 3);
        assert_eq!(out.drops[&DropCause::Duplicate], 2);
        assert_eq!(out.records.records[0], vec![Value::Str("1".into()), Value::Null]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let once = Deduplicator::new().apply(sample()).unwrap().records;
        let twice = Deduplicator::new().apply(once.clone()).unwrap();
        assert_eq!(once, twice.records);
        assert!(twice.drops.is_empty());
    }

    #[test]
    fn test_distinguishes_typed_values() {
        let schema = crate::types::Schema::new(vec!["v".into()]);
        let set = RecordSet::new(
            schema,
            vec![vec![Value::Int(1)], vec![Value::Str("1".into())], vec![Value::Float(1.0)]],
        );
        assert_eq!(Deduplicator::new().apply(set).unwrap().records.len(), 3);
    }
}
