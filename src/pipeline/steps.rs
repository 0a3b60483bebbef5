use crate::error::Result;
use crate::types::{Record, RecordSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single barrier-synchronized transformation in the cleaning pipeline.
///
/// A stage owns its input and hands back a fresh RecordSet; it never sees a
/// partially produced collection.
pub trait Stage: Send + Sync {
    /// Transform the full input collection
    fn apply(&self, input: RecordSet) -> Result<StageOutput>;

    /// Name used in logs, metrics and dependency checks
    fn step_name(&self) -> &'static str;

    /// Stages that must appear earlier in the pipeline
    fn dependencies(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Why a record was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DropCause {
    Duplicate,
    MissingRequired,
    UnparseableQuantity,
    UnparseableUnitPrice,
    UnparseableInvoiceDate,
    NonpositiveQuantity,
    NonpositiveUnitPrice,
}

/// Which error class a drop belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Duplicate,
    Completeness,
    Domain,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::Duplicate => "duplicate",
            FailureClass::Completeness => "completeness",
            FailureClass::Domain => "domain",
        }
    }
}

impl DropCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropCause::Duplicate => "duplicate",
            DropCause::MissingRequired => "missing_required",
            DropCause::UnparseableQuantity => "unparseable_quantity",
            DropCause::UnparseableUnitPrice => "unparseable_unit_price",
            DropCause::UnparseableInvoiceDate => "unparseable_invoice_date",
            DropCause::NonpositiveQuantity => "nonpositive_quantity",
            DropCause::NonpositiveUnitPrice => "nonpositive_unit_price",
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            DropCause::Duplicate => FailureClass::Duplicate,
            DropCause::MissingRequired
            | DropCause::UnparseableQuantity
            | DropCause::UnparseableUnitPrice
            | DropCause::UnparseableInvoiceDate => FailureClass::Completeness,
            DropCause::NonpositiveQuantity | DropCause::NonpositiveUnitPrice => FailureClass::Domain,
        }
    }
}

pub type DropCounts = BTreeMap<DropCause, usize>;

/// What a stage produced, plus the records it dropped by cause
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub records: RecordSet,
    pub drops: DropCounts,
}

impl StageOutput {
    pub fn unchanged(records: RecordSet) -> Self {
        Self {
            records,
            drops: DropCounts::new(),
        }
    }

    pub fn dropped_total(&self) -> usize {
        self.drops.values().sum()
    }
}

/// Per-stage diagnostics kept for the run summary
#[derive(Debug, Clone, Serialize)]
pub struct StageStats {
    pub stage: &'static str,
    pub input_count: usize,
    pub output_count: usize,
    pub drops: BTreeMap<&'static str, usize>,
    /// Drops rolled up by failure class
    pub drops_by_class: BTreeMap<&'static str, usize>,
}

impl StageStats {
    pub fn new(stage: &'static str, input_count: usize, output: &StageOutput) -> Self {
        let mut drops_by_class = BTreeMap::new();
        for (cause, n) in &output.drops {
            *drops_by_class.entry(cause.class().as_str()).or_insert(0) += *n;
        }
        Self {
            stage,
            input_count,
            output_count: output.records.len(),
            drops: output.drops.iter().map(|(cause, n)| (cause.as_str(), *n)).collect(),
            drops_by_class,
        }
    }
}

/// Split per-record outcomes into survivors and drop counts, preserving order
pub(crate) fn collect_outcomes(
    outcomes: Vec<std::result::Result<Record, DropCause>>,
) -> (Vec<Record>, DropCounts) {
    let mut kept = Vec::with_capacity(outcomes.len());
    let mut drops = DropCounts::new();
    for outcome in outcomes {
        match outcome {
            Ok(record) => kept.push(record),
            Err(cause) => *drops.entry(cause).or_insert(0) += 1,
        }
    }
    (kept, drops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_collect_outcomes_counts_by_cause() {
        let outcomes = vec![
            Ok(vec![Value::Int(1)]),
            Err(DropCause::MissingRequired),
            Ok(vec![Value::Int(2)]),
            Err(DropCause::MissingRequired),
            Err(DropCause::NonpositiveQuantity),
        ];
        let (kept, drops) = collect_outcomes(outcomes);
        assert_eq!(kept, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        assert_eq!(drops[&DropCause::MissingRequired], 2);
        assert_eq!(drops[&DropCause::NonpositiveQuantity], 1);
    }

    #[test]
    fn test_stage_stats_roll_up_by_class() {
        let mut drops = DropCounts::new();
        drops.insert(DropCause::MissingRequired, 2);
        drops.insert(DropCause::UnparseableQuantity, 1);
        drops.insert(DropCause::NonpositiveUnitPrice, 4);
        let output = StageOutput {
            records: RecordSet::default(),
            drops,
        };

        let stats = StageStats::new("completeness_filter", 7, &output);
        assert_eq!(stats.output_count, 0);
        assert_eq!(stats.drops["missing_required"], 2);
        assert_eq!(stats.drops_by_class["completeness"], 3);
        assert_eq!(stats.drops_by_class["domain"], 4);
        assert!(!stats.drops_by_class.contains_key("duplicate"));
    }

    #[test]
    fn test_drop_cause_classes() {
        assert_eq!(DropCause::UnparseableInvoiceDate.class(), FailureClass::Completeness);
        assert_eq!(DropCause::NonpositiveUnitPrice.class(), FailureClass::Domain);
    }
}
