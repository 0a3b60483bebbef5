use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::config::{ColumnConfig, QualityConfig};
use crate::constants::{NONPOSITIVE_PRICE, NONPOSITIVE_QUANTITY, NULL_CUSTOMERID, NULL_INVOICEID};
use crate::error::{EtlError, Result};
use crate::types::{Record, RecordSet, Value};

/// Aggregate statistics over a RecordSet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_records: usize,
    /// Named violation counters; new rules add entries here
    pub counters: BTreeMap<String, usize>,
}

impl QualityReport {
    pub fn counter(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Emit the total and every counter, labelled with the point in the run
    pub fn log(&self, label: &str) {
        info!(label, total_records = self.total_records, "Total records: {}", self.total_records);
        for (name, count) in &self.counters {
            info!(label, counter = %name, count, "{}: {}", name, count);
        }
    }
}

/// Outcome of the gate for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QualityDecision {
    /// Cleaned data is safe to publish
    Pass,
    /// At least one gating counter is non-zero
    Fail { violations: Vec<(String, usize)> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub report: QualityReport,
    pub decision: QualityDecision,
}

impl QualityAssessment {
    pub fn passed(&self) -> bool {
        self.decision == QualityDecision::Pass
    }

    /// Human-readable list of violated rules with counts
    pub fn violation_summary(&self) -> Option<String> {
        match &self.decision {
            QualityDecision::Pass => None,
            QualityDecision::Fail { violations } => {
                let rules: Vec<String> = violations
                    .iter()
                    .map(|(name, count)| format!("{}={}", name, count))
                    .collect();
                Some(format!(
                    "{} (total records: {})",
                    rules.join(", "),
                    self.report.total_records
                ))
            }
        }
    }

    /// Turn a failing assessment into the fatal run error
    pub fn into_result(self) -> Result<QualityReport> {
        match self.violation_summary() {
            None => Ok(self.report),
            Some(summary) => Err(EtlError::QualityGate { summary }),
        }
    }
}

/// Trait for implementing Quality Gate assessment logic
pub trait QualityGate: Send + Sync {
    /// Aggregate counters over the full collection
    fn report(&self, records: &RecordSet) -> QualityReport;

    /// Pass/fail for a computed report
    fn decide(&self, report: &QualityReport) -> QualityDecision;

    fn assess(&self, records: &RecordSet) -> QualityAssessment {
        let report = self.report(records);
        let decision = self.decide(&report);
        QualityAssessment { report, decision }
    }
}

/// Configuration for the default gate
#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    pub invoice_no: String,
    pub customer_id: String,
    pub quantity: String,
    pub unit_price: String,
    pub gating_counters: Vec<String>,
}

impl QualityGateConfig {
    pub fn new(columns: &ColumnConfig, quality: &QualityConfig) -> Self {
        Self {
            invoice_no: columns.invoice_no.clone(),
            customer_id: columns.customer_id.clone(),
            quantity: columns.quantity.clone(),
            unit_price: columns.unit_price.clone(),
            gating_counters: quality.gating_counters.clone(),
        }
    }
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self::new(&ColumnConfig::default(), &QualityConfig::default())
    }
}

/// Fail-closed gate: any single gating counter above zero aborts the run
pub struct DefaultQualityGate {
    pub config: QualityGateConfig,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    null_invoice: usize,
    null_customer: usize,
    nonpositive_quantity: usize,
    nonpositive_price: usize,
}

impl Tally {
    fn merge(self, other: Tally) -> Tally {
        Tally {
            null_invoice: self.null_invoice + other.null_invoice,
            null_customer: self.null_customer + other.null_customer,
            nonpositive_quantity: self.nonpositive_quantity + other.nonpositive_quantity,
            nonpositive_price: self.nonpositive_price + other.nonpositive_price,
        }
    }
}

fn missing(record: &Record, idx: Option<usize>) -> bool {
    idx.and_then(|i| record.get(i)).map_or(true, Value::is_missing)
}

// Null or non-numeric counts as non-positive
fn not_positive(record: &Record, idx: Option<usize>) -> bool {
    !matches!(idx.and_then(|i| record.get(i)).and_then(Value::as_f64), Some(v) if v > 0.0)
}

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self {
            config: QualityGateConfig::default(),
        }
    }

    pub fn with_config(config: QualityGateConfig) -> Self {
        Self { config }
    }
}

impl QualityGate for DefaultQualityGate {
    /// One aggregation pass over the collection
    fn report(&self, records: &RecordSet) -> QualityReport {
        let schema = &records.schema;
        let invoice = schema.index_of(&self.config.invoice_no);
        let customer = schema.index_of(&self.config.customer_id);
        let quantity = schema.index_of(&self.config.quantity);
        let price = schema.index_of(&self.config.unit_price);

        let tally = records
            .records
            .par_iter()
            .fold(Tally::default, |mut t, record| {
                t.null_invoice += missing(record, invoice) as usize;
                t.null_customer += missing(record, customer) as usize;
                t.nonpositive_quantity += not_positive(record, quantity) as usize;
                t.nonpositive_price += not_positive(record, price) as usize;
                t
            })
            .reduce(Tally::default, Tally::merge);

        let counters = BTreeMap::from([
            (NULL_INVOICEID.to_string(), tally.null_invoice),
            (NULL_CUSTOMERID.to_string(), tally.null_customer),
            (NONPOSITIVE_QUANTITY.to_string(), tally.nonpositive_quantity),
            (NONPOSITIVE_PRICE.to_string(), tally.nonpositive_price),
        ]);

        QualityReport {
            total_records: records.len(),
            counters,
        }
    }

    fn decide(&self, report: &QualityReport) -> QualityDecision {
        let violations: Vec<(String, usize)> = self
            .config
            .gating_counters
            .iter()
            .map(|name| (name.clone(), report.counter(name)))
            .filter(|(_, count)| *count > 0)
            .collect();

        if violations.is_empty() {
            QualityDecision::Pass
        } else {
            QualityDecision::Fail { violations }
        }
    }
}

impl Default for DefaultQualityGate {
    fn default() -> Self {
        Self::new()
    }
}
