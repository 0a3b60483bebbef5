use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::metrics::{QualityGateMetrics, StageMetrics};
use crate::pipeline::processing::coerce::TypeCoercion;
use crate::pipeline::processing::dedupe::Deduplicator;
use crate::pipeline::processing::derive::DerivationEngine;
use crate::pipeline::processing::filter::{CompletenessFilter, DomainFilter};
use crate::pipeline::processing::normalize::SchemaNormalizer;
use crate::pipeline::processing::quality_gate::{
    DefaultQualityGate, QualityAssessment, QualityDecision, QualityGate, QualityGateConfig,
    QualityReport,
};
use crate::pipeline::processing::sanitize::Sanitizer;
use crate::pipeline::steps::{Stage, StageStats};
use crate::types::RecordSet;

/// Name of the stage after which column names are canonical
const SCHEMA_STAGE: &str = "normalize_schema";

/// Result of a pipeline run whose quality gate passed
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    #[serde(skip)]
    pub records: RecordSet,
    /// Counters over the input, once column names are canonical
    pub before: QualityReport,
    /// Counters over the cleaned set
    pub after: QualityReport,
    pub stages: Vec<StageStats>,
}

/// Strict sequence of barrier-synchronized stages followed by the quality gate
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    gate: Box<dyn QualityGate>,
}

impl Pipeline {
    /// Build a pipeline, rejecting stage orders that violate declared dependencies
    pub fn new(stages: Vec<Box<dyn Stage>>, gate: Box<dyn QualityGate>) -> Result<Self> {
        validate_order(&stages)?;
        Ok(Self { stages, gate })
    }

    /// The canonical cleaning sequence for the retail extract
    pub fn standard(config: &EtlConfig) -> Result<Self> {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(SchemaNormalizer::new()),
            Box::new(Deduplicator::new()),
            Box::new(CompletenessFilter::new(&config.columns)),
            Box::new(DomainFilter::new(&config.columns)),
            Box::new(TypeCoercion::new(&config.columns, &config.transform)),
            Box::new(DerivationEngine::new(&config.columns)),
            Box::new(Sanitizer::new(&config.columns, &config.transform)),
        ];
        let gate = DefaultQualityGate::with_config(QualityGateConfig::new(&config.columns, &config.quality));
        Self::new(stages, Box::new(gate))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.step_name()).collect()
    }

    /// Run every stage to completion in order, then apply the quality gate.
    ///
    /// On a gate violation the cleaned records are discarded and a
    /// `QualityGate` error is returned; nothing may be written.
    #[instrument(skip_all, fields(input_records = input.len()))]
    pub fn run(&self, input: RecordSet) -> Result<PipelineResult> {
        info!("Original records: {}", input.len());

        let mut current = input;
        let mut before: Option<QualityReport> = None;
        let mut stats = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if before.is_none() && stage.step_name() != SCHEMA_STAGE {
                before = Some(self.snapshot_before(&current));
            }

            let name = stage.step_name();
            let input_count = current.len();
            let timer = StageMetrics::time_stage(name);
            let output = stage.apply(current).map_err(|e| {
                if matches!(e, EtlError::Defect { .. }) {
                    StageMetrics::record_defect(name);
                }
                error!("Stage {} failed: {}", name, e);
                e
            })?;
            drop(timer);

            let stage_stats = StageStats::new(name, input_count, &output);
            info!(
                stage = name,
                "{}: {} -> {} records ({} dropped)",
                name,
                input_count,
                stage_stats.output_count,
                output.dropped_total()
            );
            for (cause, count) in &stage_stats.drops {
                info!(stage = name, cause = *cause, count = *count, "Dropped records");
            }
            for (class, count) in &stage_stats.drops_by_class {
                debug!(stage = name, class = *class, count = *count, "Drops by failure class");
            }
            if name == SCHEMA_STAGE {
                debug!("Columns: {:?}", output.records.schema.columns());
            }
            StageMetrics::record_stage(&stage_stats);
            stats.push(stage_stats);
            current = output.records;
        }

        let before = match before {
            Some(report) => report,
            None => self.snapshot_before(&current),
        };

        let after = self.gate.report(&current);
        after.log("after");
        QualityGateMetrics::record_report("after", &after);

        let decision = self.gate.decide(&after);
        if let QualityDecision::Fail { violations } = &decision {
            for (rule, count) in violations {
                warn!(rule = %rule, count = *count, "Quality rule violated");
            }
            QualityGateMetrics::record_fail(violations.len());
        }
        let after = QualityAssessment { report: after, decision }
            .into_result()
            .map_err(|e| {
                error!("{}", e);
                e
            })?;

        QualityGateMetrics::record_pass();
        info!("Quality gate passed; clean records: {}", current.len());
        Ok(PipelineResult {
            records: current,
            before,
            after,
            stages: stats,
        })
    }

    fn snapshot_before(&self, records: &RecordSet) -> QualityReport {
        let report = self.gate.report(records);
        report.log("before");
        QualityGateMetrics::record_report("before", &report);
        report
    }
}

/// Every dependency must appear earlier; a stage name may appear only once
fn validate_order(stages: &[Box<dyn Stage>]) -> Result<()> {
    let mut seen = HashSet::new();
    for stage in stages {
        let name = stage.step_name();
        for dep in stage.dependencies() {
            if !seen.contains(dep) {
                return Err(EtlError::Config(format!(
                    "Stage '{}' depends on '{}' which does not appear earlier in the pipeline",
                    name, dep
                )));
            }
        }
        if !seen.insert(name) {
            return Err(EtlError::Config(format!("Stage '{}' appears more than once", name)));
        }
    }
    Ok(())
}
