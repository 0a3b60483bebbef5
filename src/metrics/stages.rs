//! Stage execution metrics: records in/out, drops by cause, duration

use crate::metrics::core::{time_operation, TimingGuard};
use crate::metrics::{phase_metric, PhaseMetrics};
use crate::pipeline::steps::StageStats;

pub const STAGE_DURATION: &str = phase_metric!(histogram, "stage", "duration_seconds");

pub struct StageMetrics;

impl StageMetrics {
    /// Start timing a stage; the duration is recorded when the guard drops
    pub fn time_stage(stage: &'static str) -> TimingGuard {
        time_operation(STAGE_DURATION).with_label("stage", stage)
    }

    pub fn record_stage(stats: &StageStats) {
        ::metrics::counter!(phase_metric!(counter, "stage", "records_in"), "stage" => stats.stage)
            .increment(stats.input_count as u64);
        ::metrics::counter!(phase_metric!(counter, "stage", "records_out"), "stage" => stats.stage)
            .increment(stats.output_count as u64);
        for (cause, count) in &stats.drops {
            ::metrics::counter!(
                phase_metric!(counter, "stage", "records_dropped"),
                "stage" => stats.stage,
                "cause" => *cause
            )
            .increment(*count as u64);
        }
    }

    pub fn record_defect(stage: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "stage", "defects"), "stage" => stage).increment(1);
    }
}

impl PhaseMetrics for StageMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "stage", "records_in"));
        let _ = counter!(phase_metric!(counter, "stage", "records_out"));
        let _ = counter!(phase_metric!(counter, "stage", "records_dropped"));
        let _ = counter!(phase_metric!(counter, "stage", "defects"));
        let _ = histogram!(STAGE_DURATION);
    }

    fn phase_name() -> &'static str {
        "stage"
    }
}
