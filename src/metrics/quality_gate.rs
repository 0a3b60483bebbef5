//! Quality gate metrics: report counters before/after cleaning and the decision

use crate::metrics::{phase_metric, PhaseMetrics};
use crate::pipeline::processing::quality_gate::QualityReport;

pub struct QualityGateMetrics;

impl QualityGateMetrics {
    /// Publish a report as gauges, labelled `before` or `after`
    pub fn record_report(point: &'static str, report: &QualityReport) {
        ::metrics::gauge!(phase_metric!(gauge, "quality_gate", "total_records"), "point" => point)
            .set(report.total_records as f64);
        for (name, count) in &report.counters {
            ::metrics::gauge!(
                phase_metric!(gauge, "quality_gate", "counter"),
                "point" => point,
                "counter" => name.clone()
            )
            .set(*count as f64);
        }
    }

    pub fn record_pass() {
        ::metrics::counter!(phase_metric!(counter, "quality_gate", "passed")).increment(1);
    }

    pub fn record_fail(violations: usize) {
        ::metrics::counter!(phase_metric!(counter, "quality_gate", "failed")).increment(1);
        ::metrics::gauge!(phase_metric!(gauge, "quality_gate", "violations")).set(violations as f64);
    }
}

impl PhaseMetrics for QualityGateMetrics {
    fn register_metrics() {
        use metrics::{counter, gauge};

        let _ = counter!(phase_metric!(counter, "quality_gate", "passed"));
        let _ = counter!(phase_metric!(counter, "quality_gate", "failed"));
        let _ = gauge!(phase_metric!(gauge, "quality_gate", "violations"));
        let _ = gauge!(phase_metric!(gauge, "quality_gate", "total_records"));
    }

    fn phase_name() -> &'static str {
        "quality_gate"
    }
}
