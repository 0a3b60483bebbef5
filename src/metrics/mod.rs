//! Metrics infrastructure for the cleaning pipeline
//!
//! Each phase (stage execution, quality gate) owns its metric names in a dedicated
//! submodule. A Prometheus recorder is installed once per process; batch runs render
//! it in-process and push the snapshot to a Pushgateway (see `metrics_push`).

pub mod core;
pub mod quality_gate;
pub mod stages;

pub use quality_gate::QualityGateMetrics;
pub use stages::StageMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Once, OnceLock};
use tracing::{debug, info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global recorder and pre-register every phase metric. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Metrics handle already stored");
            }
            register_phase::<StageMetrics>();
            register_phase::<QualityGateMetrics>();
            info!("Prometheus recorder installed");
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    });
}

/// Handle for in-process rendering, if the recorder was installed
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    HANDLE.get()
}

/// Current snapshot in Prometheus text exposition format
pub fn render() -> Option<String> {
    get_handle().map(|h| h.render())
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Register all metrics for this phase so they appear even when zero
    fn register_metrics();

    fn phase_name() -> &'static str;
}

fn register_phase<T: PhaseMetrics>() {
    T::register_metrics();
    debug!("Registered metrics for phase '{}'", T::phase_name());
}

/// Builds metric names following `etl_{phase}_{name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
