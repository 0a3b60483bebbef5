use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::app::ports::{RecordSinkPort, RecordSourcePort};
use crate::error::Result;
use crate::pipeline::processing::quality_gate::QualityReport;
use crate::pipeline::{Pipeline, StageStats};

/// Use case for one cleaning run: load, clean, gate, and publish
pub struct EtlUseCase {
    source: Box<dyn RecordSourcePort>,
    sink: Option<Box<dyn RecordSinkPort>>,
    pipeline: Pipeline,
}

/// Everything an operator needs to audit a successful run
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub clean_records: usize,
    /// None when the run had no sink (check mode)
    pub output_location: Option<String>,
    pub before: QualityReport,
    pub after: QualityReport,
    pub stages: Vec<StageStats>,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl EtlUseCase {
    pub fn new(source: Box<dyn RecordSourcePort>, pipeline: Pipeline) -> Self {
        Self {
            source,
            sink: None,
            pipeline,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn RecordSinkPort>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run the job. A quality gate failure returns before the sink is touched.
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Starting cleaning run");

        let raw = self.source.load().await?;
        let result = self.pipeline.run(raw)?;

        let output_location = match &self.sink {
            Some(sink) => Some(sink.write(&result.records).await?),
            None => {
                info!("No sink configured; cleaned records are not written");
                None
            }
        };

        info!(%run_id, "Cleaning run completed successfully");
        Ok(RunSummary {
            run_id,
            source: self.source.describe(),
            started_at,
            finished_at: Utc::now(),
            clean_records: result.records.len(),
            output_location,
            before: result.before,
            after: result.after,
            stages: result.stages,
        })
    }
}
