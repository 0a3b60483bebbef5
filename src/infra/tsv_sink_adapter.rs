use crate::app::ports::RecordSinkPort;
use crate::constants::OUTPUT_DELIMITER;
use crate::error::Result;
use crate::types::RecordSet;
use csv::{QuoteStyle, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl SinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: OUTPUT_DELIMITER,
        }
    }
}

/// Writes the cleaned set as a single tab-delimited file with a header row.
/// Output goes to a `.partial` sibling first and is renamed into place, so a
/// reader never sees a half-written file.
pub struct TsvFileSinkAdapter {
    config: SinkConfig,
}

impl TsvFileSinkAdapter {
    pub fn new(config: SinkConfig) -> Self {
        Self { config }
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .config
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output".into());
        name.push(".partial");
        self.config.path.with_file_name(name)
    }

    fn write_to(&self, path: &Path, records: &RecordSet) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.config.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .from_path(path)?;

        writer.write_record(records.schema.columns())?;
        for record in &records.records {
            writer.write_record(record.iter().map(|v| v.render()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordSinkPort for TsvFileSinkAdapter {
    async fn write(&self, records: &RecordSet) -> Result<String> {
        if let Some(dir) = self.config.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let partial = self.partial_path();
        if let Err(e) = self.write_to(&partial, records) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &self.config.path)?;

        let location = self.config.path.display().to_string();
        info!("Wrote {} records to {}", records.len(), location);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Schema, Value};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_writes_tab_delimited_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("processed").join("clean.tsv");
        let set = RecordSet::new(
            Schema::new(vec!["invoiceno".into(), "quantity".into(), "total_sales".into()]),
            vec![vec![Value::Str("536365".into()), Value::Int(6), Value::Float(6.0 * 3.39)]],
        );

        let sink = TsvFileSinkAdapter::new(SinkConfig::new(&path));
        let location = sink.write(&set).await.unwrap();

        assert_eq!(location, path.display().to_string());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "invoiceno\tquantity\ttotal_sales\n536365\t6\t20.34\n");
        assert!(!dir.path().join("processed").join("clean.tsv.partial").exists());
    }
}
