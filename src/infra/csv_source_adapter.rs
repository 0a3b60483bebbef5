use crate::app::ports::RecordSourcePort;
use crate::constants::INPUT_DELIMITER;
use crate::error::Result;
use crate::types::{RecordSet, Schema, Value};
use csv::ReaderBuilder;
use std::path::PathBuf;
use tracing::info;

/// Settings for the delimited-file source, passed in explicitly
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: INPUT_DELIMITER,
        }
    }
}

/// Reads a header-row delimited file into a RecordSet. Empty fields become null.
pub struct CsvFileSourceAdapter {
    config: SourceConfig,
}

impl CsvFileSourceAdapter {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl RecordSourcePort for CsvFileSourceAdapter {
    async fn load(&self) -> Result<RecordSet> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .from_path(&self.config.path)?;

        let schema = Schema::new(reader.headers()?.iter().map(str::to_string).collect());

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(row.iter().map(Value::from_text).collect());
        }

        info!(
            "Loaded {} records with {} columns from {}",
            records.len(),
            schema.len(),
            self.config.path.display()
        );
        Ok(RecordSet::new(schema, records))
    }

    fn describe(&self) -> String {
        self.config.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_loads_header_and_quoted_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "InvoiceNo,Description,CustomerID").unwrap();
        writeln!(file, "536365,\"WHITE, METAL LANTERN\",17850.0").unwrap();
        writeln!(file, "536366,HAND WARMER,").unwrap();

        let source = CsvFileSourceAdapter::new(SourceConfig::new(file.path()));
        let set = source.load().await.unwrap();

        assert_eq!(set.schema.columns(), &["InvoiceNo", "Description", "CustomerID"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0][1], Value::Str("WHITE, METAL LANTERN".into()));
        assert_eq!(set.records[1][2], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = CsvFileSourceAdapter::new(SourceConfig::new("/nonexistent/raw_data.csv"));
        assert!(source.load().await.is_err());
    }
}
