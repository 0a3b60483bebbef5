pub mod csv_source_adapter;
pub mod tsv_sink_adapter;

pub use csv_source_adapter::{CsvFileSourceAdapter, SourceConfig};
pub use tsv_sink_adapter::{SinkConfig, TsvFileSinkAdapter};
