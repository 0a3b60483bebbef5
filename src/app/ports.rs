use async_trait::async_trait;

use crate::error::Result;
use crate::types::RecordSet;

/// Supplies the raw extract, read in its entirety
#[async_trait]
pub trait RecordSourcePort: Send + Sync {
    async fn load(&self) -> Result<RecordSet>;

    /// Where the records come from, for logs
    fn describe(&self) -> String;
}

/// Receives the cleaned extract; only called after the quality gate passed
#[async_trait]
pub trait RecordSinkPort: Send + Sync {
    /// Write the whole set as one logical file and return its location
    async fn write(&self, records: &RecordSet) -> Result<String>;
}
