use crate::constants;
use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level job configuration. Every field has a default matching the retail extract,
/// so an empty file (or no file) is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub columns: ColumnConfig,
    pub transform: TransformConfig,
    pub quality: QualityConfig,
}

/// Post-normalization column names for each role the pipeline knows about
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub invoice_no: String,
    pub stock_code: String,
    pub quantity: String,
    pub unit_price: String,
    pub invoice_date: String,
    pub customer_id: String,
    pub total_sales: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            invoice_no: constants::INVOICE_NO.to_string(),
            stock_code: constants::STOCK_CODE.to_string(),
            quantity: constants::QUANTITY.to_string(),
            unit_price: constants::UNIT_PRICE.to_string(),
            invoice_date: constants::INVOICE_DATE.to_string(),
            customer_id: constants::CUSTOMER_ID.to_string(),
            total_sales: constants::TOTAL_SALES.to_string(),
        }
    }
}

impl ColumnConfig {
    /// Fields a record must carry to survive the completeness filter
    pub fn required(&self) -> Vec<String> {
        vec![
            self.invoice_no.clone(),
            self.stock_code.clone(),
            self.quantity.clone(),
            self.unit_price.clone(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// chrono patterns tried in order when parsing the invoice date
    pub date_formats: Vec<String>,
    /// Columns to sanitize; empty means every column holding text
    pub free_text_columns: Vec<String>,
    pub unknown_customer: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                constants::SOURCE_DATE_FORMAT.to_string(),
                constants::CANONICAL_TIMESTAMP_FORMAT.to_string(),
            ],
            free_text_columns: vec![
                constants::DESCRIPTION.to_string(),
                constants::COUNTRY.to_string(),
            ],
            unknown_customer: constants::UNKNOWN_CUSTOMER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Report counters that abort the run when non-zero
    pub gating_counters: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            gating_counters: constants::default_gating_counters(),
        }
    }
}

impl EtlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EtlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.transform.date_formats.is_empty() {
            return Err(EtlError::Config(
                "transform.date_formats must list at least one pattern".to_string(),
            ));
        }
        if self.transform.unknown_customer.trim().is_empty() {
            return Err(EtlError::Config(
                "transform.unknown_customer must not be blank".to_string(),
            ));
        }
        let known = [
            constants::NULL_INVOICEID,
            constants::NULL_CUSTOMERID,
            constants::NONPOSITIVE_QUANTITY,
            constants::NONPOSITIVE_PRICE,
        ];
        for counter in &self.quality.gating_counters {
            if !known.contains(&counter.as_str()) {
                return Err(EtlError::Config(format!(
                    "Unknown gating counter '{}'; expected one of {:?}",
                    counter, known
                )));
            }
        }
        Ok(())
    }
}
