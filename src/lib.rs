//! Cleaning and quality-gate pipeline for retail transaction extracts

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod metrics_push;
pub mod pipeline;
pub mod types;

// Layered boundaries: use cases and ports, and their file-backed adapters
pub mod app;
pub mod infra;

pub use error::{EtlError, Result};
pub use types::{Record, RecordSet, Schema, Value};
