use tracing::{info, warn};

use crate::error::{EtlError, Result};

pub const PUSHGATEWAY_ENV: &str = "ETL_PUSHGATEWAY_URL";

/// Pushgateway URL for a job/instance pair
pub fn push_url(base: &str, job: &str, instance: &str) -> String {
    format!(
        "{}/metrics/job/{}/instance/{}",
        base.trim_end_matches('/'),
        job,
        instance
    )
}

/// Push the in-process metrics snapshot to a Prometheus Pushgateway.
///
/// Short-lived batch runs cannot be scraped, so the rendered recorder is pushed
/// once at the end. Does nothing when `ETL_PUSHGATEWAY_URL` is unset.
pub async fn push_run_metrics(instance: &str) -> Result<()> {
    let base = match std::env::var(PUSHGATEWAY_ENV) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => {
            info!("{} not configured, skipping metrics push", PUSHGATEWAY_ENV);
            return Ok(());
        }
    };

    let Some(body) = crate::metrics::render() else {
        warn!("Metrics recorder not installed, nothing to push");
        return Ok(());
    };

    let url = push_url(&base, "retail_etl", instance);
    info!("Pushing {} bytes of metrics to {}", body.len(), url);

    let response = reqwest::Client::new()
        .put(&url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(EtlError::Pushgateway { status, body });
    }

    info!("Pushed metrics to Pushgateway for instance={}", instance);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_url_trims_trailing_slash() {
        assert_eq!(
            push_url("http://localhost:9091/", "retail_etl", "run-1"),
            "http://localhost:9091/metrics/job/retail_etl/instance/run-1"
        );
    }
}
