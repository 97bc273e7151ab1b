use crate::pricing::TableSummary;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle used by `/metrics`
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "ec2_price_refresh_total",
        "Completed price refresh cycles by outcome"
    );
    describe_histogram!(
        "ec2_price_refresh_duration_seconds",
        "Duration of a price refresh cycle in seconds"
    );
    describe_gauge!(
        "ec2_price_regions",
        "Regions in the currently published price table"
    );
    describe_gauge!(
        "ec2_price_instance_types",
        "Region/instance type prices in the currently published price table"
    );
    describe_counter!(
        "ec2_price_skipped_entries_total",
        "Catalog entries skipped because of an unexpected shape"
    );
    describe_counter!(
        "ec2_price_requests_total",
        "Price lookups served by route and status"
    );
    describe_gauge!(
        "ec2_price_info",
        "Service version information"
    );

    gauge!("ec2_price_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record the end of a refresh cycle
pub fn record_refresh(outcome: &str, duration: Duration) {
    counter!("ec2_price_refresh_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("ec2_price_refresh_duration_seconds").record(duration.as_secs_f64());
}

/// Record the size of a newly published table
pub fn record_published(summary: TableSummary) {
    gauge!("ec2_price_regions").set(summary.regions as f64);
    gauge!("ec2_price_instance_types").set(summary.instance_types as f64);
}

pub fn record_skipped_entries(count: usize) {
    counter!("ec2_price_skipped_entries_total").increment(count as u64);
}

/// Record a served lookup
pub fn record_request(route: &str, status: u16) {
    counter!(
        "ec2_price_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metrics() {
        init_metric_descriptions();

        record_refresh("success", Duration::from_millis(1500));
        record_refresh("provider_fetch_error", Duration::from_millis(20));
        record_published(TableSummary {
            regions: 3,
            instance_types: 9,
        });
        record_skipped_entries(2);
        record_request("region", 200);

        // Without an installed recorder these are no-ops; they must not panic
    }

    #[test]
    fn test_rendered_metrics_with_local_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_request("price", 404);
        });

        let rendered = handle.render();
        assert!(rendered.contains("ec2_price_requests_total"));
        assert!(rendered.contains("status=\"404\""));
    }
}
