//! Counters exported at `/metrics`. Without an installed recorder the macros are no-ops.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn install_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("metrics recorder not installed: {e}");
            None
        }
    }
}

pub fn llm_call(endpoint: &'static str, outcome: &'static str) {
    counter!("polycast_llm_calls_total", "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

pub fn upload(outcome: &'static str) {
    counter!("polycast_image_uploads_total", "outcome" => outcome).increment(1);
}

pub fn cast_logged(status: &'static str) {
    counter!("polycast_cast_logs_total", "status" => status).increment(1);
}

pub fn proxy_fetch(outcome: &'static str) {
    counter!("polycast_image_proxy_total", "outcome" => outcome).increment(1);
}
