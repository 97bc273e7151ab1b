pub mod health;
pub mod metrics_handler;
pub mod prices;
pub mod usage;

use crate::pricing::PriceStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PriceStore>,
    pub metrics_handle: Arc<PrometheusHandle>,
}
