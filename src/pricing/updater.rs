use crate::error::{error_type_name, AppError};
use crate::metrics;
use crate::pricing::fetcher::PriceFetcher;
use crate::pricing::models::TableSummary;
use crate::pricing::store::PriceStore;
use crate::signals::ShutdownSignal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Notify};
use tracing::{error, info};

/// Periodically refreshes the price store from the pricing catalog
pub struct PricingUpdater {
    fetcher: PriceFetcher,
    store: Arc<PriceStore>,
    update_interval: Duration,
    refresh_now: Arc<Notify>,
}

impl PricingUpdater {
    pub fn new(fetcher: PriceFetcher, store: Arc<PriceStore>, update_interval: Duration) -> Self {
        Self {
            fetcher,
            store,
            update_interval,
            refresh_now: Arc::new(Notify::new()),
        }
    }

    /// Handle that triggers an out-of-schedule refresh when notified
    pub fn refresh_trigger(&self) -> Arc<Notify> {
        self.refresh_now.clone()
    }

    /// Run one fetch cycle and publish its table.
    ///
    /// On failure nothing is published and the previous table stays current.
    pub async fn refresh(&self) -> Result<TableSummary, AppError> {
        let started = Instant::now();

        let result = self.fetcher.fetch().await;
        let elapsed = started.elapsed();

        match result {
            Ok(table) => {
                let summary = table.summary();
                self.store.publish(table);
                metrics::record_refresh("success", elapsed);
                metrics::record_published(summary);
                Ok(summary)
            }
            Err(e) => {
                metrics::record_refresh(error_type_name(&e), elapsed);
                Err(e)
            }
        }
    }

    /// Refresh on every interval tick until shutdown.
    ///
    /// The first tick fires one interval from now; the startup fetch is done
    /// by the caller before serving. Failed cycles wait for the next tick.
    pub async fn run(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<ShutdownSignal>) {
        info!(
            "Starting pricing updater (interval: {:?})",
            self.update_interval
        );

        let start = tokio::time::Instant::now() + self.update_interval;
        let mut interval = tokio::time::interval_at(start, self.update_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.refresh_now.notified() => {
                    info!("Manual price refresh requested");
                }
                _ = shutdown_rx.recv() => {
                    info!("Pricing updater stopped");
                    break;
                }
            }

            match self.refresh().await {
                Ok(summary) => info!(
                    "Price table refreshed: {} instance types in {} regions",
                    summary.instance_types, summary.regions
                ),
                Err(e) => error!("Price refresh failed, keeping previous table: {}", e),
            }
        }
    }
}
