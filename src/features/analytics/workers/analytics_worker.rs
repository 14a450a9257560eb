use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::features::analytics::services::AnalyticsService;

/// Regenerates the analytics snapshot on a fixed period
pub struct AnalyticsWorker {
    service: Arc<AnalyticsService>,
    period: Duration,
}

impl AnalyticsWorker {
    pub fn new(service: Arc<AnalyticsService>, period: Duration) -> Self {
        Self { service, period }
    }

    /// Run forever; a failed run is logged and retried on the next tick
    pub async fn run(&self) {
        tracing::info!(
            "Starting analytics worker (every {}s)",
            self.period.as_secs()
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if let Err(e) = self.service.generate().await {
                tracing::error!("Error generating analytics snapshot: {:?}", e);
            }
        }
    }
}
