//! Periodic removal of elapsed rate-limit windows.
//!
//! Every window belongs to one (client, route) pair. Clients that stop
//! calling would otherwise keep their entry forever, so the gate is swept
//! once per window length.

use std::sync::Arc;
use std::time::Instant;

use stock_core::rate_gate::RateGate;
use tokio_util::sync::CancellationToken;

/// Run the purge loop until `cancel` is triggered.
pub async fn run(gate: Arc<RateGate>, cancel: CancellationToken) {
    let period = gate.window();
    tracing::info!(interval_secs = period.as_secs(), "Rate window purge started");

    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately; nothing can have elapsed yet.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Rate window purge stopping");
                break;
            }
            _ = interval.tick() => {
                let removed = gate.purge_expired(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, remaining = gate.tracked_windows(), "Purged elapsed rate windows");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn purges_elapsed_windows_and_stops_on_cancel() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(20)));
        gate.admit("10.0.0.1", "GET /api/v1/products", 5);
        assert_eq!(gate.tracked_windows(), 1);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(Arc::clone(&gate), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(gate.tracked_windows(), 0);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("purge task should stop after cancel")
            .unwrap();
    }
}
