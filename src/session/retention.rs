use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::SessionManager;

/// Sweep interval used when the TTL is long; shorter TTLs sweep at half their length.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Interval between sweeps for a given TTL.
pub fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 2).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL)
}

/// Run the retention loop until `cancel` fires.
pub async fn run(manager: SessionManager, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        ttl_secs = manager.settings().ttl.as_secs(),
        interval_secs = interval.as_secs(),
        "session retention started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("session retention stopping");
                break;
            }
            _ = ticker.tick() => {
                let m = manager.clone();
                match tokio::task::spawn_blocking(move || m.evict_expired()).await {
                    Ok(0) => tracing::debug!("retention: nothing to evict"),
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "retention sweep panicked"),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/retention.rs"]
mod tests;
