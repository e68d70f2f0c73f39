//! Wraps a reconciler tick in a `tokio::time::interval` loop with
//! `backoff`-driven retry on *store connectivity* failures only — never on
//! claim misses or per-document failures, which a tick already swallows.
//! Grounded on `retry_failures` in `retriable_worker.rs`: successive
//! failures widen the backoff, a success resets it.

use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};

/// Runs `tick` every `period`, forever. `tick` should return `Err` only for
/// failures that should pause the whole reconciler (e.g. the store is
/// unreachable); per-item failures belong inside the tick's own report.
pub async fn run_forever<F, Fut>(name: &'static str, period: Duration, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let mut interval = tokio::time::interval(period);
    let mut backoff = new_backoff();

    loop {
        interval.tick().await;
        match tick().await {
            Ok(()) => {
                backoff.reset();
            },
            Err(e) => {
                errors::report_error(&e);
                let delay = backoff.next_backoff().unwrap_or(Duration::from_secs(60));
                tracing::error!(reconciler = name, error = %e, delay_ms = delay.as_millis() as u64, "reconciler tick failed, backing off");
                tokio::time::sleep(delay).await;
            },
        }
    }
}

fn new_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(500))
        .with_max_interval(Duration::from_secs(30))
        .with_max_elapsed_time(None)
        .build()
}
