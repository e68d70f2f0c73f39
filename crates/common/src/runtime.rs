use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Injectable clock + sleep: the reconciler host loops never call
/// `tokio::time::sleep` or `Utc::now()` directly, so tests can swap in a
/// deterministic runtime instead of actually waiting out backoff delays.
#[async_trait]
pub trait Runtime: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;

    async fn wait(&self, duration: Duration);
}

#[derive(Clone, Copy, Default)]
pub struct TokioRuntime;

#[async_trait]
impl Runtime for TokioRuntime {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
