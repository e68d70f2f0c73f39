//! One function per measurement, registered against the default Prometheus
//! registry. Call sites never touch a `prometheus::Counter` directly; each
//! metric hides behind a named `log_*` function so it can be renamed or
//! retyped without touching every call site.

use std::sync::LazyLock;

use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

static RECONCILER_TICKS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "reconciler_ticks_total",
        "Number of reconciler ticks, by reconciler name and outcome.",
        &["reconciler", "outcome"]
    )
    .expect("metric registration should not fail")
});

static RECONCILER_CLAIMED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "reconciler_rows_claimed_total",
        "Number of rows successfully claimed by a reconciler tick.",
        &["reconciler", "action"]
    )
    .expect("metric registration should not fail")
});

static CALLBACK_OUTCOMES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "callback_outcomes_total",
        "Terminal task callbacks, by callback name and outcome (applied|miss).",
        &["callback", "outcome"]
    )
    .expect("metric registration should not fail")
});

static TICK_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "reconciler_tick_duration_seconds",
        "Wall time of one reconciler tick.",
        &["reconciler"]
    )
    .expect("metric registration should not fail")
});

pub fn log_tick(reconciler: &str, successful_docs: u64, failed_docs: u64) {
    RECONCILER_TICKS
        .with_label_values(&[reconciler, "success"])
        .inc_by(successful_docs);
    RECONCILER_TICKS
        .with_label_values(&[reconciler, "failed"])
        .inc_by(failed_docs);
}

pub fn log_claimed(reconciler: &str, action: &str, count: u64) {
    if count > 0 {
        RECONCILER_CLAIMED
            .with_label_values(&[reconciler, action])
            .inc_by(count);
    }
}

pub fn log_callback_applied(callback: &str) {
    CALLBACK_OUTCOMES
        .with_label_values(&[callback, "applied"])
        .inc();
}

pub fn log_callback_miss(callback: &str) {
    CALLBACK_OUTCOMES
        .with_label_values(&[callback, "miss"])
        .inc();
}

pub fn time_tick(reconciler: &'static str) -> impl Drop {
    let timer = TICK_DURATION.with_label_values(&[reconciler]).start_timer();
    TickTimer(Some(timer))
}

struct TickTimer(Option<prometheus::HistogramTimer>);

impl Drop for TickTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.0.take() {
            timer.observe_duration();
        }
    }
}
