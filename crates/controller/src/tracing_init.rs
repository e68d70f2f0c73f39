//! Structured logging setup, following `cmd_util::env::config_service`:
//! stdout, compact formatting, `RUST_LOG`-driven filter defaulting to INFO.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).compact().init();
}
