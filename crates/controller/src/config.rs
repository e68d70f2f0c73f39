//! CLI/env configuration, following `backend_harness::Args`'s
//! `clap::Parser` derive-with-env-fallback pattern.

use std::{collections::BTreeSet, time::Duration};

use clap::Parser;
use common::IndexType;

#[derive(Parser, Debug)]
#[command(name = "document-index-controller", about = "Reconciles document-index, collection-summary, and collection GC state against a Postgres store.")]
pub struct Args {
    /// Postgres host.
    #[clap(long, env = "PGHOST", default_value = "localhost")]
    pub pg_host: String,

    /// Postgres port.
    #[clap(long, env = "PGPORT", default_value_t = 5432)]
    pub pg_port: u16,

    /// Postgres user.
    #[clap(long, env = "PGUSER", default_value = "postgres")]
    pub pg_user: String,

    /// Postgres password.
    #[clap(long, env = "PGPASSWORD", default_value = "")]
    pub pg_password: String,

    /// Postgres database name.
    #[clap(long, env = "PGDATABASE", default_value = "document_index")]
    pub pg_dbname: String,

    /// Interval between document-index reconciler ticks, in milliseconds.
    #[clap(long, env = "DOCUMENT_INDEX_TICK_MS", default_value_t = 2_000)]
    pub document_index_tick_ms: u64,

    /// Interval between collection-summary reconciler ticks, in milliseconds.
    #[clap(long, env = "SUMMARY_TICK_MS", default_value_t = 5_000)]
    pub summary_tick_ms: u64,

    /// Interval between collection GC sweeps, in milliseconds.
    #[clap(long, env = "COLLECTION_GC_TICK_MS", default_value_t = 60_000)]
    pub collection_gc_tick_ms: u64,

    /// Prometheus metrics listen address, e.g. "0.0.0.0:9090". Unset disables the endpoint.
    #[clap(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<String>,

    /// Index types this deployment has enabled (`spec.md` §6), comma-separated.
    /// The C8 aggregator only folds rows of these types into a document's
    /// overall status; an operator disabling a type stops it from affecting
    /// documents that still happen to carry a stale row for it.
    #[clap(
        long,
        env = "ENABLED_INDEX_TYPES",
        value_delimiter = ',',
        default_value = "VECTOR,FULLTEXT,GRAPH,SUMMARY,VISION"
    )]
    pub enabled_index_types: Vec<IndexType>,
}

impl Args {
    pub fn enabled_index_types(&self) -> BTreeSet<IndexType> {
        self.enabled_index_types.iter().copied().collect()
    }

    pub fn document_index_tick(&self) -> Duration {
        Duration::from_millis(self.document_index_tick_ms)
    }

    pub fn summary_tick(&self) -> Duration {
        Duration::from_millis(self.summary_tick_ms)
    }

    pub fn collection_gc_tick(&self) -> Duration {
        Duration::from_millis(self.collection_gc_tick_ms)
    }

    pub fn deadpool_config(&self) -> deadpool_postgres::Config {
        let mut cfg = deadpool_postgres::Config::new();
        cfg.host = Some(self.pg_host.clone());
        cfg.port = Some(self.pg_port);
        cfg.user = Some(self.pg_user.clone());
        cfg.password = Some(self.pg_password.clone());
        cfg.dbname = Some(self.pg_dbname.clone());
        cfg
    }
}
