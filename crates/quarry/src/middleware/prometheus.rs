//! Prometheus latency middleware.
//!
//! Observes every statement's elapsed time, in seconds, into a histogram
//! labelled by statement `type` (`SELECT`, `INSERT`, ...) and `table`.
//! Statements without a model, such as raw queries, use an empty `table`.
//!
//! ```ignore
//! use quarry::middleware::prometheus::MiddlewareBuilder;
//!
//! let registry = prometheus::Registry::new();
//! let metrics = MiddlewareBuilder::new("query_duration_seconds", "Statement latency")
//!     .namespace("app")
//!     .build()?;
//! metrics.register(&registry)?;
//! let db = DB::open_with("mysql", driver, DbOptions::new().with_middlewares([metrics.middleware()]))?;
//! ```

use super::{HandleFn, Middleware, QueryContext, QueryKind, QueryResult};
use crate::error::OrmResult;
use futures_util::future::BoxFuture;
use prometheus::{HistogramOpts, HistogramVec, Registry};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

const LABELS: [&str; 2] = ["type", "table"];

/// Describes the histogram the middleware observes into.
#[derive(Debug, Clone)]
pub struct MiddlewareBuilder {
    name: String,
    help: String,
    namespace: String,
    subsystem: String,
    const_labels: HashMap<String, String>,
    buckets: Option<Vec<f64>>,
}

impl MiddlewareBuilder {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            namespace: String::new(),
            subsystem: String::new(),
            const_labels: HashMap::new(),
            buckets: None,
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// Attach a label with the same value on every series.
    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }

    /// Bucket upper bounds in seconds. Defaults to the prometheus defaults.
    pub fn buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = Some(buckets);
        self
    }

    /// Create the histogram. Fails on an invalid name or label set.
    pub fn build(self) -> OrmResult<QueryMetrics> {
        let mut opts = HistogramOpts::new(self.name, self.help)
            .namespace(self.namespace)
            .subsystem(self.subsystem)
            .const_labels(self.const_labels);
        if let Some(buckets) = self.buckets {
            opts = opts.buckets(buckets);
        }
        let histogram = HistogramVec::new(opts, &LABELS)?;
        Ok(QueryMetrics { histogram })
    }
}

/// Statement latency histogram. Cheap to clone; clones share the series.
#[derive(Clone)]
pub struct QueryMetrics {
    histogram: HistogramVec,
}

impl QueryMetrics {
    /// Register the histogram with `registry`.
    pub fn register(&self, registry: &Registry) -> OrmResult<()> {
        registry.register(Box::new(self.histogram.clone()))?;
        Ok(())
    }

    pub fn histogram(&self) -> &HistogramVec {
        &self.histogram
    }

    /// Number of observed statements of `kind` against `table`.
    pub fn sample_count(&self, kind: QueryKind, table: &str) -> u64 {
        self.histogram
            .with_label_values(&[kind.as_str(), table])
            .get_sample_count()
    }

    /// Middleware observing into this histogram. Failed statements count too.
    pub fn middleware(&self) -> Middleware {
        let histogram = self.histogram.clone();
        Arc::new(move |next: HandleFn| -> HandleFn {
            let histogram = histogram.clone();
            Arc::new(move |qc: QueryContext| -> BoxFuture<'static, QueryResult> {
                let histogram = histogram.clone();
                let next = Arc::clone(&next);
                Box::pin(async move {
                    let kind = qc.kind;
                    let table = qc
                        .model
                        .as_ref()
                        .map(|m| m.table_name.clone())
                        .unwrap_or_default();
                    let start = Instant::now();
                    let res = next(qc).await;
                    histogram
                        .with_label_values(&[kind.as_str(), table.as_str()])
                        .observe(start.elapsed().as_secs_f64());
                    res
                })
            })
        })
    }
}

impl fmt::Debug for QueryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryMetrics").finish_non_exhaustive()
    }
}
