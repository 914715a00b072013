//! Span-per-statement middleware.
//!
//! Every statement runs inside an `INFO` span (target `quarry.sql`) carrying
//! `component`, `table` and `sql`. The span's display name, `<KIND>-<table>`,
//! goes in `otel.name` so OpenTelemetry exporters pick it up. A statement that
//! fails to build records the error on its span before the chain continues.
//!
//! ```ignore
//! use quarry::middleware::tracing::MiddlewareBuilder;
//!
//! let spans = MiddlewareBuilder::new().build();
//! let db = DB::open_with("sqlite3", driver, DbOptions::new().with_middlewares([spans]))?;
//! ```

use super::{HandleFn, Middleware, QueryContext, QueryResult};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tracing::Instrument;
use tracing::field::{Empty, display};

/// Builds the tracing [`Middleware`].
#[derive(Debug, Clone)]
pub struct MiddlewareBuilder {
    component: &'static str,
}

impl Default for MiddlewareBuilder {
    fn default() -> Self {
        Self { component: "quarry" }
    }
}

impl MiddlewareBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the `component` attribute.
    pub fn component(mut self, component: &'static str) -> Self {
        self.component = component;
        self
    }

    pub fn build(self) -> Middleware {
        let component = self.component;
        Arc::new(move |next: HandleFn| -> HandleFn {
            Arc::new(move |qc: QueryContext| -> BoxFuture<'static, QueryResult> {
                let next = Arc::clone(&next);
                let table = qc
                    .model
                    .as_ref()
                    .map(|m| m.table_name.clone())
                    .unwrap_or_default();
                let name = format!("{}-{}", qc.kind, table);
                let span = tracing::info_span!(
                    target: "quarry.sql",
                    "query",
                    otel.name = %name,
                    component,
                    table = %table,
                    sql = Empty,
                    error = Empty,
                );
                match qc.query() {
                    Ok(query) => {
                        span.record("sql", query.sql.as_str());
                    }
                    Err(err) => {
                        span.record("error", display(&err));
                    }
                }
                Box::pin(next(qc).instrument(span))
            })
        })
    }
}
