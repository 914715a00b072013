//! Query logging middleware.
//!
//! Logs every statement through `tracing` (target `quarry.sql`), or only the
//! slow ones once a threshold is configured. A custom log function replaces
//! the `tracing` event entirely.
//!
//! ```ignore
//! use quarry::middleware::querylog::{MiddlewareBuilder, QueryLogConfig};
//! use std::time::Duration;
//!
//! let log = MiddlewareBuilder::new()
//!     .config(QueryLogConfig::new().with_slow_query_threshold(Duration::from_millis(200)))
//!     .build();
//! let db = DB::open_with("sqlite3", driver, DbOptions::new().with_middlewares([log]))?;
//! ```

use super::{HandleFn, Middleware, QueryContext, QueryResult};
use crate::qb::Query;
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;

/// Custom sink for logged statements.
pub type LogFn = Arc<dyn Fn(&Query) + Send + Sync>;

/// What gets logged, and when.
#[derive(Debug, Clone)]
pub struct QueryLogConfig {
    /// Only log statements slower than this. `None` logs everything.
    pub slow_query_threshold: Option<Duration>,
    /// Event level for regular statements. Slow statements use `WARN`.
    pub level: Level,
    /// Truncate long SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Include bound arguments in the event.
    pub log_args: bool,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold: None,
            level: Level::DEBUG,
            max_sql_length: Some(1024),
            log_args: true,
        }
    }
}

impl QueryLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn log_args(mut self, enabled: bool) -> Self {
        self.log_args = enabled;
        self
    }
}

/// Builds the query-log [`Middleware`].
#[derive(Clone, Default)]
pub struct MiddlewareBuilder {
    config: QueryLogConfig,
    log_fn: Option<LogFn>,
}

impl MiddlewareBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: QueryLogConfig) -> Self {
        self.config = config;
        self
    }

    /// Send logged statements to `f` instead of `tracing`.
    pub fn with_log_fn(mut self, f: impl Fn(&Query) + Send + Sync + 'static) -> Self {
        self.log_fn = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Middleware {
        let logger = Arc::new(self);
        Arc::new(move |next: HandleFn| -> HandleFn {
            let logger = Arc::clone(&logger);
            Arc::new(move |qc: QueryContext| -> BoxFuture<'static, QueryResult> {
                let logger = Arc::clone(&logger);
                let next = Arc::clone(&next);
                Box::pin(async move {
                    // A statement that cannot be built never reaches the driver.
                    let query = qc.query()?.clone();
                    let kind = qc.kind;
                    let start = Instant::now();
                    let res = next(qc).await;
                    logger.record(kind.as_str(), &query, start.elapsed());
                    res
                })
            })
        })
    }

    fn record(&self, kind: &str, query: &Query, elapsed: Duration) {
        let slow = match self.config.slow_query_threshold {
            Some(threshold) if elapsed <= threshold => return,
            Some(_) => true,
            None => false,
        };
        if let Some(f) = &self.log_fn {
            f(query);
            return;
        }

        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let level = if slow { Level::WARN } else { self.config.level };
        let sql = self.truncate_sql(&query.sql);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if self.config.log_args {
            let args = tracing::field::debug(&query.args);
            emit_at_level!(level, target: "quarry.sql", kind, sql = %sql, args, elapsed_ms, slow, "query");
        } else {
            emit_at_level!(level, target: "quarry.sql", kind, sql = %sql, elapsed_ms, slow, "query");
        }
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.config.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

impl fmt::Debug for MiddlewareBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareBuilder")
            .field("config", &self.config)
            .field("log_fn", &self.log_fn.is_some())
            .finish()
    }
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
fn truncate_bytes(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
