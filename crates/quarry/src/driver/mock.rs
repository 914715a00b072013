//! In-memory driver for unit tests: records every statement and replays canned rows.

use super::{Driver, DriverTx, ExecResult, Rows};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub(crate) struct MockState {
    pub(crate) log: Vec<(String, Vec<Value>)>,
    pub(crate) responses: VecDeque<OrmResult<Rows>>,
    pub(crate) commits: usize,
    pub(crate) rollbacks: usize,
    pub(crate) fail_rollback: bool,
}

#[derive(Clone, Default)]
pub(crate) struct MockDriver {
    pub(crate) state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back(Ok(Rows::new(columns, rows)));
    }

    pub(crate) fn push_error(&self, err: OrmError) {
        self.state.lock().unwrap().responses.push_back(Err(err));
    }

    pub(crate) fn fail_rollback(&self) {
        self.state.lock().unwrap().fail_rollback = true;
    }

    pub(crate) fn log(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().log.clone()
    }

    pub(crate) fn last_sql(&self) -> Option<String> {
        self.state.lock().unwrap().log.last().map(|(sql, _)| sql.clone())
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.state
            .lock()
            .unwrap()
            .log
            .push((sql.to_string(), args.to_vec()));
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        self.record(sql, args);
        self.state
            .lock()
            .unwrap()
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(Rows::default()))
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.record(sql, args);
        let id = self.state.lock().unwrap().log.len() as i64;
        Ok(ExecResult {
            rows_affected: 1,
            last_insert_id: Some(id),
        })
    }

    async fn begin(&self) -> OrmResult<Arc<dyn DriverTx>> {
        self.record("BEGIN", &[]);
        Ok(Arc::new(MockTx {
            driver: self.clone(),
            done: AtomicBool::new(false),
        }))
    }
}

pub(crate) struct MockTx {
    driver: MockDriver,
    done: AtomicBool,
}

#[async_trait]
impl Driver for MockTx {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Rows> {
        self.driver.query(sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.driver.execute(sql, args).await
    }

    async fn begin(&self) -> OrmResult<Arc<dyn DriverTx>> {
        Err(OrmError::driver("nested transactions are not supported"))
    }
}

#[async_trait]
impl DriverTx for MockTx {
    async fn commit(&self) -> OrmResult<()> {
        if self.done.swap(true, Ordering::SeqCst) {
            return Err(OrmError::TxDone);
        }
        self.driver.record("COMMIT", &[]);
        self.driver.state.lock().unwrap().commits += 1;
        Ok(())
    }

    async fn rollback(&self) -> OrmResult<()> {
        if self.driver.state.lock().unwrap().fail_rollback {
            return Err(OrmError::driver("rollback refused"));
        }
        if self.done.swap(true, Ordering::SeqCst) {
            return Err(OrmError::TxDone);
        }
        self.driver.record("ROLLBACK", &[]);
        self.driver.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}
