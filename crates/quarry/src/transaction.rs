//! Transactions.
//!
//! A [`Tx`] is a [`Session`]: every statement builder works the same on a
//! transaction as on a [`DB`](crate::DB), and statements built on it join
//! the transaction.
//!
//! # Example
//!
//! ```ignore
//! let tx = db.begin_tx().await?;
//! tx.update::<User>()
//!     .set([assign("age", c("age").add(1))])
//!     .where_([c("id").eq(1)])
//!     .exec()
//!     .await?;
//! tx.commit().await?;
//! ```

use crate::driver::{Driver, DriverTx};
use crate::error::{OrmError, OrmResult};
use crate::session::{Core, Session};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// An open transaction.
pub struct Tx {
    core: Core,
    inner: Arc<dyn DriverTx>,
}

impl Tx {
    pub(crate) fn new(core: Core, inner: Arc<dyn DriverTx>) -> Self {
        Self { core, inner }
    }

    pub async fn commit(&self) -> OrmResult<()> {
        self.inner.commit().await?;
        tracing::debug!(target: "quarry.tx", "commit");
        Ok(())
    }

    pub async fn rollback(&self) -> OrmResult<()> {
        self.inner.rollback().await?;
        tracing::debug!(target: "quarry.tx", "rollback");
        Ok(())
    }

    /// Roll back unless the transaction was already committed or rolled back.
    ///
    /// Meant for cleanup paths where the transaction may or may not have
    /// finished.
    pub async fn rollback_if_not_commit(&self) -> OrmResult<()> {
        match self.rollback().await {
            Err(OrmError::TxDone) => Ok(()),
            res => res,
        }
    }
}

impl Session for Tx {
    fn core(&self) -> &Core {
        &self.core
    }

    fn driver(&self) -> Arc<dyn Driver> {
        self.inner.clone()
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx").field("core", &self.core).finish_non_exhaustive()
    }
}

/// Drive `f` on `tx`, then commit or roll back by its outcome.
pub(crate) async fn run<F, R>(tx: Tx, f: F) -> OrmResult<R>
where
    F: for<'t> FnOnce(&'t Tx) -> BoxFuture<'t, OrmResult<R>>,
{
    let outcome = AssertUnwindSafe(async { f(&tx).await }).catch_unwind().await;
    let (err, panicked) = match outcome {
        Ok(Ok(value)) => {
            tx.commit().await?;
            return Ok(value);
        }
        Ok(Err(err)) => (err, false),
        Err(payload) => (OrmError::Panicked(panic_message(payload.as_ref())), true),
    };

    match tx.rollback().await {
        Ok(()) => Err(err),
        Err(rb) => {
            tracing::warn!(
                target: "quarry.tx",
                error = %err,
                rollback_error = %rb,
                panicked,
                "rollback failed"
            );
            Err(OrmError::rollback_failed(err, rb, panicked))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
