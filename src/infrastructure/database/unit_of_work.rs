//! Unit of Work Pattern Implementation
//!
//! Provides transactional boundaries for database operations.
//! Ensures all statements of an aggregate write succeed or fail together.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::shared::error::AppError;

/// Transaction context that wraps a SQLx transaction.
pub struct TransactionContext {
    tx: Transaction<'static, Postgres>,
}

impl TransactionContext {
    /// Create a new transaction context.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    /// Connection for executing statements inside the transaction.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Commit the transaction.
    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await.map_err(AppError::Database)
    }

    /// Rollback the transaction.
    pub async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await.map_err(AppError::Database)
    }

    /// Commit if `result` is `Ok`, otherwise roll back and return the
    /// original error.
    ///
    /// A failed rollback is logged; the caller still sees the error that
    /// caused it.
    pub async fn finish<T>(self, result: Result<T, AppError>) -> Result<T, AppError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rolling back transaction");
                if let Err(rollback_err) = self.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// PostgreSQL Unit of Work implementation.
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    /// Create a new Unit of Work instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a new transaction.
    pub async fn begin(&self) -> Result<TransactionContext, AppError> {
        let tx = self.pool.begin().await.map_err(AppError::Database)?;
        Ok(TransactionContext::new(tx))
    }
}
