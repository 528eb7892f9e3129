//! Transaction handles shared between the transaction middleware and the
//! repositories.
//!
//! The middleware only sees the [`Database`] and [`Transaction`] traits, so
//! tests can swap in an in-memory store. Repositories backed by Postgres
//! downcast the handle to [`PgTransaction`] through [`Conn::acquire`].

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::DbError;
use crate::pool;

#[async_trait]
pub trait Transaction: Send + Sync {
    async fn commit(&self) -> Result<(), DbError>;
    async fn rollback(&self) -> Result<(), DbError>;
    fn as_any(&self) -> &dyn Any;
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Arc<dyn Transaction>, DbError>;
    async fn status_check(&self) -> Result<(), DbError>;
}

#[derive(Clone, Debug)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Arc<dyn Transaction>, DbError> {
        let tx = self.pool.begin().await?;
        Ok(Arc::new(PgTransaction::new(tx)))
    }

    async fn status_check(&self) -> Result<(), DbError> {
        pool::status_check(&self.pool).await
    }
}

type PgTx = sqlx::Transaction<'static, Postgres>;

/// A Postgres transaction owned by one request.
///
/// Dropping it without a commit rolls the transaction back.
pub struct PgTransaction {
    inner: Mutex<Option<PgTx>>,
}

impl PgTransaction {
    pub fn new(tx: PgTx) -> Self {
        Self {
            inner: Mutex::new(Some(tx)),
        }
    }

    async fn take(&self) -> Result<PgTx, DbError> {
        self.inner
            .lock()
            .await
            .take()
            .ok_or(DbError::TransactionClosed)
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(&self) -> Result<(), DbError> {
        self.take().await?.commit().await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        self.take().await?.rollback().await?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A connection to run one query on.
pub enum Conn<'a> {
    Pool(PoolConnection<Postgres>),
    Tx(MutexGuard<'a, Option<PgTx>>),
}

impl<'a> Conn<'a> {
    /// Uses the request's transaction when it is a [`PgTransaction`],
    /// otherwise checks a connection out of the pool.
    pub async fn acquire(pool: &PgPool, tx: Option<&'a dyn Transaction>) -> Result<Self, DbError> {
        if let Some(pg) = tx.and_then(|tx| tx.as_any().downcast_ref::<PgTransaction>()) {
            return Ok(Conn::Tx(pg.inner.lock().await));
        }
        Ok(Conn::Pool(pool.acquire().await?))
    }

    pub fn get(&mut self) -> Result<&mut PgConnection, DbError> {
        match self {
            Conn::Pool(conn) => Ok(&mut **conn),
            Conn::Tx(guard) => Option::as_mut(&mut **guard)
                .map(|tx| &mut **tx)
                .ok_or(DbError::TransactionClosed),
        }
    }
}
