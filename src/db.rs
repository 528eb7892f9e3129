//! An in-process [`Database`] for running the service without PostgreSQL.
//!
//! Pairs with [`crate::modules::users::MemoryUserRepository`]. Transactions
//! stage nothing; they only count how they ended.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sales_db::{Database, DbError, Transaction};

#[derive(Debug, Default)]
struct Outcomes {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    unavailable: AtomicBool,
    outcomes: Arc<Outcomes>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes status checks fail (or pass again), as if the database went away.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Relaxed);
    }

    pub fn commits(&self) -> usize {
        self.outcomes.commits.load(Ordering::Relaxed)
    }

    pub fn rollbacks(&self) -> usize {
        self.outcomes.rollbacks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Arc<dyn Transaction>, DbError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        Ok(Arc::new(MemoryTransaction {
            closed: AtomicBool::new(false),
            outcomes: self.outcomes.clone(),
        }))
    }

    async fn status_check(&self) -> Result<(), DbError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

struct MemoryTransaction {
    closed: AtomicBool,
    outcomes: Arc<Outcomes>,
}

impl MemoryTransaction {
    fn close(&self) -> Result<(), DbError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(DbError::TransactionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(&self) -> Result<(), DbError> {
        self.close()?;
        self.outcomes.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        self.close()?;
        self.outcomes.rollbacks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
