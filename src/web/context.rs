use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Instant;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use sales_auth::Claims;
use sales_core::AppError;
use sales_db::Transaction;
use uuid::Uuid;

/// Values created when a request is routed and dropped once it is answered.
#[derive(Debug)]
pub struct RequestValues {
    pub trace_id: Uuid,
    pub now: DateTime<Utc>,
    pub started: Instant,
    pub params: HashMap<String, String>,
    status: AtomicU16,
}

impl RequestValues {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            now: Utc::now(),
            started: Instant::now(),
            params,
            status: AtomicU16::new(0),
        }
    }

    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::Relaxed);
    }

    /// The status written by the last respond call, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self.status.load(Ordering::Relaxed) {
            0 => None,
            code => StatusCode::from_u16(code).ok(),
        }
    }
}

impl Default for RequestValues {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

/// Request-scoped data threaded through every middleware and handler.
#[derive(Clone, Default)]
pub struct Context {
    pub values: Arc<RequestValues>,
    pub claims: Option<Claims>,
    /// The `user_id` path parameter once authorization has parsed it.
    pub subject_id: Option<Uuid>,
    pub tx: Option<Arc<dyn Transaction>>,
}

impl Context {
    pub fn new(values: Arc<RequestValues>) -> Self {
        Self {
            values,
            claims: None,
            subject_id: None,
            tx: None,
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.values.trace_id
    }

    /// Claims placed by the authenticate middleware.
    pub fn claims(&self) -> Result<&Claims, AppError> {
        self.claims
            .as_ref()
            .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("claims missing from context")))
    }

    pub fn tx(&self) -> Option<Arc<dyn Transaction>> {
        self.tx.clone()
    }
}
