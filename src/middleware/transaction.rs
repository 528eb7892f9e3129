use std::sync::Arc;

use sales_core::AppError;
use sales_db::Database;
use tracing::{debug, error};

use crate::web::{Handler, Middleware, handler, middleware};

/// Runs the inner chain inside one database transaction: commit on success,
/// rollback on error.
pub fn execute_in_transaction(db: Arc<dyn Database>) -> Middleware {
    middleware(move |next: Handler| {
        let db = db.clone();
        handler(move |mut ctx, req| {
            let db = db.clone();
            let next = next.clone();
            async move {
                let tx = db
                    .begin()
                    .await
                    .map_err(|e| AppError::internal(anyhow::anyhow!("begin transaction: {}", e)))?;
                ctx.tx = Some(tx.clone());
                debug!("transaction started");

                match next(ctx, req).await {
                    Ok(response) => {
                        tx.commit()
                            .await
                            .map_err(|e| AppError::internal(anyhow::anyhow!("commit transaction: {}", e)))?;
                        debug!("transaction committed");
                        Ok(response)
                    }
                    Err(err) => {
                        if let Err(e) = tx.rollback().await {
                            error!(error = %e, "rollback failed");
                        } else {
                            debug!("transaction rolled back");
                        }
                        Err(err)
                    }
                }
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::web::{Context, respond};
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_commit_on_success() {
        let db = Arc::new(MemoryDatabase::new());
        let inner = handler(|ctx, _req| async move {
            assert!(ctx.tx().is_some());
            respond(&ctx, StatusCode::OK, &"done")
        });
        let chain = execute_in_transaction(db.clone())(inner);

        chain(Context::default(), Request::new(Body::empty()))
            .await
            .unwrap();
        assert_eq!(db.commits(), 1);
        assert_eq!(db.rollbacks(), 0);
    }

    #[tokio::test]
    async fn test_rollback_on_error() {
        let db = Arc::new(MemoryDatabase::new());
        let inner = handler(|_ctx, _req| async {
            Err(AppError::conflict(anyhow::anyhow!("email is not unique")))
        });
        let chain = execute_in_transaction(db.clone())(inner);

        let err = chain(Context::default(), Request::new(Body::empty()))
            .await
            .unwrap_err();
        assert_eq!(err.classify().0, StatusCode::CONFLICT);
        assert_eq!(db.commits(), 0);
        assert_eq!(db.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_begin_failure_is_internal() {
        let db = Arc::new(MemoryDatabase::new());
        db.set_available(false);
        let inner = handler(|ctx, _req| async move { respond(&ctx, StatusCode::OK, &"unreachable") });
        let chain = execute_in_transaction(db)(inner);

        let err = chain(Context::default(), Request::new(Body::empty()))
            .await
            .unwrap_err();
        assert_eq!(err.classify().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
