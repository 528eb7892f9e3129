use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use sales_core::AppError;

use crate::metrics::Metrics;
use crate::web::{Handler, Middleware, handler, middleware};

thread_local! {
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

/// Captures a backtrace at the panic site so [`panics`] can report where the
/// panic happened. Call once at startup; the previous hook still runs.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
        previous(info);
    }));
}

/// The hook runs on the panicking thread, which is the thread that polls
/// `catch_unwind`.
fn take_panic_trace() -> Option<Backtrace> {
    PANIC_TRACE.with(|slot| slot.borrow_mut().take())
}

/// Recovers from a panic anywhere inside it and reports it as an internal
/// error. The unwound future is dropped, which rolls back any open
/// transaction.
pub fn panics(metrics: Arc<Metrics>) -> Middleware {
    middleware(move |next: Handler| {
        let metrics = metrics.clone();
        handler(move |ctx, req| {
            let next = next.clone();
            let metrics = metrics.clone();
            async move {
                match AssertUnwindSafe(next(ctx, req)).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => {
                        metrics.record_panic();
                        let message = panic_message(payload.as_ref());
                        Err(AppError::internal(match take_panic_trace() {
                            Some(trace) => anyhow::anyhow!("PANIC [{}] TRACE[{}]", message, trace),
                            None => anyhow::anyhow!("PANIC [{}]", message),
                        }))
                    }
                }
            }
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{Context, respond};
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use sales_core::ErrorKind;

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let metrics = Arc::new(Metrics::default());
        let boom = handler(|_ctx, _req| async {
            if true {
                panic!("index out of range");
            }
            Ok(axum::response::Response::new(Body::empty()))
        });
        let chain = panics(metrics.clone())(boom);

        let err = chain(Context::default(), Request::new(Body::empty()))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.to_string().contains("PANIC [index out of range]"));
        assert_eq!(metrics.snapshot().panics, 1);
    }

    #[tokio::test]
    async fn test_passes_through_without_panic() {
        let metrics = Arc::new(Metrics::default());
        let ok = handler(|ctx, _req| async move { respond(&ctx, StatusCode::OK, &"fine") });
        let chain = panics(metrics.clone())(ok);

        let response = chain(Context::default(), Request::new(Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(metrics.snapshot().panics, 0);
    }

    #[inline(never)]
    fn explode() {
        panic!("deep failure");
    }

    #[tokio::test]
    async fn test_trace_points_at_panic_site() {
        install_panic_hook();
        let metrics = Arc::new(Metrics::default());
        let boom = handler(|_ctx, _req| async {
            explode();
            Ok(axum::response::Response::new(Body::empty()))
        });
        let chain = panics(metrics)(boom);

        let err = chain(Context::default(), Request::new(Body::empty()))
            .await
            .unwrap_err();

        let text = err.to_string();
        assert!(text.contains("PANIC [deep failure] TRACE["));
        assert!(text.contains("explode"));
        assert!(take_panic_trace().is_none());
    }

    #[test]
    fn test_panic_message_from_string() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("formatted 42"));
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");
    }
}
