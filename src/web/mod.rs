//! A small layer over axum that lets handlers and middleware return
//! [`AppError`] and wrap each other as plain functions.
//!
//! A [`Handler`] takes the request [`Context`] and the request and returns a
//! boxed future of `Result<Response, AppError>`. A [`Middleware`] turns one
//! handler into another. [`App`] registers routes, composes their middleware
//! and runs every request inside a `request` span carrying its trace id.

pub mod app;
pub mod context;
pub mod request;
pub mod shutdown;

use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use futures::future::BoxFuture;
use sales_core::AppError;

pub use app::App;
pub use context::{Context, RequestValues};
pub use request::{decode, param, query, respond, respond_empty};
pub use shutdown::Shutdown;

pub type HandlerResult = Result<Response, AppError>;

pub type Handler = Arc<dyn Fn(Context, Request) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Boxes an async function into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Context, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: Context, req: Request| -> BoxFuture<'static, HandlerResult> {
        Box::pin(f(ctx, req))
    })
}

/// Like [`handler`] but hands a clone of `state` to every call.
pub fn handler_with_state<S, F, Fut>(state: S, f: F) -> Handler
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Context, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: Context, req: Request| -> BoxFuture<'static, HandlerResult> {
        Box::pin(f(state.clone(), ctx, req))
    })
}

pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps `handler` so that `mws[0]` runs first and `mws[last]` runs right
/// before the handler.
pub fn wrap_middleware(mws: &[Middleware], handler: Handler) -> Handler {
    mws.iter().rev().fold(handler, |next, mw| mw(next))
}
