use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request};
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter, on};
use sales_core::AppError;
use tracing::{Instrument, error, info_span};

use super::context::{Context, RequestValues};
use super::request::json_response;
use super::shutdown::Shutdown;
use super::{Handler, Middleware, wrap_middleware};

/// Entry point for every route of the service.
///
/// App-wide middleware wraps every route registered with [`App::handle`];
/// routes registered with [`App::handle_without_middleware`] only get
/// dispatch (trace id, span and shutdown detection).
pub struct App {
    shutdown: Shutdown,
    mws: Vec<Middleware>,
    routes: HashMap<String, MethodRouter>,
}

impl App {
    pub fn new(shutdown: Shutdown, mws: Vec<Middleware>) -> Self {
        Self {
            shutdown,
            mws,
            routes: HashMap::new(),
        }
    }

    /// Registers `handler` at `/{version}{path}`. Route middleware runs
    /// inside the app-wide middleware.
    pub fn handle(
        &mut self,
        method: MethodFilter,
        version: &str,
        path: &str,
        handler: Handler,
        route_mws: &[Middleware],
    ) {
        let handler = wrap_middleware(route_mws, handler);
        let handler = wrap_middleware(&self.mws, handler);
        self.add(method, version, path, handler);
    }

    pub fn handle_without_middleware(
        &mut self,
        method: MethodFilter,
        version: &str,
        path: &str,
        handler: Handler,
    ) {
        self.add(method, version, path, handler);
    }

    fn add(&mut self, method: MethodFilter, version: &str, path: &str, handler: Handler) {
        let full_path = if version.is_empty() {
            path.to_string()
        } else {
            format!("/{}{}", version, path)
        };

        let shutdown = self.shutdown.clone();
        let route = on(
            method,
            move |params: Result<RawPathParams, RawPathParamsRejection>, req: Request| {
                let handler = handler.clone();
                let shutdown = shutdown.clone();
                async move { dispatch(handler, shutdown, params, req).await }
            },
        );

        let merged = match self.routes.remove(&full_path) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        self.routes.insert(full_path, merged);
    }

    pub fn into_router(self) -> Router {
        self.routes
            .into_iter()
            .fold(Router::new(), |router, (path, route)| router.route(&path, route))
    }
}

async fn dispatch(
    handler: Handler,
    shutdown: Shutdown,
    params: Result<RawPathParams, RawPathParamsRejection>,
    req: Request,
) -> Response {
    let params = params
        .map(|p| {
            p.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let values = Arc::new(RequestValues::new(params));
    let span = info_span!("request", trace_id = %values.trace_id);
    let ctx = Context::new(values);

    match handler(ctx, req).instrument(span.clone()).await {
        Ok(response) => response,
        Err(err) => {
            let _enter = span.enter();
            if validate_shutdown(&err) {
                error!(error = %err, "error escaped the middleware chain");
                shutdown.signal(err.to_string());
            }
            let (status, document) = err.classify();
            json_response(status, document)
        }
    }
}

/// A client hanging up mid-response is not a reason to stop the service.
fn validate_shutdown(err: &AppError) -> bool {
    !err.error.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| matches!(e.kind(), io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset))
    })
}
