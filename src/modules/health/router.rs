use axum::routing::MethodFilter;

use crate::web::{App, handler_with_state};

use super::controller::{self, HealthHandlers};

/// Readiness and liveness are registered without middleware.
pub fn init_health_routes(app: &mut App, version: &str, handlers: HealthHandlers) {
    app.handle_without_middleware(
        MethodFilter::GET,
        version,
        "/readiness",
        handler_with_state(handlers.clone(), controller::readiness),
    );
    app.handle_without_middleware(
        MethodFilter::GET,
        version,
        "/liveness",
        handler_with_state(handlers, controller::liveness),
    );
}
