use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::logging::logger;
use crate::metrics::metrics;
use crate::middleware::{errors, panics};
use crate::modules::health::{HealthHandlers, init_health_routes};
use crate::modules::users::{UserHandlers, init_users_routes};
use crate::state::AppState;
use crate::web::App;

pub const VERSION: &str = "v1";

pub fn init_router(state: AppState) -> Router {
    let mut app = App::new(
        state.shutdown.clone(),
        vec![
            logger(),
            errors(),
            metrics(state.metrics.clone()),
            panics(state.metrics.clone()),
        ],
    );

    init_health_routes(
        &mut app,
        VERSION,
        HealthHandlers {
            build: state.build.clone(),
            db: state.db.clone(),
        },
    );
    init_users_routes(
        &mut app,
        VERSION,
        UserHandlers::new(state.users.clone(), state.auth.clone()),
        state.auth.clone(),
        state.db.clone(),
    );

    app.into_router().layer(cors_layer(&state.allowed_origins))
}

/// A `*` entry allows any origin; credentials are only allowed with an
/// explicit origin list.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("kid"),
        ]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins).allow_credentials(true)
}
