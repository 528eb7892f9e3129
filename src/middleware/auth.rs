use std::sync::Arc;

use axum::http::header;
use sales_auth::Auth;
use sales_core::AppError;
use tracing::debug;

use crate::web::{Handler, Middleware, handler, middleware};

/// Verifies the bearer token and places its claims in the context.
///
/// Every failure is an authentication error; the cause is logged by the
/// error middleware and never returned to the client.
pub fn authenticate(auth: Arc<Auth>) -> Middleware {
    middleware(move |next: Handler| {
        let auth = auth.clone();
        handler(move |mut ctx, req| {
            let auth = auth.clone();
            let next = next.clone();
            async move {
                let bearer = req
                    .headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| {
                        AppError::unauthorized(anyhow::anyhow!(
                            "expected authorization header format: Bearer <token>"
                        ))
                    })?;

                let claims = auth
                    .authenticate(bearer)
                    .map_err(|e| AppError::unauthorized(anyhow::anyhow!("authenticate: {}", e)))?;

                debug!(sub = %claims.sub, "request authenticated");
                ctx.claims = Some(claims);
                next(ctx, req).await
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{Context, respond};
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use sales_auth::{KeyStore, Role};
    use std::time::Duration;
    use uuid::Uuid;

    const KID: &str = "test-kid";

    fn auth() -> Arc<Auth> {
        let keys = KeyStore::new().with_hmac(KID, b"middleware-test-secret");
        Arc::new(Auth::new(Arc::new(keys), "service project", Duration::from_secs(60)))
    }

    fn echo_sub() -> Handler {
        handler(|ctx, _req| async move {
            let sub = ctx.claims()?.sub.clone();
            respond(&ctx, StatusCode::OK, &sub)
        })
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/v1/users");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_sets_claims() {
        let auth = auth();
        let id = Uuid::new_v4();
        let token = auth
            .generate_token(KID, &auth.new_claims(id, [Role::User]))
            .unwrap();

        let chain = authenticate(auth)(echo_sub());
        let response = chain(Context::default(), request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let chain = authenticate(auth())(echo_sub());
        let err = chain(Context::default(), request(None)).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let chain = authenticate(auth())(echo_sub());
        let err = chain(Context::default(), request(Some("Bearer not.a.token")))
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.classify().1.error, "Unauthorized");
    }
}
