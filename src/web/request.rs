//! Reading requests and writing responses.

use std::collections::HashMap;

use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::{Query, Request};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sales_core::{AppError, FieldErrors};
use validator::Validate;

use super::context::Context;

/// Upper bound on request bodies read by [`decode`].
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Returns a path parameter captured by the route, e.g. `user_id` for
/// `/users/{user_id}`.
pub fn param<'a>(ctx: &'a Context, name: &str) -> Option<&'a str> {
    ctx.values.params.get(name).map(String::as_str)
}

/// The query string as key/value pairs. A malformed query yields no pairs.
pub fn query(req: &Request) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default()
}

/// Reads the JSON body into `T` and validates it.
///
/// Malformed JSON (including unknown fields on types that deny them) is a
/// 400 with the decoder's message; validation failures are field errors.
pub async fn decode<T>(req: Request) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("unable to read payload: {}", e)))?;

    let value: T = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("unable to decode payload: {}", e)))?;

    value
        .validate()
        .map_err(|e| AppError::fields(FieldErrors::from(e)))?;

    Ok(value)
}

/// Serializes `data` as the JSON body and records `status` on the request.
pub fn respond<T>(ctx: &Context, status: StatusCode, data: &T) -> Result<Response, AppError>
where
    T: Serialize + ?Sized,
{
    ctx.values.set_status(status);

    if status == StatusCode::NO_CONTENT {
        return Ok(status.into_response());
    }

    let body = serde_json::to_vec(data)?;
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?;
    Ok(response)
}

/// A body-less response, e.g. 204.
pub fn respond_empty(ctx: &Context, status: StatusCode) -> Result<Response, AppError> {
    ctx.values.set_status(status);
    Ok(status.into_response())
}

/// Shorthand used where a value has already been classified.
pub(crate) fn json_response<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(data)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::context::RequestValues;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(deny_unknown_fields)]
    struct Payload {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .uri("/users?page=2&page_size=5")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_decode_ok() {
        let payload: Payload = decode(json_request(r#"{"name":"Bill"}"#)).await.unwrap();
        assert_eq!(payload.name, "Bill");
    }

    #[tokio::test]
    async fn test_decode_rejects_unknown_fields() {
        let err = decode::<Payload>(json_request(r#"{"name":"Bill","admin":true}"#))
            .await
            .unwrap_err();
        let (status, doc) = err.classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(doc.error.contains("unknown field"));
    }

    #[tokio::test]
    async fn test_decode_validation_is_field_error() {
        let err = decode::<Payload>(json_request(r#"{"name":""}"#))
            .await
            .unwrap_err();
        assert_eq!(err.field_errors().unwrap().get("name"), Some("name is required"));
    }

    #[test]
    fn test_query_pairs() {
        let q = query(&json_request(""));
        assert_eq!(q.get("page").map(String::as_str), Some("2"));
        assert_eq!(q.get("page_size").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_param() {
        let values = RequestValues::new(HashMap::from([(
            "user_id".to_string(),
            "abc".to_string(),
        )]));
        let ctx = Context::new(Arc::new(values));
        assert_eq!(param(&ctx, "user_id"), Some("abc"));
        assert_eq!(param(&ctx, "other"), None);
    }

    #[test]
    fn test_respond_records_status() {
        let ctx = Context::default();
        let response = respond(&ctx, StatusCode::CREATED, &serde_json::json!({"ok": true})).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(ctx.values.status(), Some(StatusCode::CREATED));

        let response = respond_empty(&ctx, StatusCode::NO_CONTENT).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(ctx.values.status(), Some(StatusCode::NO_CONTENT));
    }
}
