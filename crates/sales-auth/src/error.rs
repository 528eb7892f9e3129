use thiserror::Error;

use crate::rule::Rule;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("expected authorization header format: Bearer <token>")]
    ExpectedBearer,

    #[error("token header is missing the kid")]
    MissingKid,

    #[error("no key found for kid {0:?}")]
    KeyNotFound(String),

    #[error("key {kid:?} cannot {usage}")]
    KeyUsage { kid: String, usage: &'static str },

    #[error("invalid key material in {path}: {reason}")]
    InvalidKey { path: String, reason: String },

    #[error("token was issued in the future")]
    IssuedInFuture,

    #[error("token validation failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("claims do not satisfy rule {rule}")]
    Forbidden { rule: Rule },

    #[error("reading keys: {0}")]
    Io(#[from] std::io::Error),
}
