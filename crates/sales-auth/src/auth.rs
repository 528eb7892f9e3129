use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Header, Validation, decode, decode_header, encode};
use tracing::debug;
use uuid::Uuid;

use crate::claims::Claims;
use crate::error::AuthError;
use crate::keys::KeyLookup;
use crate::role::Role;
use crate::rule::Rule;

/// Signs and verifies tokens and evaluates authorization rules.
#[derive(Clone)]
pub struct Auth {
    keys: Arc<dyn KeyLookup>,
    issuer: String,
    ttl: Duration,
}

impl Auth {
    pub fn new(keys: Arc<dyn KeyLookup>, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn keys(&self) -> &dyn KeyLookup {
        self.keys.as_ref()
    }

    /// Claims for `user_id` issued now and expiring after the configured ttl.
    pub fn new_claims(&self, user_id: Uuid, roles: impl IntoIterator<Item = Role>) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn generate_token(&self, kid: &str, claims: &Claims) -> Result<String, AuthError> {
        let (key, algorithm) = self.keys.signing_key(kid)?;
        let mut header = Header::new(algorithm);
        header.kid = Some(kid.to_string());
        Ok(encode(&header, claims, &key)?)
    }

    /// Verifies an `Authorization` header value of the form `Bearer <token>`.
    pub fn authenticate(&self, bearer: &str) -> Result<Claims, AuthError> {
        let token = match bearer.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => return Err(AuthError::ExpectedBearer),
        };
        if token.is_empty() {
            return Err(AuthError::ExpectedBearer);
        }

        let header = decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKid)?;
        let (key, algorithm) = self.keys.verifying_key(&kid)?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &key, &validation)?.claims;
        if claims.iat > Utc::now().timestamp() {
            return Err(AuthError::IssuedInFuture);
        }

        debug!(sub = %claims.sub, kid = %kid, "token verified");
        Ok(claims)
    }

    pub fn authorize(
        &self,
        claims: &Claims,
        target: Option<Uuid>,
        rule: Rule,
    ) -> Result<(), AuthError> {
        if rule.evaluate(claims, target) {
            Ok(())
        } else {
            Err(AuthError::Forbidden { rule })
        }
    }
}
