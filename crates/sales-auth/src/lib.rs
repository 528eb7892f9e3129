//! # Sales Auth
//!
//! Authentication and authorization building blocks for the Sales API.
//!
//! - [`role`]: the closed [`Role`] vocabulary
//! - [`claims`]: the [`Claims`] carried in a signed token
//! - [`keys`]: [`KeyLookup`] and the [`KeyStore`] implementation
//! - [`rule`]: named authorization [`Rule`]s
//! - [`auth`]: [`Auth`], which signs tokens, verifies them and evaluates rules
//!
//! # Example
//!
//! ```ignore
//! use sales_auth::{Auth, KeyStore, Role, Rule};
//!
//! let keys = KeyStore::new().with_hmac("test-kid", b"secret");
//! let auth = Auth::new(Arc::new(keys), "service project", Duration::from_secs(3600));
//!
//! let claims = auth.new_claims(user_id, [Role::Admin]);
//! let token = auth.generate_token("test-kid", &claims)?;
//! let claims = auth.authenticate(&format!("Bearer {}", token))?;
//! auth.authorize(&claims, None, Rule::AdminOnly)?;
//! ```

pub mod auth;
pub mod claims;
pub mod error;
pub mod keys;
pub mod role;
pub mod rule;

pub use auth::Auth;
pub use claims::Claims;
pub use error::AuthError;
pub use keys::{KeyLookup, KeyStore};
pub use role::{Role, RoleError};
pub use rule::{Rule, UnknownRule};
