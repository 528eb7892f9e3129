//! Middleware for the request pipeline.
//!
//! App-wide, outermost first: [`crate::logging::logger`], [`errors`],
//! [`crate::metrics::metrics`], [`panics`].
//!
//! Per route, in registration order: [`authenticate`], [`authorize`],
//! [`execute_in_transaction`].
//!
//! # Example
//!
//! ```ignore
//! app.handle(
//!     MethodFilter::PUT,
//!     "v1",
//!     "/users/{user_id}",
//!     update_handler,
//!     &[
//!         authenticate(auth.clone()),
//!         authorize(auth.clone(), Rule::AdminOrSubject),
//!         execute_in_transaction(db.clone()),
//!     ],
//! );
//! ```

pub mod auth;
pub mod errors;
pub mod panics;
pub mod role;
pub mod transaction;

pub use auth::authenticate;
pub use errors::errors;
pub use panics::{install_panic_hook, panics};
pub use role::authorize;
pub use transaction::execute_in_transaction;
