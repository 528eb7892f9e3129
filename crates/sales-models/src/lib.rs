//! # Sales Models
//!
//! Domain models for the Sales API.
//!
//! - [`email`]: the validated [`Email`] value type
//! - [`users`]: [`User`], [`NewUser`], [`UpdateUser`] and the database row
//! - [`filter`]: [`QueryFilter`] for the user list
//! - [`error`]: [`UserError`], the domain failures of the user core

pub mod email;
pub mod error;
pub mod filter;
pub mod users;

pub use email::{Email, EmailError};
pub use error::UserError;
pub use filter::QueryFilter;
pub use users::{NewUser, UpdateUser, User, UserRow};
