//! # Sales Core
//!
//! Core types, errors, and utilities for the Sales API.
//!
//! This crate provides the foundational types used throughout the service:
//!
//! - [`errors`]: The [`AppError`] taxonomy and its wire classification
//! - [`validate`]: Per-field validation failures ([`FieldErrors`])
//! - [`response`]: Success, page and error envelopes
//! - [`page`]: Page number / page size parsing
//! - [`order`]: `orderBy` parsing against an allow-list
//! - [`password`]: bcrypt password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use sales_core::{AppError, FieldErrors};
//!
//! // Expected failure with an explicit status
//! let err = AppError::not_found(anyhow::anyhow!("user not found"));
//!
//! // Validation failure on a single field
//! let err = AppError::fields(FieldErrors::single("email", "invalid email"));
//! ```

pub mod errors;
pub mod order;
pub mod page;
pub mod password;
pub mod response;
pub mod validate;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorKind};
pub use order::{Direction, OrderBy};
pub use page::Page;
pub use password::{TEST_BCRYPT_COST, hash_password_with_cost, verify_password};
pub use response::{ErrorDocument, PageDocument, Success};
pub use validate::FieldErrors;
