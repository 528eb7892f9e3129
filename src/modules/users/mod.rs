//! User management: create, login, read, list, update and delete.
//!
//! - `controller.rs`: handlers, one per route
//! - `service.rs`: business rules ([`UserService`])
//! - `repository.rs`: the [`UserRepository`] seam and its PostgreSQL store
//! - `memory.rs`: an in-process store
//! - `model.rs`: request and response documents
//! - `router.rs`: route registration

pub mod controller;
pub mod memory;
pub mod model;
pub mod repository;
pub mod router;
pub mod service;

pub use controller::UserHandlers;
pub use memory::MemoryUserRepository;
pub use repository::{PgUserRepository, UserRepository};
pub use router::init_users_routes;
pub use service::UserService;
