//! Readiness and liveness probes.

pub mod controller;
pub mod router;

pub use controller::HealthHandlers;
pub use router::init_health_routes;
