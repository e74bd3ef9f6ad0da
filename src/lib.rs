//! # Parkwise
//!
//! Vehicle-parking reservation backend: lots, spots, user accounts and
//! time-boxed reservations billed by elapsed duration.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business rules (reservation state machine, billing, clock)
//! - **application**: Use cases over the entity store (lifecycle, analytics)
//! - **infrastructure**: External concerns (database, migrations)
//! - **auth**: JWT authentication and password hashing
//! - **api**: REST API with Swagger documentation

pub mod api;
pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod support;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use api::create_api_router;
