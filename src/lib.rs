//! RendEx Backend API Library
//!
//! Backend for the RendEx small-business companion: the pricing
//! calculator and the 360-day trail with daily missions and streaks.
//!
//! ## Modules
//!
//! - `config`: environment configuration
//! - `error`: error types and HTTP mapping
//! - `routes`: HTTP endpoint handlers
//! - `services`: business logic (Pricing Engine, Trail Progression)
//! - `db`: PostgreSQL access and the `TrailStore` seam
//! - `types`: shared response types

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::Database;
pub use error::ApiError;
pub use services::TrailService;

/// Application-wide shared state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub trail: Arc<TrailService>,
    pub config: Arc<Config>,
}
