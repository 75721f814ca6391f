//! Services Module
//!
//! Business logic lives here, behind the route handlers.
//!
//! # Services
//! - `pricing`: pure pricing engine (product and service modes)
//! - `trail`: trail progression engine over the `TrailStore` seam

pub mod pricing;
pub mod trail;

pub use pricing::{PricingError, Quote, QuoteRequest};
pub use trail::{TrailError, TrailService, TrailSnapshot};
