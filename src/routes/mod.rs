//! API Routes Module
//!
//! # Routes
//! - `/health` - deep health check
//! - `/pricing/quote` - pricing calculator (product | service)
//! - `/trail/*` - trail progression
//! - `/catalog/*` - saved pricing snapshots

pub mod catalog;
pub mod health;
pub mod pricing;
pub mod trail;
