//! Pricing Endpoint
//!
//! One endpoint for both calculator modes; the request body carries a
//! `type` tag ("product" | "service") that deserializes straight into
//! the engine's sum type. Strict field validation runs first, then the
//! pure computation. Nothing is persisted here; saving a snapshot is
//! the catalog endpoint's job.

use axum::{extract::State, Json};

use crate::services::pricing::{self, Quote, QuoteRequest};
use crate::{error::ApiError, AppState};

/// POST /pricing/quote
///
/// # Request
///
/// ```json
/// {
///   "type": "product",
///   "raw_material_unit": 5.0,
///   "packaging_unit": 2.0,
///   "fixed_costs": [{"label": "rent", "amount": 300.0}],
///   "volume": {"basis": "monthly_units", "estimated_units": 100},
///   "tax_percent": 12,
///   "margin_percent": 30
/// }
/// ```
pub async fn quote(
    State(_state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Quote>, ApiError> {
    pricing::validate(&request)?;
    let quote = pricing::quote(&request)?;

    tracing::debug!(
        mode = match &request {
            QuoteRequest::Product(_) => "product",
            QuoteRequest::Service(_) => "service",
        },
        "pricing quote computed"
    );

    Ok(Json(quote))
}
