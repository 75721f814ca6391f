//! Personal Catalog Endpoints
//!
//! Persists a user-edited snapshot of a pricing computation. The engine
//! output is advisory; what the user chose to charge is what gets
//! stored, and it is the only pricing data the application treats as a
//! source of truth.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::SavedProduct;
use crate::types::ApiResponse;
use crate::{error::ApiError, AppState};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct SaveProductRequest {
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// "product" or "service".
    pub kind: ProductKind,
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default)]
    pub fixed_cost_monthly: f64,
    #[serde(default)]
    pub estimated_units_per_month: Option<f64>,
    #[serde(default)]
    pub tax_percent: f64,
    #[serde(default)]
    pub desired_margin_percent: f64,
    pub suggested_min_price: f64,
    pub suggested_ideal_price: f64,
    /// The price the user actually chose to charge.
    pub selling_price: f64,
    #[serde(default)]
    pub time_minutes: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Product,
    Service,
}

impl ProductKind {
    fn as_str(self) -> &'static str {
        match self {
            ProductKind::Product => "product",
            ProductKind::Service => "service",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SavedProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub cost_per_unit: f64,
    pub fixed_cost_monthly: f64,
    pub estimated_units_per_month: Option<f64>,
    pub tax_percent: f64,
    pub desired_margin_percent: f64,
    pub suggested_min_price: f64,
    pub suggested_ideal_price: f64,
    pub selling_price: f64,
    pub time_minutes: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<SavedProduct> for SavedProductResponse {
    fn from(row: SavedProduct) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            kind: row.kind,
            cost_per_unit: row.cost_per_unit,
            fixed_cost_monthly: row.fixed_cost_monthly,
            estimated_units_per_month: row.estimated_units_per_month,
            tax_percent: row.tax_percent,
            desired_margin_percent: row.desired_margin_percent,
            suggested_min_price: row.suggested_min_price,
            suggested_ideal_price: row.suggested_ideal_price,
            selling_price: row.selling_price,
            time_minutes: row.time_minutes,
            created_at: row.created_at,
        }
    }
}

// ============ Handlers ============

/// POST /catalog/products
pub async fn save_product(
    State(state): State<AppState>,
    Json(req): Json<SaveProductRequest>,
) -> Result<Json<ApiResponse<SavedProductResponse>>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "name: product name is required".to_string(),
        ));
    }
    if req.selling_price <= 0.0 {
        return Err(ApiError::ValidationError(
            "selling_price: selling price must be greater than zero".to_string(),
        ));
    }

    let row = SavedProduct {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        name: req.name.trim().to_string(),
        description: req.description,
        kind: req.kind.as_str().to_string(),
        cost_per_unit: req.cost_per_unit,
        fixed_cost_monthly: req.fixed_cost_monthly,
        estimated_units_per_month: req.estimated_units_per_month,
        tax_percent: req.tax_percent,
        desired_margin_percent: req.desired_margin_percent,
        suggested_min_price: req.suggested_min_price,
        suggested_ideal_price: req.suggested_ideal_price,
        selling_price: req.selling_price,
        time_minutes: req.time_minutes,
        created_at: Utc::now(),
    };

    state.db.insert_saved_product(&row).await?;
    tracing::info!(user_id = %row.user_id, product = %row.name, "pricing snapshot saved");

    Ok(Json(ApiResponse::success(row.into())))
}

/// GET /catalog/:user_id/products
pub async fn list_products(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<SavedProductResponse>>, ApiError> {
    let products = state.db.list_saved_products(user_id).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}
