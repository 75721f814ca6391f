//! Database Models
//!
//! Row types for the trail progression schema and the saved pricing
//! snapshots. The trail tables are the authoritative state the
//! progression engine reads and writes; the mission log is append-only.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One 30-day block of the trail, ordered by `order_index`.
#[derive(Debug, Clone, FromRow)]
pub struct Stage {
    pub id: Uuid,
    /// Stable key, e.g. `iniciante_360`.
    pub key: String,
    pub name: String,
    /// Rank label shown on the user's profile ("Iniciante 360°", ...).
    pub patent: String,
    pub order_index: i32,
}

/// Mission catalog entry, unique per `(stage_order_index, day)`.
#[derive(Debug, Clone, FromRow)]
pub struct Mission {
    pub id: Uuid,
    pub stage_order_index: i32,
    pub day: i32,
    pub code: String,
    pub title: String,
    pub description: String,
}

/// Per-user progression record. One row per user, mutated exactly once
/// per successful daily completion.
#[derive(Debug, Clone, FromRow)]
pub struct UserTrailState {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stage_id: Uuid,
    /// Next uncompleted day within the current stage, 1..=30.
    pub current_mission_day: i32,
    pub current_streak_days: i32,
    /// Monotonic high-water mark of `current_streak_days`.
    pub max_streak_days: i32,
    pub total_missions_completed: i32,
    pub last_mission_completed_at: Option<DateTime<Utc>>,
    /// Civil date in America/Sao_Paulo of the latest completion; drives
    /// the once-per-day guard and the streak rules.
    pub last_mission_completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row, one per successful completion. Never
/// rewritten; display state is re-derived from `UserTrailState`.
#[derive(Debug, Clone, FromRow)]
pub struct MissionLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stage_id: Uuid,
    pub stage_order_index: i32,
    pub mission_day: i32,
    pub mission_code: String,
    pub mission_title: String,
    pub completed_at: DateTime<Utc>,
    pub completed_date: NaiveDate,
}

/// User-edited snapshot of a pricing calculation, persisted as a
/// personal catalog item. The engine output is never the source of
/// truth; this row is.
#[derive(Debug, Clone, FromRow)]
pub struct SavedProduct {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// "product" or "service".
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
