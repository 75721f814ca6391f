//! Database Module
//!
//! All PostgreSQL access lives here: the connection pool, migrations,
//! the `TrailStore` implementation the progression engine runs on, and
//! the saved-pricing-snapshot queries.
//!
//! The trail update is a single-row `UPDATE ... WHERE user_id = $1`, so
//! the row-level atomicity the progression engine relies on comes from
//! PostgreSQL itself; no optimistic locking is layered on top. The
//! worst case for a same-user double submit is one duplicated audit row
//! and a double-counted total, never a corrupted stage/day pointer.

mod models;
pub mod repository;

use anyhow::Result;
use async_trait::async_trait;
pub use models::*;
pub use repository::TrailStore;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

/// Connection pool plus every query the application runs.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects with a small pool: max 10, min 1, 3s acquire timeout.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ============ Saved Pricing Snapshots ============

    pub async fn insert_saved_product(&self, product: &SavedProduct) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_products (
                id, user_id, name, description, kind,
                cost_per_unit, fixed_cost_monthly, estimated_units_per_month,
                tax_percent, desired_margin_percent,
                suggested_min_price, suggested_ideal_price, selling_price,
                time_minutes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(product.id)
        .bind(product.user_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.kind)
        .bind(product.cost_per_unit)
        .bind(product.fixed_cost_monthly)
        .bind(product.estimated_units_per_month)
        .bind(product.tax_percent)
        .bind(product.desired_margin_percent)
        .bind(product.suggested_min_price)
        .bind(product.suggested_ideal_price)
        .bind(product.selling_price)
        .bind(product.time_minutes)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_saved_products(&self, user_id: Uuid) -> Result<Vec<SavedProduct>> {
        let products = sqlx::query_as::<_, SavedProduct>(
            r#"
            SELECT
                id, user_id, name, description, kind,
                cost_per_unit, fixed_cost_monthly, estimated_units_per_month,
                tax_percent, desired_margin_percent,
                suggested_min_price, suggested_ideal_price, selling_price,
                time_minutes, created_at
            FROM user_products
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

// ============ TrailStore ============

#[async_trait]
impl TrailStore for Database {
    async fn first_stage(&self) -> Result<Option<Stage>> {
        self.stage_by_order(1).await
    }

    async fn stage_by_id(&self, id: Uuid) -> Result<Option<Stage>> {
        let stage = sqlx::query_as::<_, Stage>(
            "SELECT id, key, name, patent, order_index FROM stages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stage)
    }

    async fn stage_by_order(&self, order_index: i32) -> Result<Option<Stage>> {
        let stage = sqlx::query_as::<_, Stage>(
            "SELECT id, key, name, patent, order_index FROM stages WHERE order_index = $1",
        )
        .bind(order_index)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stage)
    }

    async fn mission(&self, stage_order_index: i32, day: i32) -> Result<Option<Mission>> {
        let mission = sqlx::query_as::<_, Mission>(
            r#"
            SELECT id, stage_order_index, day, code, title, description
            FROM trail_missions
            WHERE stage_order_index = $1 AND day = $2
            "#,
        )
        .bind(stage_order_index)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mission)
    }

    async fn progression(&self, user_id: Uuid) -> Result<Option<UserTrailState>> {
        let state = sqlx::query_as::<_, UserTrailState>(
            r#"
            SELECT
                id, user_id, stage_id, current_mission_day,
                current_streak_days, max_streak_days, total_missions_completed,
                last_mission_completed_at, last_mission_completed_date,
                created_at, updated_at
            FROM trail_user_state
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    async fn insert_progression(&self, state: &UserTrailState) -> Result<()> {
        // DO NOTHING makes a double-initialization race benign: the
        // unique constraint on user_id keeps exactly one row.
        sqlx::query(
            r#"
            INSERT INTO trail_user_state (
                id, user_id, stage_id, current_mission_day,
                current_streak_days, max_streak_days, total_missions_completed,
                last_mission_completed_at, last_mission_completed_date,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(state.id)
        .bind(state.user_id)
        .bind(state.stage_id)
        .bind(state.current_mission_day)
        .bind(state.current_streak_days)
        .bind(state.max_streak_days)
        .bind(state.total_missions_completed)
        .bind(state.last_mission_completed_at)
        .bind(state.last_mission_completed_date)
        .bind(state.created_at)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_progression(&self, state: &UserTrailState) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE trail_user_state SET
                stage_id = $2,
                current_mission_day = $3,
                current_streak_days = $4,
                max_streak_days = $5,
                total_missions_completed = $6,
                last_mission_completed_at = $7,
                last_mission_completed_date = $8,
                updated_at = $9
            WHERE user_id = $1
            "#,
        )
        .bind(state.user_id)
        .bind(state.stage_id)
        .bind(state.current_mission_day)
        .bind(state.current_streak_days)
        .bind(state.max_streak_days)
        .bind(state.total_missions_completed)
        .bind(state.last_mission_completed_at)
        .bind(state.last_mission_completed_date)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_mission_log(&self, entry: &MissionLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trail_mission_log (
                id, user_id, stage_id, stage_order_index, mission_day,
                mission_code, mission_title, completed_at, completed_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.stage_id)
        .bind(entry.stage_order_index)
        .bind(entry.mission_day)
        .bind(&entry.mission_code)
        .bind(&entry.mission_title)
        .bind(entry.completed_at)
        .bind(entry.completed_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
