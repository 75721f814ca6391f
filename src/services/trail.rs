//! Trail Progression Engine
//!
//! State machine over one per-user record: daily-gated mission
//! completion with streak continuity and stage rollover. Day boundaries
//! are civil dates in America/Sao_Paulo; the streak and the
//! once-per-day guard both compare civil dates, never instants.
//!
//! The decision logic (guard, streak, pointer advance) is pure
//! functions over an immutable record plus today/yesterday; the service
//! wraps them with `TrailStore` reads and writes. The audit log insert
//! is deliberately not transactional with the state update: the log is
//! at-least-once, the progression row stays authoritative.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::America::Sao_Paulo;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Mission, MissionLogEntry, Stage, TrailStore, UserTrailState};

/// Every stage carries exactly 30 mission days.
pub const DAYS_PER_STAGE: i32 = 30;

// ============ Errors ============

#[derive(Debug, Error)]
pub enum TrailError {
    #[error("trail state not initialized for this user")]
    NotInitialized,

    #[error("today's mission is already completed, come back tomorrow")]
    AlreadyCompletedToday,

    /// The catalog must be complete for every stage/day a user can
    /// reach; a hole is fatal for the request.
    #[error("trail data integrity error: {0}")]
    DataIntegrity(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

// ============ Display Snapshot ============

#[derive(Debug, Clone, Serialize)]
pub struct StageInfo {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub patent: String,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionInfo {
    pub day: i32,
    pub code: String,
    pub title: String,
    pub description: String,
}

/// What the trail screen renders: current stage and patent, mission of
/// the day, streak figures.
#[derive(Debug, Clone, Serialize)]
pub struct TrailSnapshot {
    pub stage: StageInfo,
    pub current_mission: MissionInfo,
    pub current_streak_days: i32,
    pub max_streak_days: i32,
    pub total_missions_completed: i32,
}

// ============ Civil Day Helpers ============

/// Today's civil date in Brasília time.
pub fn today_in_sao_paulo() -> NaiveDate {
    Utc::now().with_timezone(&Sao_Paulo).date_naive()
}

fn civil_dates_now() -> (NaiveDate, NaiveDate) {
    let today = today_in_sao_paulo();
    (today, today - Duration::days(1))
}

// ============ Pure Decision Logic ============

/// A completion today extends the streak only off a completion
/// yesterday; anything else (first ever, or a skipped day) restarts at
/// 1, because today's completion itself counts.
fn next_streak(state: &UserTrailState, yesterday: NaiveDate) -> i32 {
    if state.last_mission_completed_date == Some(yesterday) {
        state.current_streak_days + 1
    } else {
        1
    }
}

/// Where the pointer goes after completing the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerAdvance {
    /// Next day within the same stage.
    NextDay(i32),
    /// Day 30 done; the successor stage, if any, decides the rest.
    StageBoundary,
}

fn advance_pointer(current_mission_day: i32) -> PointerAdvance {
    if current_mission_day < DAYS_PER_STAGE {
        PointerAdvance::NextDay(current_mission_day + 1)
    } else {
        PointerAdvance::StageBoundary
    }
}

// ============ Service ============

pub struct TrailService {
    store: Arc<dyn TrailStore>,
}

impl TrailService {
    pub fn new(store: Arc<dyn TrailStore>) -> Self {
        Self { store }
    }

    /// Idempotent create-if-absent: stage 1, day 1, zero counters.
    pub async fn initialize(&self, user_id: Uuid) -> Result<(), TrailError> {
        if self.store.progression(user_id).await?.is_some() {
            return Ok(());
        }

        let first_stage = self
            .store
            .first_stage()
            .await?
            .ok_or_else(|| TrailError::DataIntegrity("no stage with order_index 1".into()))?;

        let now = Utc::now();
        let state = UserTrailState {
            id: Uuid::new_v4(),
            user_id,
            stage_id: first_stage.id,
            current_mission_day: 1,
            current_streak_days: 0,
            max_streak_days: 0,
            total_missions_completed: 0,
            last_mission_completed_at: None,
            last_mission_completed_date: None,
            created_at: now,
            updated_at: now,
        };

        // A lost race against another initialize ends at the store's
        // uniqueness constraint and is treated as already-initialized.
        self.store.insert_progression(&state).await?;
        Ok(())
    }

    /// Current display snapshot, or `None` when the user has no
    /// progression record yet.
    pub async fn current_state(&self, user_id: Uuid) -> Result<Option<TrailSnapshot>, TrailError> {
        let Some(state) = self.store.progression(user_id).await? else {
            return Ok(None);
        };

        self.snapshot_of(&state).await.map(Some)
    }

    /// Completes today's mission: guard, audit log, streak, pointer,
    /// one state update. Retrying on the same civil day fails with
    /// [`TrailError::AlreadyCompletedToday`] and changes nothing.
    pub async fn complete_today(&self, user_id: Uuid) -> Result<TrailSnapshot, TrailError> {
        let (today, yesterday) = civil_dates_now();
        self.complete_on(user_id, today, yesterday).await
    }

    /// Date-injected body of `complete_today`.
    pub(crate) async fn complete_on(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        yesterday: NaiveDate,
    ) -> Result<TrailSnapshot, TrailError> {
        let state = self
            .store
            .progression(user_id)
            .await?
            .ok_or(TrailError::NotInitialized)?;

        if state.last_mission_completed_date == Some(today) {
            return Err(TrailError::AlreadyCompletedToday);
        }

        let stage = self.resolve_stage(state.stage_id).await?;
        let mission = self
            .resolve_mission(stage.order_index, state.current_mission_day)
            .await?;

        // Audit row first. If the state update below fails we keep an
        // extra log row; the progression record stays authoritative.
        let now = Utc::now();
        self.store
            .append_mission_log(&MissionLogEntry {
                id: Uuid::new_v4(),
                user_id,
                stage_id: stage.id,
                stage_order_index: stage.order_index,
                mission_day: state.current_mission_day,
                mission_code: mission.code.clone(),
                mission_title: mission.title.clone(),
                completed_at: now,
                completed_date: today,
            })
            .await?;

        let new_streak = next_streak(&state, yesterday);
        let new_max_streak = state.max_streak_days.max(new_streak);

        let (next_stage_id, next_day) = match advance_pointer(state.current_mission_day) {
            PointerAdvance::NextDay(day) => (state.stage_id, day),
            PointerAdvance::StageBoundary => {
                match self.store.stage_by_order(stage.order_index + 1).await? {
                    Some(next_stage) => (next_stage.id, 1),
                    // Final stage exhausted: hold at (stage, 30). The
                    // daily guard still applies through the completion
                    // date below.
                    None => (state.stage_id, state.current_mission_day),
                }
            }
        };

        let updated = UserTrailState {
            stage_id: next_stage_id,
            current_mission_day: next_day,
            current_streak_days: new_streak,
            max_streak_days: new_max_streak,
            total_missions_completed: state.total_missions_completed + 1,
            last_mission_completed_at: Some(now),
            last_mission_completed_date: Some(today),
            updated_at: now,
            ..state
        };
        self.store.update_progression(&updated).await?;

        tracing::info!(
            %user_id,
            stage = stage.order_index,
            day = updated.current_mission_day,
            streak = new_streak,
            "trail mission completed"
        );

        self.snapshot_of(&updated).await
    }

    async fn snapshot_of(&self, state: &UserTrailState) -> Result<TrailSnapshot, TrailError> {
        let stage = self.resolve_stage(state.stage_id).await?;
        let mission = self
            .resolve_mission(stage.order_index, state.current_mission_day)
            .await?;

        Ok(TrailSnapshot {
            stage: StageInfo {
                id: stage.id,
                key: stage.key,
                name: stage.name,
                patent: stage.patent,
                order_index: stage.order_index,
            },
            current_mission: MissionInfo {
                day: mission.day,
                code: mission.code,
                title: mission.title,
                description: mission.description,
            },
            current_streak_days: state.current_streak_days,
            max_streak_days: state.max_streak_days,
            total_missions_completed: state.total_missions_completed,
        })
    }

    async fn resolve_stage(&self, stage_id: Uuid) -> Result<Stage, TrailError> {
        self.store
            .stage_by_id(stage_id)
            .await?
            .ok_or_else(|| TrailError::DataIntegrity(format!("stage {stage_id} not found")))
    }

    async fn resolve_mission(
        &self,
        stage_order_index: i32,
        day: i32,
    ) -> Result<Mission, TrailError> {
        self.store.mission(stage_order_index, day).await?.ok_or_else(|| {
            TrailError::DataIntegrity(format!(
                "no mission for stage {stage_order_index} day {day}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::mock::MockTrailStore;

    fn service_with(store: Arc<MockTrailStore>) -> TrailService {
        TrailService::new(store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `(today, yesterday)` pair for a given today.
    fn days(today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today, today - Duration::days(1))
    }

    #[tokio::test]
    async fn test_initialize_starts_at_stage_one_day_one() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();

        service.initialize(user).await.unwrap();

        let snapshot = service.current_state(user).await.unwrap().unwrap();
        assert_eq!(snapshot.stage.order_index, 1);
        assert_eq!(snapshot.current_mission.day, 1);
        assert_eq!(snapshot.current_streak_days, 0);
        assert_eq!(snapshot.total_missions_completed, 0);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();

        service.initialize(user).await.unwrap();

        // Advance the user, then initialize again: nothing resets.
        let (today, yesterday) = days(date(2026, 3, 10));
        service.complete_on(user, today, yesterday).await.unwrap();
        service.initialize(user).await.unwrap();

        let snapshot = service.current_state(user).await.unwrap().unwrap();
        assert_eq!(snapshot.current_mission.day, 2);
        assert_eq!(snapshot.total_missions_completed, 1);
    }

    #[tokio::test]
    async fn test_current_state_absent_user() {
        let store = Arc::new(MockTrailStore::seeded(1, 30));
        let service = service_with(store);

        let snapshot = service.current_state(Uuid::new_v4()).await.unwrap();
        assert!(snapshot.is_none());
    }

    #[tokio::test]
    async fn test_complete_requires_initialization() {
        let store = Arc::new(MockTrailStore::seeded(1, 30));
        let service = service_with(store);

        let (today, yesterday) = days(date(2026, 3, 10));
        let err = service
            .complete_on(Uuid::new_v4(), today, yesterday)
            .await
            .unwrap_err();
        assert!(matches!(err, TrailError::NotInitialized));
    }

    #[tokio::test]
    async fn test_complete_advances_day_and_starts_streak() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();
        service.initialize(user).await.unwrap();

        let (today, yesterday) = days(date(2026, 3, 10));
        let snapshot = service.complete_on(user, today, yesterday).await.unwrap();

        // First ever completion: streak is 1, not 0.
        assert_eq!(snapshot.current_streak_days, 1);
        assert_eq!(snapshot.max_streak_days, 1);
        assert_eq!(snapshot.current_mission.day, 2);
        assert_eq!(snapshot.total_missions_completed, 1);
        assert_eq!(store.log_len(), 1);
    }

    #[tokio::test]
    async fn test_second_completion_same_day_rejected_unchanged() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();
        service.initialize(user).await.unwrap();

        let (today, yesterday) = days(date(2026, 3, 10));
        service.complete_on(user, today, yesterday).await.unwrap();
        let err = service
            .complete_on(user, today, yesterday)
            .await
            .unwrap_err();

        assert!(matches!(err, TrailError::AlreadyCompletedToday));
        // No double-advance, no extra audit row.
        let snapshot = service.current_state(user).await.unwrap().unwrap();
        assert_eq!(snapshot.current_mission.day, 2);
        assert_eq!(snapshot.total_missions_completed, 1);
        assert_eq!(store.log_len(), 1);
    }

    #[tokio::test]
    async fn test_streak_extends_on_consecutive_days() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();
        service.initialize(user).await.unwrap();

        let mut day = date(2026, 3, 10);
        for expected_streak in 1..=5 {
            let (today, yesterday) = days(day);
            let snapshot = service.complete_on(user, today, yesterday).await.unwrap();
            assert_eq!(snapshot.current_streak_days, expected_streak);
            day += Duration::days(1);
        }
    }

    #[tokio::test]
    async fn test_streak_resets_to_one_after_skipped_day() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();
        service.initialize(user).await.unwrap();

        let (d1, d1y) = days(date(2026, 3, 10));
        let (d2, d2y) = days(date(2026, 3, 11));
        service.complete_on(user, d1, d1y).await.unwrap();
        service.complete_on(user, d2, d2y).await.unwrap();

        // Skip March 12 entirely.
        let (d4, d4y) = days(date(2026, 3, 13));
        let snapshot = service.complete_on(user, d4, d4y).await.unwrap();

        assert_eq!(snapshot.current_streak_days, 1);
        // The high-water mark keeps the best run.
        assert_eq!(snapshot.max_streak_days, 2);
        assert_eq!(snapshot.total_missions_completed, 3);
    }

    #[tokio::test]
    async fn test_stage_rollover_to_successor() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();
        service.initialize(user).await.unwrap();

        // Place the user at day 30 of stage 1.
        let mut state = store.progression(user).await.unwrap().unwrap();
        state.current_mission_day = 30;
        store.put_progression(state);

        let (today, yesterday) = days(date(2026, 3, 10));
        let snapshot = service.complete_on(user, today, yesterday).await.unwrap();

        assert_eq!(snapshot.stage.order_index, 2);
        assert_eq!(snapshot.current_mission.day, 1);
    }

    #[tokio::test]
    async fn test_final_stage_holds_at_day_thirty() {
        let store = Arc::new(MockTrailStore::seeded(1, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();
        service.initialize(user).await.unwrap();

        let mut state = store.progression(user).await.unwrap().unwrap();
        state.current_mission_day = 30;
        store.put_progression(state);

        let (today, yesterday) = days(date(2026, 3, 10));
        let snapshot = service.complete_on(user, today, yesterday).await.unwrap();

        // No successor stage: the pointer holds and the day still
        // counts, so the guard blocks a retry.
        assert_eq!(snapshot.stage.order_index, 1);
        assert_eq!(snapshot.current_mission.day, 30);
        let err = service
            .complete_on(user, today, yesterday)
            .await
            .unwrap_err();
        assert!(matches!(err, TrailError::AlreadyCompletedToday));

        // Next day it completes the same final mission again.
        let (tomorrow, t_yesterday) = days(date(2026, 3, 11));
        let again = service
            .complete_on(user, tomorrow, t_yesterday)
            .await
            .unwrap();
        assert_eq!(again.stage.order_index, 1);
        assert_eq!(again.current_mission.day, 30);
        assert_eq!(again.total_missions_completed, 2);
    }

    #[tokio::test]
    async fn test_counters_are_monotonic() {
        let store = Arc::new(MockTrailStore::seeded(2, 30));
        let service = service_with(store.clone());
        let user = Uuid::new_v4();
        service.initialize(user).await.unwrap();

        let mut max_seen = 0;
        let mut total_seen = 0;
        // Alternate runs and gaps over two weeks.
        for (i, day_offset) in [0, 1, 2, 4, 5, 8, 9, 10, 11].iter().enumerate() {
            let (today, yesterday) = days(date(2026, 3, 10) + Duration::days(*day_offset));
            let snapshot = service.complete_on(user, today, yesterday).await.unwrap();

            assert!(snapshot.max_streak_days >= max_seen);
            assert_eq!(snapshot.total_missions_completed, total_seen + 1);
            max_seen = snapshot.max_streak_days;
            total_seen = snapshot.total_missions_completed;
            assert_eq!(total_seen as usize, i + 1);
        }
        assert_eq!(max_seen, 4);
    }

    #[test]
    fn test_next_streak_rules() {
        let base = UserTrailState {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            stage_id: Uuid::new_v4(),
            current_mission_day: 5,
            current_streak_days: 3,
            max_streak_days: 7,
            total_missions_completed: 12,
            last_mission_completed_at: None,
            last_mission_completed_date: Some(date(2026, 3, 9)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // Completed yesterday: extend.
        assert_eq!(next_streak(&base, date(2026, 3, 9)), 4);
        // Gap: reset to 1.
        assert_eq!(next_streak(&base, date(2026, 3, 11)), 1);
        // Never completed: 1.
        let fresh = UserTrailState {
            last_mission_completed_date: None,
            current_streak_days: 0,
            ..base
        };
        assert_eq!(next_streak(&fresh, date(2026, 3, 9)), 1);
    }

    #[test]
    fn test_advance_pointer_boundary() {
        assert_eq!(advance_pointer(1), PointerAdvance::NextDay(2));
        assert_eq!(advance_pointer(29), PointerAdvance::NextDay(30));
        assert_eq!(advance_pointer(30), PointerAdvance::StageBoundary);
    }
}
