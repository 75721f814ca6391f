//! Trail Storage Interface
//!
//! The progression engine only needs a handful of reads and three
//! writes against collaborator-owned storage, so they are expressed as
//! a trait. PostgreSQL implements it in `db/mod.rs`; tests run the full
//! completion flow against the in-memory mock below.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::models::{Mission, MissionLogEntry, Stage, UserTrailState};

#[async_trait]
pub trait TrailStore: Send + Sync {
    async fn first_stage(&self) -> Result<Option<Stage>>;
    async fn stage_by_id(&self, id: Uuid) -> Result<Option<Stage>>;
    async fn stage_by_order(&self, order_index: i32) -> Result<Option<Stage>>;
    async fn mission(&self, stage_order_index: i32, day: i32) -> Result<Option<Mission>>;

    async fn progression(&self, user_id: Uuid) -> Result<Option<UserTrailState>>;
    /// Create-if-absent; a concurrent duplicate insert must be benign.
    async fn insert_progression(&self, state: &UserTrailState) -> Result<()>;
    /// Single-row update keyed by user id.
    async fn update_progression(&self, state: &UserTrailState) -> Result<()>;
    /// Append-only audit log, never linked transactionally to the
    /// progression update.
    async fn append_mission_log(&self, entry: &MissionLogEntry) -> Result<()>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::*;

    /// In-memory store seeded with a synthetic stage/mission catalog.
    pub struct MockTrailStore {
        stages: Vec<Stage>,
        missions: HashMap<(i32, i32), Mission>,
        progressions: RwLock<HashMap<Uuid, UserTrailState>>,
        log: RwLock<Vec<MissionLogEntry>>,
    }

    impl MockTrailStore {
        /// Builds `stage_count` stages with `days` missions each.
        pub fn seeded(stage_count: i32, days: i32) -> Self {
            let stages = (1..=stage_count)
                .map(|order| Stage {
                    id: Uuid::new_v4(),
                    key: format!("stage_{order}"),
                    name: format!("Stage {order}"),
                    patent: format!("Patent {order}"),
                    order_index: order,
                })
                .collect::<Vec<_>>();

            let mut missions = HashMap::new();
            for stage in &stages {
                for day in 1..=days {
                    missions.insert(
                        (stage.order_index, day),
                        Mission {
                            id: Uuid::new_v4(),
                            stage_order_index: stage.order_index,
                            day,
                            code: format!("S{}D{}", stage.order_index, day),
                            title: format!("Mission {} of stage {}", day, stage.order_index),
                            description: "do the thing".to_string(),
                        },
                    );
                }
            }

            Self {
                stages,
                missions,
                progressions: RwLock::new(HashMap::new()),
                log: RwLock::new(Vec::new()),
            }
        }

        pub fn stage_at(&self, order_index: i32) -> &Stage {
            self.stages
                .iter()
                .find(|s| s.order_index == order_index)
                .expect("seeded stage")
        }

        pub fn log_len(&self) -> usize {
            self.log.read().unwrap().len()
        }

        /// Test hook to place a user at an arbitrary point of the trail.
        pub fn put_progression(&self, state: UserTrailState) {
            self.progressions
                .write()
                .unwrap()
                .insert(state.user_id, state);
        }
    }

    #[async_trait]
    impl TrailStore for MockTrailStore {
        async fn first_stage(&self) -> Result<Option<Stage>> {
            Ok(self.stages.iter().find(|s| s.order_index == 1).cloned())
        }

        async fn stage_by_id(&self, id: Uuid) -> Result<Option<Stage>> {
            Ok(self.stages.iter().find(|s| s.id == id).cloned())
        }

        async fn stage_by_order(&self, order_index: i32) -> Result<Option<Stage>> {
            Ok(self
                .stages
                .iter()
                .find(|s| s.order_index == order_index)
                .cloned())
        }

        async fn mission(&self, stage_order_index: i32, day: i32) -> Result<Option<Mission>> {
            Ok(self.missions.get(&(stage_order_index, day)).cloned())
        }

        async fn progression(&self, user_id: Uuid) -> Result<Option<UserTrailState>> {
            Ok(self.progressions.read().unwrap().get(&user_id).cloned())
        }

        async fn insert_progression(&self, state: &UserTrailState) -> Result<()> {
            self.progressions
                .write()
                .unwrap()
                .entry(state.user_id)
                .or_insert_with(|| state.clone());
            Ok(())
        }

        async fn update_progression(&self, state: &UserTrailState) -> Result<()> {
            self.progressions
                .write()
                .unwrap()
                .insert(state.user_id, state.clone());
            Ok(())
        }

        async fn append_mission_log(&self, entry: &MissionLogEntry) -> Result<()> {
            self.log.write().unwrap().push(entry.clone());
            Ok(())
        }
    }
}
