use crate::config::GachaConfig;
use crate::entities::{banner_entity as banners, target_path_entity as targets};
use crate::error::{AppError, AppResult};
use crate::gacha::TargetPath;
use crate::models::TargetPathResponse;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct TargetPathService {
    pool: DatabaseConnection,
    config: GachaConfig,
}

impl TargetPathService {
    pub fn new(pool: DatabaseConnection, config: GachaConfig) -> Self {
        Self { pool, config }
    }

    fn to_response(&self, m: &targets::Model) -> TargetPathResponse {
        let max = self.config.max_fate_points;
        TargetPathResponse {
            banner_id: m.banner_id,
            target_key: m.target_key.clone(),
            fate_points: m.fate_points,
            max_fate_points: max as i32,
            will_force: as_path(m).should_force(max),
        }
    }

    /// 选择定轨目标: 必须是该卡池的 UP 条目; 目标不变时为 no-op
    pub async fn set_target(
        &self,
        player_id: i64,
        banner_id: Uuid,
        outcome_key: &str,
    ) -> AppResult<TargetPathResponse> {
        let banner = banners::Entity::find_by_id(banner_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::BannerNotFound(banner_id.to_string()))?;
        if !banner.featured()?.iter().any(|f| f.outcome_key == outcome_key) {
            return Err(AppError::ValidationError(format!(
                "{outcome_key} is not a featured entry of banner {banner_id}"
            )));
        }

        let txn = self.pool.begin().await?;
        let now = Utc::now();
        let saved = match Self::lock(&txn, player_id, banner_id).await? {
            Some(existing) => {
                let mut path = as_path(&existing);
                if !path.retarget(outcome_key) {
                    txn.commit().await?;
                    return Ok(self.to_response(&existing));
                }
                let mut am = existing.into_active_model();
                am.target_key = Set(path.target_key);
                am.fate_points = Set(0);
                am.updated_at = Set(now);
                am.update(&txn).await?
            }
            None => {
                targets::ActiveModel {
                    player_id: Set(player_id),
                    banner_id: Set(banner_id),
                    target_key: Set(outcome_key.to_string()),
                    fate_points: Set(0),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };
        txn.commit().await?;

        log::info!("Player {player_id} targets {outcome_key} on banner {banner_id}");
        Ok(self.to_response(&saved))
    }

    pub async fn get_target(
        &self,
        player_id: i64,
        banner_id: Uuid,
    ) -> AppResult<Option<TargetPathResponse>> {
        let found = targets::Entity::find_by_id((player_id, banner_id))
            .one(&self.pool)
            .await?;
        Ok(found.map(|m| self.to_response(&m)))
    }

    pub async fn clear_target(&self, player_id: i64, banner_id: Uuid) -> AppResult<bool> {
        let result = targets::Entity::delete_by_id((player_id, banner_id))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn lock<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        banner_id: Uuid,
    ) -> AppResult<Option<targets::Model>> {
        Ok(targets::Entity::find_by_id((player_id, banner_id))
            .lock_exclusive()
            .one(conn)
            .await?)
    }

    pub async fn save_progress<C: ConnectionTrait>(
        conn: &C,
        record: targets::Model,
        fate_points: u32,
    ) -> AppResult<()> {
        if record.fate_points == fate_points as i32 {
            return Ok(());
        }
        let mut am = record.into_active_model();
        am.fate_points = Set(fate_points as i32);
        am.updated_at = Set(Utc::now());
        am.update(conn).await?;
        Ok(())
    }
}

pub fn as_path(m: &targets::Model) -> TargetPath {
    TargetPath {
        target_key: m.target_key.clone(),
        fate_points: m.fate_points.max(0) as u32,
    }
}
