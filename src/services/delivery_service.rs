use crate::entities::{
    DeliveryStatus, RewardKind, RewardSource, pending_reward_entity as pending,
};
use crate::error::{AppError, AppResult};
use crate::models::PendingRewardResponse;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// 入队参数
#[derive(Debug, Clone)]
pub struct NewReward {
    pub player_id: i64,
    pub external_player_id: String,
    pub batch_id: Option<Uuid>,
    pub source: RewardSource,
    pub reward_kind: RewardKind,
    pub outcome_key: String,
    pub outcome_name: String,
    pub is_variant: bool,
    pub quantity: i64,
}

/// 待发放队列 (由外部代理轮询)
///
/// 状态迁移均为条件更新 (WHERE status = ?), 并发的代理请求只有一个会成功。
#[derive(Clone)]
pub struct DeliveryService {
    pool: DatabaseConnection,
}

impl DeliveryService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn enqueue<C: ConnectionTrait>(
        conn: &C,
        reward: NewReward,
        now: DateTime<Utc>,
    ) -> AppResult<pending::Model> {
        Ok(pending::ActiveModel {
            id: Set(Uuid::new_v4()),
            player_id: Set(reward.player_id),
            external_player_id: Set(reward.external_player_id),
            batch_id: Set(reward.batch_id),
            source: Set(reward.source),
            reward_kind: Set(reward.reward_kind),
            outcome_key: Set(reward.outcome_key),
            outcome_name: Set(reward.outcome_name),
            is_variant: Set(reward.is_variant),
            quantity: Set(reward.quantity),
            status: Set(DeliveryStatus::Pending),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            delivered_at: Set(None),
        }
        .insert(conn)
        .await?)
    }

    pub async fn list_pending(&self, external_id: &str) -> AppResult<Vec<PendingRewardResponse>> {
        let list = pending::Entity::find()
            .filter(pending::Column::ExternalPlayerId.eq(external_id))
            .filter(pending::Column::Status.eq(DeliveryStatus::Pending))
            .order_by_asc(pending::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    async fn find(&self, reward_id: Uuid) -> AppResult<pending::Model> {
        pending::Entity::find_by_id(reward_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pending reward {reward_id}")))
    }

    /// 条件迁移; 返回是否命中
    async fn transition(
        &self,
        reward_id: Uuid,
        from: DeliveryStatus,
        to: DeliveryStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut update = pending::Entity::update_many()
            .col_expr(pending::Column::Status, Expr::value(to))
            .col_expr(pending::Column::UpdatedAt, Expr::value(now));
        if to == DeliveryStatus::Delivered {
            update = update.col_expr(pending::Column::DeliveredAt, Expr::value(Some(now)));
        }
        let result = update
            .filter(pending::Column::Id.eq(reward_id))
            .filter(pending::Column::Status.eq(from))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }

    fn conflict(reward: &pending::Model, action: &str) -> AppError {
        AppError::DeliveryConflict(format!(
            "cannot {action} reward {} in status {}",
            reward.id, reward.status
        ))
    }

    /// pending -> claimed (玩家在游戏内直接领取)
    pub async fn mark_claimed(&self, reward_id: Uuid) -> AppResult<PendingRewardResponse> {
        let hit = self
            .transition(
                reward_id,
                DeliveryStatus::Pending,
                DeliveryStatus::Claimed,
                Utc::now(),
            )
            .await?;
        let reward = self.find(reward_id).await?;
        if !hit && reward.status != DeliveryStatus::Claimed {
            return Err(Self::conflict(&reward, "claim"));
        }
        Ok(reward.into())
    }

    /// pending -> delivery_started; 已开始的记录不能再次开始
    pub async fn mark_delivery_started(
        &self,
        reward_id: Uuid,
    ) -> AppResult<PendingRewardResponse> {
        let hit = self
            .transition(
                reward_id,
                DeliveryStatus::Pending,
                DeliveryStatus::DeliveryStarted,
                Utc::now(),
            )
            .await?;
        let reward = self.find(reward_id).await?;
        if !hit {
            return Err(Self::conflict(&reward, "start delivery of"));
        }
        Ok(reward.into())
    }

    /// delivery_started -> delivered; 重复确认视为成功
    pub async fn mark_delivered(&self, reward_id: Uuid) -> AppResult<PendingRewardResponse> {
        let hit = self
            .transition(
                reward_id,
                DeliveryStatus::DeliveryStarted,
                DeliveryStatus::Delivered,
                Utc::now(),
            )
            .await?;
        let reward = self.find(reward_id).await?;
        if !hit && reward.status != DeliveryStatus::Delivered {
            return Err(Self::conflict(&reward, "mark delivered"));
        }
        if hit {
            log::info!(
                "Reward {} ({}) delivered to {}",
                reward.id,
                reward.outcome_key,
                reward.external_player_id
            );
        }
        Ok(reward.into())
    }

    /// delivery_started -> pending, 记录失败次数与原因
    pub async fn mark_failed(
        &self,
        reward_id: Uuid,
        reason: &str,
    ) -> AppResult<PendingRewardResponse> {
        let result = pending::Entity::update_many()
            .col_expr(pending::Column::Status, Expr::value(DeliveryStatus::Pending))
            .col_expr(
                pending::Column::Attempts,
                Expr::col(pending::Column::Attempts).add(1),
            )
            .col_expr(
                pending::Column::LastError,
                Expr::value(Some(reason.to_string())),
            )
            .col_expr(pending::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(pending::Column::Id.eq(reward_id))
            .filter(pending::Column::Status.eq(DeliveryStatus::DeliveryStarted))
            .exec(&self.pool)
            .await?;
        let reward = self.find(reward_id).await?;
        if result.rows_affected != 1 {
            return Err(Self::conflict(&reward, "mark failed"));
        }
        log::warn!(
            "Delivery of reward {} failed (attempt {}): {reason}",
            reward.id,
            reward.attempts
        );
        Ok(reward.into())
    }

    pub async fn confirm_delivery(
        &self,
        reward_id: Uuid,
        success: bool,
        reason: Option<&str>,
    ) -> AppResult<PendingRewardResponse> {
        if success {
            self.mark_delivered(reward_id).await
        } else {
            self.mark_failed(reward_id, reason.unwrap_or("unspecified"))
                .await
        }
    }

    /// 删除创建时间早于 older_than 的 pending 记录
    pub async fn cleanup_stale(&self, older_than: Duration) -> AppResult<u64> {
        if older_than <= Duration::zero() {
            return Err(AppError::ValidationError(
                "older_than must be positive".into(),
            ));
        }
        let cutoff = Utc::now() - older_than;
        let result = pending::Entity::delete_many()
            .filter(pending::Column::Status.eq(DeliveryStatus::Pending))
            .filter(pending::Column::CreatedAt.lt(cutoff))
            .exec(&self.pool)
            .await?;
        if result.rows_affected > 0 {
            log::info!("Removed {} stale pending rewards", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}
