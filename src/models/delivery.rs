use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{DeliveryStatus, RewardKind, RewardSource, pending_reward_entity};

/// 待发放奖励 (供外部代理使用)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingRewardResponse {
    pub id: Uuid,
    pub player_id: i64,
    pub external_player_id: String,
    pub batch_id: Option<Uuid>,
    pub source: RewardSource,
    pub reward_kind: RewardKind,
    pub outcome_key: String,
    pub outcome_name: String,
    pub is_variant: bool,
    pub quantity: i64,
    pub status: DeliveryStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl From<pending_reward_entity::Model> for PendingRewardResponse {
    fn from(m: pending_reward_entity::Model) -> Self {
        PendingRewardResponse {
            id: m.id,
            player_id: m.player_id,
            external_player_id: m.external_player_id,
            batch_id: m.batch_id,
            source: m.source,
            reward_kind: m.reward_kind,
            outcome_key: m.outcome_key,
            outcome_name: m.outcome_name,
            is_variant: m.is_variant,
            quantity: m.quantity,
            status: m.status,
            attempts: m.attempts,
            last_error: m.last_error,
            created_at: m.created_at,
            delivered_at: m.delivered_at,
        }
    }
}

/// 代理确认发放结果
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConfirmDeliveryRequest {
    pub success: bool,
    /// 失败原因 (success = false 时记录)
    pub reason: Option<String>,
}

/// 清理长期未处理的待发放奖励
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CleanupPendingRequest {
    /// 早于此小时数的 pending 记录会被删除
    pub older_than_hours: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CleanupPendingResponse {
    pub deleted: u64,
}
