use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{FeaturedGuarantee, OutcomeKind, Tier, pull_history_entity};

/// 单抽 / 十连
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PullKind {
    Single,
    Multi,
}

impl PullKind {
    /// 幂等记录中的 operation 字段
    pub fn operation(self) -> &'static str {
        match self {
            PullKind::Single => "pull",
            PullKind::Multi => "multi_pull",
        }
    }
}

/// 单个抽取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PulledOutcome {
    pub kind: OutcomeKind,
    pub outcome_key: String,
    pub name: String,
    pub tier: Tier,
    pub is_variant: bool,
    pub is_featured: bool,
    pub was_duplicate: bool,
    /// 首次获得 (普通或闪光) 时为 true
    pub is_new_entry: bool,
    pub stardust_earned: i64,
}

/// 本批次结束后的保底状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PityState {
    pub pulls_since_top: i32,
    pub pulls_since_second: i32,
    pub featured_guarantee: FeaturedGuarantee,
    pub pulls_until_hard_pity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fate_points: Option<i32>,
}

/// 本批次的账本变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LedgerDelta {
    /// 主货币扣减 (正数)
    pub currency_spent: i64,
    pub stardust_earned: i64,
}

/// 抽取响应; 与幂等记录中保存的内容完全一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PullResponse {
    pub batch_id: Uuid,
    pub banner_id: Uuid,
    pub outcomes: Vec<PulledOutcome>,
    pub pity_state: PityState,
    pub ledger_delta: LedgerDelta,
    pub new_balance: i64,
    pub new_stardust_balance: i64,
}

/// 抽取历史查询参数
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HistoryQuery {
    pub banner_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntryResponse {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub banner_id: Uuid,
    pub tier: Tier,
    pub outcome_kind: OutcomeKind,
    pub outcome_key: String,
    pub outcome_name: String,
    pub is_variant: bool,
    pub is_featured: bool,
    pub was_duplicate: bool,
    pub is_new_entry: bool,
    pub stardust_earned: i64,
    pub cost: i64,
    pub created_at: DateTime<Utc>,
}

impl From<pull_history_entity::Model> for HistoryEntryResponse {
    fn from(m: pull_history_entity::Model) -> Self {
        HistoryEntryResponse {
            id: m.id,
            batch_id: m.batch_id,
            banner_id: m.banner_id,
            tier: m.tier,
            outcome_kind: m.outcome_kind,
            outcome_key: m.outcome_key,
            outcome_name: m.outcome_name,
            is_variant: m.is_variant,
            is_featured: m.is_featured,
            was_duplicate: m.was_duplicate,
            is_new_entry: m.is_new_entry,
            stardust_earned: m.stardust_earned,
            cost: m.cost,
            created_at: m.created_at,
        }
    }
}

/// 管理员清除历史的结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResetResponse {
    pub player_id: i64,
    pub deleted: u64,
}
