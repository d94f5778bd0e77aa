use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum RewardSource {
    #[sea_orm(string_value = "pull")]
    Pull,
    #[sea_orm(string_value = "stardust_shop")]
    StardustShop,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    #[sea_orm(string_value = "creature")]
    Creature,
    #[sea_orm(string_value = "item")]
    Item,
    /// 重复获得转换后的游戏内代币
    #[sea_orm(string_value = "duplicate_token")]
    DuplicateToken,
}

/// 发放状态
/// pending -> claimed
/// pending -> delivery_started -> delivered
/// delivery_started -> pending (发放失败, 记录 last_error 后等待重试)
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(24))")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "claimed")]
    Claimed,
    #[sea_orm(string_value = "delivery_started")]
    DeliveryStarted,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Claimed => write!(f, "claimed"),
            DeliveryStatus::DeliveryStarted => write!(f, "delivery_started"),
            DeliveryStatus::Delivered => write!(f, "delivered"),
        }
    }
}

/// 待发放奖励 (由外部游戏端代理轮询并确认)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pending_rewards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub player_id: i64,
    pub external_player_id: String,
    /// 来源抽取批次 (商店兑换为 NULL)
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
    pub updated_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
