use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// UP 层级的 50/50 状态: 输掉一次后下一次 UP 层级必定为 UP
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum FeaturedGuarantee {
    #[sea_orm(string_value = "coin_flip")]
    CoinFlip,
    #[sea_orm(string_value = "guaranteed")]
    Guaranteed,
}

/// 保底记录 (player_id, banner_id)
/// - pulls_since_top: 距上次 Legendary 及以上的抽数
/// - pulls_since_second: 距上次 Epic 及以上的抽数
/// - lifetime_pulls / lifetime_spend: 累计抽数与消耗
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pity_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub player_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub banner_id: Uuid,
    pub pulls_since_top: i32,
    pub pulls_since_second: i32,
    pub featured_guarantee: FeaturedGuarantee,
    pub lifetime_pulls: i64,
    pub lifetime_spend: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
