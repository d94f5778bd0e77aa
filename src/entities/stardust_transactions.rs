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
pub enum StardustTransactionType {
    #[sea_orm(string_value = "earn")]
    Earn,
    #[sea_orm(string_value = "spend")]
    Spend,
}

impl std::fmt::Display for StardustTransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StardustTransactionType::Earn => write!(f, "earn"),
            StardustTransactionType::Spend => write!(f, "spend"),
        }
    }
}

/// 星尘流水 (仅追加, 账户余额的审计来源)
/// - item_key: 商店兑换时记录商品标识, 限购按此计数
/// - details: JSON 文本 (结构化上下文, 如重复获得的精灵与层级)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stardust_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub player_id: i64,
    pub transaction_type: StardustTransactionType,
    pub amount: i64,
    pub balance_after: i64,
    pub reason: String,
    pub item_key: Option<String>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
