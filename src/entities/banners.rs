use crate::models::{Expiry, FeaturedEntry};
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
pub enum BannerKind {
    /// 常驻卡池: 永远存在且唯一, 无 UP
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "limited")]
    Limited,
}

impl std::fmt::Display for BannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BannerKind::Standard => write!(f, "standard"),
            BannerKind::Limited => write!(f, "limited"),
        }
    }
}

/// 卡池实体
/// - featured_json: UP 列表 (JSON 数组, 每项含 outcome_key 与 tier)
/// - pool_json: 卡池专属目录 (outcome_key 数组); NULL 或过滤后为空时回退到完整目录
/// - ends_at: NULL 表示永不过期
/// - 只做软下线 (is_active = false), 历史抽取记录始终可追溯
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "banners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: BannerKind,
    pub featured_json: String,
    pub pool_json: Option<String>,
    pub rate_up_multiplier: f64,
    pub single_cost: i64,
    pub multi_cost: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn expiry(&self) -> Expiry {
        match self.ends_at {
            None => Expiry::Never,
            Some(at) => Expiry::At(at),
        }
    }

    pub fn featured(&self) -> Result<Vec<FeaturedEntry>, serde_json::Error> {
        serde_json::from_str(&self.featured_json)
    }

    pub fn pool_keys(&self) -> Result<Option<Vec<String>>, serde_json::Error> {
        self.pool_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
