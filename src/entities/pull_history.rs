use super::pool_entries::{OutcomeKind, Tier};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 抽取历史: 每个结果一条, 创建后不修改
/// - batch_id: 同一次单抽 / 十连共享
/// - outcome_name 为历史快照 (即使目录后续修改仍可回溯)
/// - is_new_entry: 本条结果首次点亮图鉴的普通或闪光维度
/// - cost: 本条结果分摊的主货币消耗
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pull_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub player_id: i64,
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
