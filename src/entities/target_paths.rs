use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 定轨记录 (player_id, banner_id)
/// fate_points 取值 [0, max_fate_points]; 更换目标或抽到目标时归零
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "target_paths")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub player_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub banner_id: Uuid,
    pub target_key: String,
    pub fate_points: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
