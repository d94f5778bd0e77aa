use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 图鉴记录: 普通与闪光分别记录首次获得时间。
/// 重复获得不会修改此记录 (转换为星尘)。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "collection_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub player_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub outcome_key: String,
    pub has_normal: bool,
    pub has_variant: bool,
    pub normal_obtained_at: Option<DateTime<Utc>>,
    pub variant_obtained_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn owns(&self, variant: bool) -> bool {
        if variant {
            self.has_variant
        } else {
            self.has_normal
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
