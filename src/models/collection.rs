use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::collection_entry_entity;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CollectionEntryResponse {
    pub outcome_key: String,
    pub has_normal: bool,
    pub has_variant: bool,
    pub normal_obtained_at: Option<DateTime<Utc>>,
    pub variant_obtained_at: Option<DateTime<Utc>>,
}

impl From<collection_entry_entity::Model> for CollectionEntryResponse {
    fn from(m: collection_entry_entity::Model) -> Self {
        CollectionEntryResponse {
            outcome_key: m.outcome_key,
            has_normal: m.has_normal,
            has_variant: m.has_variant,
            normal_obtained_at: m.normal_obtained_at,
            variant_obtained_at: m.variant_obtained_at,
        }
    }
}

/// 图鉴汇总
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub player_id: i64,
    pub entries: Vec<CollectionEntryResponse>,
    pub normal_count: usize,
    pub variant_count: usize,
    /// 目录中可收集 (精灵) 条目总数
    pub catalog_size: usize,
}

/// register_outcome 的结果: 本次新完成的维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnershipChange {
    pub new_normal: bool,
    pub new_variant: bool,
}

impl OwnershipChange {
    pub fn is_new(&self) -> bool {
        self.new_normal || self.new_variant
    }
}
