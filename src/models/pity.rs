use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::FeaturedGuarantee;

/// 保底状态查询响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PityStatusResponse {
    pub banner_id: Uuid,
    pub pulls_since_top: i32,
    pub pulls_since_second: i32,
    pub soft_pity_active: bool,
    pub pulls_until_hard_pity: i32,
    /// 下一抽出 Legendary 及以上的概率 (0..=1)
    pub top_tier_chance: f64,
    pub featured_guarantee: FeaturedGuarantee,
    pub lifetime_pulls: i64,
    pub lifetime_spend: i64,
}
