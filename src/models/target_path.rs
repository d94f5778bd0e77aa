use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetTargetRequest {
    pub outcome_key: String,
}

/// 定轨状态
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TargetPathResponse {
    pub banner_id: Uuid,
    pub target_key: String,
    pub fate_points: i32,
    pub max_fate_points: i32,
    /// 点数已满, 下一次落在该层级必定为目标
    pub will_force: bool,
}
