use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::player_entity;

/// 管理员为玩家发放主货币 (玩家不存在时自动创建)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GrantCurrencyRequest {
    /// 首次创建玩家时必填
    pub external_id: Option<String>,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerResponse {
    pub id: i64,
    pub external_id: String,
    pub balance: i64,
}

impl From<player_entity::Model> for PlayerResponse {
    fn from(m: player_entity::Model) -> Self {
        PlayerResponse {
            id: m.id,
            external_id: m.external_id,
            balance: m.balance,
        }
    }
}
