use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 玩家主货币钱包
/// - id 由外部系统分配 (非自增)
/// - external_id: 游戏端身份, 发放代理按此轮询待发放奖励
/// - balance: 主货币余额, 永不为负 (扣减使用 WHERE balance >= cost)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    #[sea_orm(unique)]
    pub external_id: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
