use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveActiveEnum, EnumIter)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum IdempotencyStatus {
    #[sea_orm(string_value = "in_flight")]
    InFlight,
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// 幂等记录
/// - in_flight: 已占用令牌, 事务尚未提交 (created_at + lease 之后视为遗弃)
/// - completed: response 为首次成功执行的完整响应 (JSON 文本), expires_at 之前原样返回
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "idempotency_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub player_id: i64,
    pub banner_id: Uuid,
    pub operation: String,
    pub status: IdempotencyStatus,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
