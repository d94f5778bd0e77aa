use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{BannerKind, Tier, banner_entity};
use crate::error::{AppError, AppResult};

/// UP 条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeaturedEntry {
    pub outcome_key: String,
    pub tier: Tier,
}

/// 卡池结束时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
}

impl Expiry {
    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(at) => now >= *at,
        }
    }
}

/// 构建卡池所需的卡池信息 (已解析 JSON 字段)
#[derive(Debug, Clone, PartialEq)]
pub struct BannerDefinition {
    pub id: Uuid,
    pub kind: BannerKind,
    pub featured: Vec<FeaturedEntry>,
    /// None = 使用完整目录
    pub pool_keys: Option<Vec<String>>,
    pub rate_up_multiplier: f64,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&banner_entity::Model> for BannerDefinition {
    type Error = AppError;

    fn try_from(m: &banner_entity::Model) -> AppResult<Self> {
        Ok(BannerDefinition {
            id: m.id,
            kind: m.kind,
            featured: m.featured()?,
            pool_keys: m.pool_keys()?,
            rate_up_multiplier: m.rate_up_multiplier,
            updated_at: m.updated_at,
        })
    }
}

/// 卡池响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BannerResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: BannerKind,
    pub featured: Vec<FeaturedEntry>,
    pub rate_up_multiplier: f64,
    pub single_cost: i64,
    pub multi_cost: i64,
    pub starts_at: DateTime<Utc>,
    /// null = 永不过期
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl TryFrom<banner_entity::Model> for BannerResponse {
    type Error = AppError;

    fn try_from(m: banner_entity::Model) -> AppResult<Self> {
        let featured = m.featured()?;
        Ok(BannerResponse {
            id: m.id,
            name: m.name,
            description: m.description,
            kind: m.kind,
            featured,
            rate_up_multiplier: m.rate_up_multiplier,
            single_cost: m.single_cost,
            multi_cost: m.multi_cost,
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            is_active: m.is_active,
        })
    }
}

/// 创建限定卡池请求 (常驻卡池由系统自动创建)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBannerRequest {
    pub name: String,
    pub description: Option<String>,
    pub featured: Vec<FeaturedEntry>,
    /// 卡池专属目录; 省略时使用完整目录
    pub pool_keys: Option<Vec<String>>,
    /// 默认 2.0
    pub rate_up_multiplier: Option<f64>,
    pub single_cost: i64,
    pub multi_cost: i64,
    /// 默认为当前时间
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl CreateBannerRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Banner name is required".into()));
        }
        if self.single_cost <= 0 || self.multi_cost <= 0 {
            return Err(AppError::ValidationError(
                "Banner costs must be positive".into(),
            ));
        }
        if self
            .rate_up_multiplier
            .is_some_and(|m| !m.is_finite() || m < 1.0)
        {
            return Err(AppError::ValidationError(
                "rate_up_multiplier must be >= 1".into(),
            ));
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            if end <= start {
                return Err(AppError::ValidationError(
                    "ends_at must be after starts_at".into(),
                ));
            }
        }
        Ok(())
    }
}

/// 更新卡池请求 (仅修改提供的字段)
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBannerRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub featured: Option<Vec<FeaturedEntry>>,
    pub rate_up_multiplier: Option<f64>,
    pub single_cost: Option<i64>,
    pub multi_cost: Option<i64>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl UpdateBannerRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::ValidationError("Banner name is required".into()));
        }
        if self.single_cost.is_some_and(|c| c <= 0) || self.multi_cost.is_some_and(|c| c <= 0) {
            return Err(AppError::ValidationError(
                "Banner costs must be positive".into(),
            ));
        }
        if self
            .rate_up_multiplier
            .is_some_and(|m| !m.is_finite() || m < 1.0)
        {
            return Err(AppError::ValidationError(
                "rate_up_multiplier must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
