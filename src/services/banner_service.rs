use crate::config::GachaConfig;
use crate::entities::{BannerKind, banner_entity as banners, pool_entry_entity as catalog};
use crate::error::{AppError, AppResult};
use crate::models::{BannerResponse, CreateBannerRequest, FeaturedEntry, UpdateBannerRequest};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// 常驻卡池的固定标识
pub const STANDARD_BANNER_ID: Uuid = Uuid::from_u128(0x5f1a_0c2e_9d4b_4c7a_8e3f_000000000001);

/// 判断卡池当前是否可抽取 (不修改任何状态)
///
/// 过期判断优先于 is_active: 已过期的卡池无论是否已被下线都返回 BannerExpired。
pub fn check_drawable(banner: &banners::Model, now: DateTime<Utc>) -> AppResult<()> {
    if banner.expiry().has_passed(now) {
        return Err(AppError::BannerExpired(banner.id.to_string()));
    }
    if !banner.is_active {
        return Err(AppError::BannerInactive(banner.id.to_string()));
    }
    if now < banner.starts_at {
        return Err(AppError::BannerNotStarted(banner.id.to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BannerService {
    pool: DatabaseConnection,
    config: GachaConfig,
}

impl BannerService {
    pub fn new(pool: DatabaseConnection, config: GachaConfig) -> Self {
        Self { pool, config }
    }

    /// 常驻卡池在首次访问时创建
    pub async fn ensure_standard_banner(&self) -> AppResult<banners::Model> {
        if let Some(b) = banners::Entity::find_by_id(STANDARD_BANNER_ID)
            .one(&self.pool)
            .await?
        {
            return Ok(b);
        }

        let now = Utc::now();
        let am = banners::ActiveModel {
            id: Set(STANDARD_BANNER_ID),
            name: Set("Standard Banner".to_string()),
            description: Set(Some("Permanent banner without rate-up".to_string())),
            kind: Set(BannerKind::Standard),
            featured_json: Set("[]".to_string()),
            pool_json: Set(None),
            rate_up_multiplier: Set(1.0),
            single_cost: Set(self.config.standard_single_cost),
            multi_cost: Set(self.config.standard_multi_cost),
            starts_at: Set(DateTime::<Utc>::UNIX_EPOCH),
            ends_at: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        banners::Entity::insert(am)
            .on_conflict(
                OnConflict::column(banners::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;
        log::info!("Standard banner {STANDARD_BANNER_ID} initialised");

        banners::Entity::find_by_id(STANDARD_BANNER_ID)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::InternalError("Standard banner missing after insert".into()))
    }

    async fn find_banner(&self, banner_id: Uuid) -> AppResult<banners::Model> {
        if banner_id == STANDARD_BANNER_ID {
            return self.ensure_standard_banner().await;
        }
        banners::Entity::find_by_id(banner_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::BannerNotFound(banner_id.to_string()))
    }

    /// 读取可抽取的卡池; 过期但仍标记为 active 的卡池在此被下线 (独立提交)
    pub async fn get_drawable(
        &self,
        banner_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<banners::Model> {
        let banner = self.find_banner(banner_id).await?;
        if let Err(e) = check_drawable(&banner, now) {
            if matches!(e, AppError::BannerExpired(_)) && banner.is_active {
                self.deactivate_if_expired(banner.id, now).await?;
            }
            return Err(e);
        }
        Ok(banner)
    }

    /// 事务内复核 (不做下线)
    pub async fn recheck<C: ConnectionTrait>(
        conn: &C,
        banner_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<banners::Model> {
        let banner = banners::Entity::find_by_id(banner_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::BannerNotFound(banner_id.to_string()))?;
        check_drawable(&banner, now)?;
        Ok(banner)
    }

    async fn deactivate_if_expired(&self, banner_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = banners::Entity::update_many()
            .col_expr(banners::Column::IsActive, Expr::value(false))
            .col_expr(banners::Column::UpdatedAt, Expr::value(now))
            .filter(banners::Column::Id.eq(banner_id))
            .filter(banners::Column::IsActive.eq(true))
            .filter(banners::Column::EndsAt.is_not_null())
            .filter(banners::Column::EndsAt.lte(now))
            .exec(&self.pool)
            .await?;
        if result.rows_affected > 0 {
            log::info!("Banner {banner_id} expired and was deactivated");
        }
        Ok(result.rows_affected > 0)
    }

    /// 后台任务: 批量下线所有已过期的卡池
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = banners::Entity::update_many()
            .col_expr(banners::Column::IsActive, Expr::value(false))
            .col_expr(banners::Column::UpdatedAt, Expr::value(now))
            .filter(banners::Column::IsActive.eq(true))
            .filter(banners::Column::EndsAt.is_not_null())
            .filter(banners::Column::EndsAt.lte(now))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }

    /// 当前可抽取的卡池列表 (常驻卡池在前)
    pub async fn list_drawable(&self, now: DateTime<Utc>) -> AppResult<Vec<BannerResponse>> {
        self.ensure_standard_banner().await?;
        let list = banners::Entity::find()
            .filter(banners::Column::IsActive.eq(true))
            .filter(banners::Column::StartsAt.lte(now))
            .order_by_asc(banners::Column::Kind)
            .order_by_asc(banners::Column::StartsAt)
            .all(&self.pool)
            .await?;
        let mut out: Vec<BannerResponse> = Vec::with_capacity(list.len());
        for b in list.into_iter().filter(|b| !b.expiry().has_passed(now)) {
            out.push(b.try_into()?);
        }
        out.sort_by_key(|b| b.kind != BannerKind::Standard);
        Ok(out)
    }

    pub async fn get_banner(&self, banner_id: Uuid) -> AppResult<BannerResponse> {
        self.find_banner(banner_id).await?.try_into()
    }

    /// 可抽取目录 (is_active = true)
    pub async fn active_catalog<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<catalog::Model>> {
        Ok(catalog::Entity::find()
            .filter(catalog::Column::IsActive.eq(true))
            .order_by_asc(catalog::Column::Tier)
            .order_by_asc(catalog::Column::OutcomeKey)
            .all(conn)
            .await?)
    }

    async fn validate_featured(&self, featured: &[FeaturedEntry]) -> AppResult<()> {
        let catalog = Self::active_catalog(&self.pool).await?;
        let by_key: HashMap<&str, &catalog::Model> = catalog
            .iter()
            .map(|m| (m.outcome_key.as_str(), m))
            .collect();
        let mut seen = HashSet::new();
        for f in featured {
            if !seen.insert(f.outcome_key.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Featured entry {} listed twice",
                    f.outcome_key
                )));
            }
            match by_key.get(f.outcome_key.as_str()) {
                None => {
                    return Err(AppError::ValidationError(format!(
                        "Featured entry {} is not in the catalog",
                        f.outcome_key
                    )));
                }
                Some(m) if m.tier != f.tier => {
                    return Err(AppError::ValidationError(format!(
                        "Featured entry {} is {} in the catalog, not {}",
                        f.outcome_key, m.tier, f.tier
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub async fn create_banner(&self, req: &CreateBannerRequest) -> AppResult<BannerResponse> {
        req.validate()?;
        if req.featured.is_empty() {
            return Err(AppError::ValidationError(
                "Limited banners need at least one featured entry".into(),
            ));
        }
        self.validate_featured(&req.featured).await?;

        let now = Utc::now();
        let starts_at = req.starts_at.unwrap_or(now);
        if req.ends_at.is_some_and(|end| end <= starts_at) {
            return Err(AppError::ValidationError(
                "ends_at must be after starts_at".into(),
            ));
        }

        let pool_json = req
            .pool_keys
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let created = banners::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(req.name.trim().to_string()),
            description: Set(req.description.clone()),
            kind: Set(BannerKind::Limited),
            featured_json: Set(serde_json::to_string(&req.featured)?),
            pool_json: Set(pool_json),
            rate_up_multiplier: Set(req
                .rate_up_multiplier
                .unwrap_or(self.config.default_rate_up_multiplier)),
            single_cost: Set(req.single_cost),
            multi_cost: Set(req.multi_cost),
            starts_at: Set(starts_at),
            ends_at: Set(req.ends_at),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Banner {} created: {}", created.id, created.name);
        created.try_into()
    }

    pub async fn update_banner(
        &self,
        banner_id: Uuid,
        req: &UpdateBannerRequest,
    ) -> AppResult<BannerResponse> {
        req.validate()?;
        let banner = self.find_banner(banner_id).await?;

        if banner.kind == BannerKind::Standard {
            if req.ends_at.is_some() {
                return Err(AppError::ValidationError(
                    "The standard banner cannot be given an end date".into(),
                ));
            }
            if req.featured.as_ref().is_some_and(|f| !f.is_empty())
                || req.rate_up_multiplier.is_some_and(|m| m != 1.0)
            {
                return Err(AppError::ValidationError(
                    "The standard banner has no rate-up".into(),
                ));
            }
        }
        if let Some(featured) = &req.featured {
            self.validate_featured(featured).await?;
        }
        if let Some(end) = req.ends_at {
            if end <= banner.starts_at {
                return Err(AppError::ValidationError(
                    "ends_at must be after starts_at".into(),
                ));
            }
        }

        let mut am = banner.into_active_model();
        if let Some(name) = &req.name {
            am.name = Set(name.trim().to_string());
        }
        if let Some(desc) = &req.description {
            am.description = Set(Some(desc.clone()));
        }
        if let Some(featured) = &req.featured {
            am.featured_json = Set(serde_json::to_string(featured)?);
        }
        if let Some(m) = req.rate_up_multiplier {
            am.rate_up_multiplier = Set(m);
        }
        if let Some(c) = req.single_cost {
            am.single_cost = Set(c);
        }
        if let Some(c) = req.multi_cost {
            am.multi_cost = Set(c);
        }
        if let Some(end) = req.ends_at {
            am.ends_at = Set(Some(end));
        }
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;

        log::info!("Banner {banner_id} updated");
        updated.try_into()
    }

    pub async fn deactivate_banner(&self, banner_id: Uuid) -> AppResult<BannerResponse> {
        if banner_id == STANDARD_BANNER_ID {
            return Err(AppError::ValidationError(
                "The standard banner cannot be deactivated".into(),
            ));
        }
        let banner = self.find_banner(banner_id).await?;
        let mut am = banner.into_active_model();
        am.is_active = Set(false);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;
        log::info!("Banner {banner_id} deactivated by admin");
        updated.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn banner(starts: DateTime<Utc>, ends: Option<DateTime<Utc>>, active: bool) -> banners::Model {
        banners::Model {
            id: Uuid::new_v4(),
            name: "test".into(),
            description: None,
            kind: BannerKind::Limited,
            featured_json: "[]".into(),
            pool_json: None,
            rate_up_multiplier: 2.0,
            single_cost: 160,
            multi_cost: 1600,
            starts_at: starts,
            ends_at: ends,
            is_active: active,
            created_at: starts,
            updated_at: starts,
        }
    }

    #[test]
    fn test_drawable_window() {
        let now = Utc::now();
        let hour = Duration::hours(1);

        assert!(check_drawable(&banner(now - hour, None, true), now).is_ok());
        assert!(check_drawable(&banner(now - hour, Some(now + hour), true), now).is_ok());

        let err = check_drawable(&banner(now + hour, None, true), now).unwrap_err();
        assert_eq!(err.code(), "BANNER_NOT_STARTED");

        let err = check_drawable(&banner(now - hour, None, false), now).unwrap_err();
        assert_eq!(err.code(), "BANNER_INACTIVE");
    }

    #[test]
    fn test_expired_reported_before_inactive() {
        let now = Utc::now();
        let expired = banner(now - Duration::days(2), Some(now - Duration::days(1)), true);
        assert_eq!(
            check_drawable(&expired, now).unwrap_err().code(),
            "BANNER_EXPIRED"
        );
        let deactivated = banners::Model {
            is_active: false,
            ..expired
        };
        assert_eq!(
            check_drawable(&deactivated, now).unwrap_err().code(),
            "BANNER_EXPIRED"
        );
    }

    #[test]
    fn test_end_boundary_is_exclusive() {
        let now = Utc::now();
        let b = banner(now - Duration::hours(1), Some(now), true);
        assert!(check_drawable(&b, now).is_err());
    }
}
