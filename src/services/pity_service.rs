use crate::config::GachaConfig;
use crate::entities::{FeaturedGuarantee, pity_record_entity as pity};
use crate::error::{AppError, AppResult};
use crate::gacha::{PityCounters, TierWeights};
use crate::models::PityStatusResponse;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QuerySelect, Set,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct PityService {
    pool: DatabaseConnection,
    config: GachaConfig,
}

pub fn counters_of(record: &pity::Model) -> PityCounters {
    PityCounters::new(
        record.pulls_since_top.max(0) as u32,
        record.pulls_since_second.max(0) as u32,
    )
}

impl PityService {
    pub fn new(pool: DatabaseConnection, config: GachaConfig) -> Self {
        Self { pool, config }
    }

    /// 读取 (不加锁) 保底状态; `base` 为当前卡池的层级权重
    pub async fn get_status(
        &self,
        player_id: i64,
        banner_id: Uuid,
        base: TierWeights,
    ) -> AppResult<PityStatusResponse> {
        let record = pity::Entity::find_by_id((player_id, banner_id))
            .one(&self.pool)
            .await?;
        let counters = record.as_ref().map(counters_of).unwrap_or_default();
        let rules = &self.config.pity;

        Ok(PityStatusResponse {
            banner_id,
            pulls_since_top: counters.pulls_since_top as i32,
            pulls_since_second: counters.pulls_since_second as i32,
            soft_pity_active: rules.soft_pity_active(counters),
            pulls_until_hard_pity: rules.pulls_until_hard_pity(counters) as i32,
            top_tier_chance: rules.top_tier_chance(base, counters),
            featured_guarantee: record
                .as_ref()
                .map(|r| r.featured_guarantee)
                .unwrap_or(FeaturedGuarantee::CoinFlip),
            lifetime_pulls: record.as_ref().map(|r| r.lifetime_pulls).unwrap_or(0),
            lifetime_spend: record.as_ref().map(|r| r.lifetime_spend).unwrap_or(0),
        })
    }

    /// 确保记录存在并加行锁 (SELECT ... FOR UPDATE)
    pub async fn lock_record<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        banner_id: Uuid,
    ) -> AppResult<pity::Model> {
        let am = pity::ActiveModel {
            player_id: Set(player_id),
            banner_id: Set(banner_id),
            pulls_since_top: Set(0),
            pulls_since_second: Set(0),
            featured_guarantee: Set(FeaturedGuarantee::CoinFlip),
            lifetime_pulls: Set(0),
            lifetime_spend: Set(0),
            updated_at: Set(Utc::now()),
        };
        pity::Entity::insert(am)
            .on_conflict(
                OnConflict::columns([pity::Column::PlayerId, pity::Column::BannerId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        pity::Entity::find_by_id((player_id, banner_id))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| AppError::InternalError("Pity record missing after insert".into()))
    }

    /// 写回一个批次结束后的计数
    pub async fn save<C: ConnectionTrait>(
        conn: &C,
        record: pity::Model,
        counters: PityCounters,
        guarantee: FeaturedGuarantee,
        pulls: i64,
        spend: i64,
    ) -> AppResult<pity::Model> {
        let lifetime_pulls = record.lifetime_pulls + pulls;
        let lifetime_spend = record.lifetime_spend + spend;
        let mut am = record.into_active_model();
        am.pulls_since_top = Set(counters.pulls_since_top as i32);
        am.pulls_since_second = Set(counters.pulls_since_second as i32);
        am.featured_guarantee = Set(guarantee);
        am.lifetime_pulls = Set(lifetime_pulls);
        am.lifetime_spend = Set(lifetime_spend);
        am.updated_at = Set(Utc::now());
        Ok(am.update(conn).await?)
    }
}
