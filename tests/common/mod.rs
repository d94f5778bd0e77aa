#![allow(dead_code)]

use gacha_engine::config::{GachaConfig, IdempotencyConfig, StardustConfig};
use gacha_engine::entities::Tier;
use gacha_engine::gacha::{SecureRandomSource, SeededRandomSource};
use gacha_engine::models::{CreateBannerRequest, FeaturedEntry, GrantCurrencyRequest};
use gacha_engine::services::*;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use uuid::Uuid;

/// 每个测试一个独立的内存库; 单连接保证所有查询看到同一个库
pub async fn setup_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub fn test_gacha_config() -> GachaConfig {
    GachaConfig {
        shiny_rate: 0.0,
        ..GachaConfig::default()
    }
}

pub struct Services {
    pub db: DatabaseConnection,
    pub players: PlayerService,
    pub banners: BannerService,
    pub targets: TargetPathService,
    pub collection: CollectionService,
    pub delivery: DeliveryService,
    pub stardust: StardustService,
    pub idempotency: IdempotencyService,
    pub history: HistoryService,
    pub pulls: PullService,
}

impl Services {
    pub async fn new(gacha: GachaConfig) -> Self {
        Self::with_rng(gacha, Arc::new(SeededRandomSource::new(7))).await
    }

    pub async fn with_rng(gacha: GachaConfig, rng: Arc<dyn SecureRandomSource>) -> Self {
        let db = setup_db().await;
        let banners = BannerService::new(db.clone(), gacha.clone());
        let pity = PityService::new(db.clone(), gacha.clone());
        let stardust = StardustService::new(db.clone(), StardustConfig::default());
        let idempotency = IdempotencyService::new(db.clone(), IdempotencyConfig::default());
        banners
            .ensure_standard_banner()
            .await
            .expect("standard banner");
        let pulls = PullService::new(
            db.clone(),
            gacha.clone(),
            banners.clone(),
            pity,
            stardust.clone(),
            idempotency.clone(),
            rng,
        );
        Self {
            players: PlayerService::new(db.clone()),
            targets: TargetPathService::new(db.clone(), gacha),
            collection: CollectionService::new(db.clone()),
            delivery: DeliveryService::new(db.clone()),
            history: HistoryService::new(db.clone()),
            banners,
            stardust,
            idempotency,
            pulls,
            db,
        }
    }

    pub async fn player(&self, id: i64, balance: i64) {
        self.players
            .grant_currency(
                id,
                &GrantCurrencyRequest {
                    external_id: Some(format!("ext-{id}")),
                    amount: balance,
                },
            )
            .await
            .expect("grant currency");
    }

    /// 只含一个神话 UP 的限定池: 每一抽都是 mew
    pub async fn single_entry_banner(&self) -> Uuid {
        self.limited_banner(&[("mew", Tier::Mythic)], &["mew"]).await
    }

    /// 限定池: featured 为 UP 条目, pool_keys 限定卡池目录 (UP 条目总是包含在内)
    pub async fn limited_banner(&self, featured: &[(&str, Tier)], pool_keys: &[&str]) -> Uuid {
        self.banners
            .create_banner(&CreateBannerRequest {
                name: format!("Limited {}", featured[0].0),
                description: None,
                featured: featured
                    .iter()
                    .map(|(key, tier)| FeaturedEntry {
                        outcome_key: key.to_string(),
                        tier: *tier,
                    })
                    .collect(),
                pool_keys: Some(pool_keys.iter().map(|k| k.to_string()).collect()),
                rate_up_multiplier: None,
                single_cost: 100,
                multi_cost: 1000,
                starts_at: None,
                ends_at: None,
            })
            .await
            .expect("create banner")
            .id
    }
}
