use crate::config::GachaConfig;
use crate::entities::{
    RewardKind, RewardSource, banner_entity as banners, pull_history_entity as history,
};
use crate::error::{AppError, AppResult};
use crate::gacha::{
    DrawContext, DrawResult, DrawState, Outcome, PoolBuilder, PoolSnapshot, SecureRandomSource,
    resolve_draw,
};
use crate::models::{
    BannerDefinition, LedgerDelta, OwnershipChange, PityState, PityStatusResponse, PullKind,
    PullResponse, PulledOutcome,
};
use crate::services::pity_service::counters_of;
use crate::services::target_path_service::as_path;
use crate::services::{
    BannerService, CollectionService, DeliveryService, IdempotencyService, NewReward, PityService,
    PlayerService, STANDARD_BANNER_ID, StardustService, TargetPathService, TokenClaim,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 序列化失败 / 死锁等可重试的存储冲突
pub fn is_transient(err: &DbErr) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    ["40001", "40p01", "could not serialize", "deadlock", "database is locked"]
        .iter()
        .any(|needle| msg.contains(needle))
}

/// 将批次总价分摊到每个结果, 余数分给前几个结果 (总和恒等于 cost)
pub fn split_cost(cost: i64, count: usize) -> Vec<i64> {
    if count == 0 {
        return Vec::new();
    }
    let n = count as i64;
    let base = cost / n;
    let remainder = (cost % n) as usize;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

#[derive(Clone)]
pub struct PullService {
    pool: DatabaseConnection,
    config: GachaConfig,
    banner_service: BannerService,
    pity_service: PityService,
    stardust_service: StardustService,
    idempotency_service: IdempotencyService,
    duplicate_token_amount: i64,
    rng: Arc<dyn SecureRandomSource>,
}

impl PullService {
    pub fn new(
        pool: DatabaseConnection,
        config: GachaConfig,
        banner_service: BannerService,
        pity_service: PityService,
        stardust_service: StardustService,
        idempotency_service: IdempotencyService,
        rng: Arc<dyn SecureRandomSource>,
    ) -> Self {
        let duplicate_token_amount = stardust_service.config().duplicate_token_amount;
        Self {
            pool,
            config,
            banner_service,
            pity_service,
            stardust_service,
            idempotency_service,
            duplicate_token_amount,
            rng,
        }
    }

    fn builder(&self) -> PoolBuilder {
        PoolBuilder::new(self.config.tier_rates, self.config.item_multiplier)
    }

    async fn snapshot(&self, banner: &banners::Model) -> AppResult<PoolSnapshot> {
        let catalog = BannerService::active_catalog(&self.pool).await?;
        let definition = BannerDefinition::try_from(banner)?;
        self.builder().build(&definition, &catalog)
    }

    /// 单抽
    pub async fn pull(
        &self,
        player_id: i64,
        banner_id: Uuid,
        token: &str,
    ) -> AppResult<PullResponse> {
        self.execute(player_id, banner_id, token, PullKind::Single)
            .await
    }

    /// 十连 (批次大小由配置决定)
    pub async fn multi_pull(
        &self,
        player_id: i64,
        banner_id: Uuid,
        token: &str,
    ) -> AppResult<PullResponse> {
        self.execute(player_id, banner_id, token, PullKind::Multi)
            .await
    }

    pub async fn pity_status(
        &self,
        player_id: i64,
        banner_id: Uuid,
    ) -> AppResult<PityStatusResponse> {
        let banner = if banner_id == STANDARD_BANNER_ID {
            self.banner_service.ensure_standard_banner().await?
        } else {
            banners::Entity::find_by_id(banner_id)
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::BannerNotFound(banner_id.to_string()))?
        };
        let snapshot = self.snapshot(&banner).await?;
        self.pity_service
            .get_status(player_id, banner_id, snapshot.tier_weights())
            .await
    }

    async fn execute(
        &self,
        player_id: i64,
        banner_id: Uuid,
        token: &str,
        kind: PullKind,
    ) -> AppResult<PullResponse> {
        let claim = self
            .idempotency_service
            .claim(token, player_id, banner_id, kind.operation(), Utc::now())
            .await?;
        if let TokenClaim::Replay(body) = claim {
            log::info!("Replaying {} for player {player_id} (key {token})", kind.operation());
            return Ok(serde_json::from_str(&body)?);
        }

        let result = self
            .execute_with_retry(player_id, banner_id, token, kind)
            .await;
        if result.is_err() {
            if let Err(e) = self.idempotency_service.release(token).await {
                log::error!("Failed to release idempotency key {token}: {e}");
            }
        }
        result
    }

    async fn execute_with_retry(
        &self,
        player_id: i64,
        banner_id: Uuid,
        token: &str,
        kind: PullKind,
    ) -> AppResult<PullResponse> {
        let mut attempt: u32 = 0;
        loop {
            match self.execute_batch(player_id, banner_id, token, kind).await {
                Err(AppError::DatabaseError(e))
                    if attempt < self.config.max_transaction_retries && is_transient(&e) =>
                {
                    attempt += 1;
                    log::warn!("Transient store conflict on pull (attempt {attempt}): {e}");
                    tokio::time::sleep(std::time::Duration::from_millis(20 * u64::from(attempt)))
                        .await;
                }
                other => return other,
            }
        }
    }

    /// 一个批次的全部经济效果在同一事务内提交
    async fn execute_batch(
        &self,
        player_id: i64,
        banner_id: Uuid,
        token: &str,
        kind: PullKind,
    ) -> AppResult<PullResponse> {
        let now = Utc::now();

        // 事务外: 卡池校验 (过期下线独立提交) 与卡池快照
        let banner = self.banner_service.get_drawable(banner_id, now).await?;
        let snapshot = self.snapshot(&banner).await?;

        let (count, cost) = match kind {
            PullKind::Single => (1usize, banner.single_cost),
            PullKind::Multi => (self.config.multi_pull_size as usize, banner.multi_cost),
        };

        let txn = self.pool.begin().await?;

        BannerService::recheck(&txn, banner_id, now).await?;
        let player = PlayerService::debit(&txn, player_id, cost).await?;

        let pity_record = PityService::lock_record(&txn, player_id, banner_id).await?;
        let target_record = TargetPathService::lock(&txn, player_id, banner_id).await?;

        let mut state = DrawState {
            counters: counters_of(&pity_record),
            guarantee: pity_record.featured_guarantee,
            target: target_record.as_ref().map(as_path),
        };
        let ctx = DrawContext {
            pool: &snapshot,
            pity: &self.config.pity,
            max_fate_points: self.config.max_fate_points,
            featured_win_rate: self.config.featured_win_rate,
            shiny_rate: self.config.shiny_rate,
        };

        let batch_id = Uuid::new_v4();
        let shares = split_cost(cost, count);
        let mut outcomes = Vec::with_capacity(count);
        let mut stardust_earned = 0i64;

        for share in shares {
            let draw = resolve_draw(&ctx, &mut state, self.rng.as_ref())?;
            let was_duplicate =
                CollectionService::is_duplicate(&txn, player_id, &draw.outcome, draw.is_variant)
                    .await?;

            let mut earned = 0;
            let mut ownership = OwnershipChange::default();
            if was_duplicate {
                let credit = self
                    .stardust_service
                    .credit_for_duplicate(
                        &txn,
                        player_id,
                        draw.tier,
                        draw.is_variant,
                        draw.outcome.key(),
                    )
                    .await?;
                earned = credit.amount;
            } else if draw.outcome.is_collectible() {
                ownership = CollectionService::register_outcome(
                    &txn,
                    player_id,
                    draw.outcome.key(),
                    draw.is_variant,
                    now,
                )
                .await?;
            }
            stardust_earned += earned;

            let (reward_kind, quantity) = match (&draw.outcome, was_duplicate) {
                (_, true) => (RewardKind::DuplicateToken, self.duplicate_token_amount),
                (Outcome::Creature { .. }, false) => (RewardKind::Creature, 1),
                (Outcome::Item { .. }, false) => (RewardKind::Item, 1),
            };
            DeliveryService::enqueue(
                &txn,
                NewReward {
                    player_id,
                    external_player_id: player.external_id.clone(),
                    batch_id: Some(batch_id),
                    source: RewardSource::Pull,
                    reward_kind,
                    outcome_key: draw.outcome.key().to_string(),
                    outcome_name: draw.outcome.name().to_string(),
                    is_variant: draw.is_variant,
                    quantity,
                },
                now,
            )
            .await?;

            Self::record_history(
                &txn,
                batch_id,
                player_id,
                banner_id,
                &draw,
                was_duplicate,
                ownership.is_new(),
                earned,
                share,
                now,
            )
            .await?;

            outcomes.push(PulledOutcome {
                kind: draw.outcome.kind(),
                outcome_key: draw.outcome.key().to_string(),
                name: draw.outcome.name().to_string(),
                tier: draw.tier,
                is_variant: draw.is_variant,
                is_featured: draw.is_featured,
                was_duplicate,
                is_new_entry: ownership.is_new(),
                stardust_earned: earned,
            });
        }

        let saved_pity = PityService::save(
            &txn,
            pity_record,
            state.counters,
            state.guarantee,
            count as i64,
            cost,
        )
        .await?;
        if let (Some(record), Some(path)) = (target_record, state.target.as_ref()) {
            TargetPathService::save_progress(&txn, record, path.fate_points).await?;
        }

        let new_stardust_balance = StardustService::balance(&txn, player_id).await?;
        let response = PullResponse {
            batch_id,
            banner_id,
            outcomes,
            pity_state: PityState {
                pulls_since_top: saved_pity.pulls_since_top,
                pulls_since_second: saved_pity.pulls_since_second,
                featured_guarantee: saved_pity.featured_guarantee,
                pulls_until_hard_pity: self.config.pity.pulls_until_hard_pity(state.counters)
                    as i32,
                target_key: state.target.as_ref().map(|t| t.target_key.clone()),
                fate_points: state.target.as_ref().map(|t| t.fate_points as i32),
            },
            ledger_delta: LedgerDelta {
                currency_spent: cost,
                stardust_earned,
            },
            new_balance: player.balance,
            new_stardust_balance,
        };

        let body = serde_json::to_string(&response)?;
        self.idempotency_service
            .complete(&txn, token, &body, now)
            .await?;

        txn.commit().await?;

        log::info!(
            "Player {player_id} pulled {count} on banner {banner_id} (batch {batch_id}, pool v{:x}, cost {cost}, stardust +{stardust_earned})",
            snapshot.version()
        );
        Ok(response)
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_history(
        txn: &DatabaseTransaction,
        batch_id: Uuid,
        player_id: i64,
        banner_id: Uuid,
        draw: &DrawResult,
        was_duplicate: bool,
        is_new_entry: bool,
        stardust_earned: i64,
        cost: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let am = history::ActiveModel {
            id: Set(Uuid::new_v4()),
            batch_id: Set(batch_id),
            player_id: Set(player_id),
            banner_id: Set(banner_id),
            tier: Set(draw.tier),
            outcome_kind: Set(draw.outcome.kind()),
            outcome_key: Set(draw.outcome.key().to_string()),
            outcome_name: Set(draw.outcome.name().to_string()),
            is_variant: Set(draw.is_variant),
            is_featured: Set(draw.is_featured),
            was_duplicate: Set(was_duplicate),
            is_new_entry: Set(is_new_entry),
            stardust_earned: Set(stardust_earned),
            cost: Set(cost),
            created_at: Set(now),
        };
        history::Entity::insert(am)
            .exec_without_returning(txn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cost_conserves_total() {
        assert_eq!(split_cost(1600, 10), vec![160; 10]);
        let shares = split_cost(1000, 3);
        assert_eq!(shares, vec![334, 333, 333]);
        assert_eq!(shares.iter().sum::<i64>(), 1000);
        assert!(split_cost(5, 0).is_empty());
    }

    #[test]
    fn test_transient_errors_are_detected() {
        assert!(is_transient(&DbErr::Custom(
            "error returned from database: could not serialize access".into()
        )));
        assert!(is_transient(&DbErr::Custom("SQLSTATE 40P01 deadlock detected".into())));
        assert!(is_transient(&DbErr::Custom("database is locked".into())));
        assert!(!is_transient(&DbErr::Custom("duplicate key value".into())));
    }
}
