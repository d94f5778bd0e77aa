use crate::config::StardustConfig;
use crate::entities::{
    RewardSource, StardustTransactionType, Tier, stardust_account_entity as accounts,
    stardust_transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, RedeemRequest, RedeemResponse, SHOP_CATALOG, ShopItem,
    StardustAccountResponse, StardustCredit, StardustTransactionQuery,
    StardustTransactionResponse, find_shop_item,
};
use crate::services::{DeliveryService, NewReward, PlayerService};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

/// 单次兑换数量上限
const MAX_REDEEM_QUANTITY: i64 = 99;

/// 星尘账本: 余额变化与流水在同一事务内写入
#[derive(Clone)]
pub struct StardustService {
    pool: DatabaseConnection,
    config: StardustConfig,
}

impl StardustService {
    pub fn new(pool: DatabaseConnection, config: StardustConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &StardustConfig {
        &self.config
    }

    pub fn shop(&self) -> &'static [ShopItem] {
        SHOP_CATALOG
    }

    pub async fn get_account(&self, player_id: i64) -> AppResult<StardustAccountResponse> {
        let account = accounts::Entity::find_by_id(player_id)
            .one(&self.pool)
            .await?;
        Ok(match account {
            Some(a) => a.into(),
            None => StardustAccountResponse {
                player_id,
                balance: 0,
                lifetime_earned: 0,
                lifetime_spent: 0,
            },
        })
    }

    pub async fn list_transactions(
        &self,
        player_id: i64,
        query: &StardustTransactionQuery,
    ) -> AppResult<PaginatedResponse<StardustTransactionResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let paginator = transactions::Entity::find()
            .filter(transactions::Column::PlayerId.eq(player_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .paginate(&self.pool, params.page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(params.page_index()).await?;
        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    pub async fn balance<C: ConnectionTrait>(conn: &C, player_id: i64) -> AppResult<i64> {
        Ok(accounts::Entity::find_by_id(player_id)
            .one(conn)
            .await?
            .map(|a| a.balance)
            .unwrap_or(0))
    }

    /// 确保账户存在并加行锁
    pub async fn lock_account<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
    ) -> AppResult<accounts::Model> {
        let am = accounts::ActiveModel {
            player_id: Set(player_id),
            balance: Set(0),
            lifetime_earned: Set(0),
            lifetime_spent: Set(0),
            updated_at: Set(Utc::now()),
        };
        accounts::Entity::insert(am)
            .on_conflict(
                OnConflict::column(accounts::Column::PlayerId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        accounts::Entity::find_by_id(player_id)
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| AppError::InternalError("Stardust account missing after insert".into()))
    }

    #[allow(clippy::too_many_arguments)]
    async fn append<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        kind: StardustTransactionType,
        amount: i64,
        balance_after: i64,
        reason: &str,
        item_key: Option<&str>,
        details: serde_json::Value,
    ) -> AppResult<()> {
        let am = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            player_id: Set(player_id),
            transaction_type: Set(kind),
            amount: Set(amount),
            balance_after: Set(balance_after),
            reason: Set(reason.to_string()),
            item_key: Set(item_key.map(str::to_string)),
            details: Set(details.to_string()),
            created_at: Set(Utc::now()),
        };
        transactions::Entity::insert(am)
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    pub async fn credit<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        amount: i64,
        reason: &str,
        details: serde_json::Value,
    ) -> AppResult<StardustCredit> {
        if amount < 0 {
            return Err(AppError::ValidationError(
                "Stardust credit must not be negative".into(),
            ));
        }
        let account = Self::lock_account(conn, player_id).await?;
        if amount == 0 {
            return Ok(StardustCredit {
                amount: 0,
                balance_after: account.balance,
            });
        }

        accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount),
            )
            .col_expr(
                accounts::Column::LifetimeEarned,
                Expr::col(accounts::Column::LifetimeEarned).add(amount),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::PlayerId.eq(player_id))
            .exec(conn)
            .await?;
        let balance_after = Self::balance(conn, player_id).await?;
        Self::append(
            conn,
            player_id,
            StardustTransactionType::Earn,
            amount,
            balance_after,
            reason,
            None,
            details,
        )
        .await?;
        Ok(StardustCredit {
            amount,
            balance_after,
        })
    }

    /// 重复获得的星尘补偿
    pub async fn credit_for_duplicate<C: ConnectionTrait>(
        &self,
        conn: &C,
        player_id: i64,
        tier: Tier,
        variant: bool,
        outcome_key: &str,
    ) -> AppResult<StardustCredit> {
        let amount = self.config.duplicate_value(tier, variant);
        Self::credit(
            conn,
            player_id,
            amount,
            "duplicate",
            json!({ "outcome_key": outcome_key, "tier": tier, "variant": variant }),
        )
        .await
    }

    /// 条件扣减 (WHERE balance >= amount)
    pub async fn debit<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        amount: i64,
        reason: &str,
        item_key: Option<&str>,
        details: serde_json::Value,
    ) -> AppResult<StardustCredit> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Stardust debit must be positive".into(),
            ));
        }
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).sub(amount),
            )
            .col_expr(
                accounts::Column::LifetimeSpent,
                Expr::col(accounts::Column::LifetimeSpent).add(amount),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::PlayerId.eq(player_id))
            .filter(accounts::Column::Balance.gte(amount))
            .exec(conn)
            .await?;
        let balance_after = Self::balance(conn, player_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InsufficientStardust {
                required: amount,
                available: balance_after,
            });
        }
        Self::append(
            conn,
            player_id,
            StardustTransactionType::Spend,
            amount,
            balance_after,
            reason,
            item_key,
            details,
        )
        .await?;
        Ok(StardustCredit {
            amount,
            balance_after,
        })
    }

    /// 已兑换次数 (按带 item_key 的支出流水计数)
    pub async fn purchases_of<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        item_key: &str,
    ) -> AppResult<i64> {
        let n = transactions::Entity::find()
            .filter(transactions::Column::PlayerId.eq(player_id))
            .filter(transactions::Column::TransactionType.eq(StardustTransactionType::Spend))
            .filter(transactions::Column::ItemKey.eq(item_key))
            .count(conn)
            .await?;
        Ok(n as i64)
    }

    /// 商店兑换: 扣减星尘并写入待发放队列 (同一事务)
    pub async fn redeem(&self, player_id: i64, req: &RedeemRequest) -> AppResult<RedeemResponse> {
        let item = find_shop_item(&req.item_key)
            .ok_or_else(|| AppError::NotFound(format!("Shop item {}", req.item_key)))?;
        let quantity = req.quantity.unwrap_or(1);
        if !(1..=MAX_REDEEM_QUANTITY).contains(&quantity) {
            return Err(AppError::ValidationError(format!(
                "Quantity must be between 1 and {MAX_REDEEM_QUANTITY}"
            )));
        }
        if item.purchase_limit.is_some() && quantity != 1 {
            return Err(AppError::ValidationError(
                "Limited items can only be redeemed one at a time".into(),
            ));
        }
        let total_cost = item.cost * quantity;

        let txn = self.pool.begin().await?;
        let player = PlayerService::find(&txn, player_id).await?;
        // 先锁账户, 使同一玩家的兑换串行化, 限购计数才准确
        Self::lock_account(&txn, player_id).await?;

        if let Some(limit) = item.purchase_limit {
            let bought = Self::purchases_of(&txn, player_id, item.item_key).await?;
            if bought >= limit {
                return Err(AppError::PurchaseLimitReached(item.item_key.to_string()));
            }
        }

        let debit = Self::debit(
            &txn,
            player_id,
            total_cost,
            "shop_redeem",
            Some(item.item_key),
            json!({ "quantity": quantity, "unit_cost": item.cost }),
        )
        .await?;

        let reward = DeliveryService::enqueue(
            &txn,
            NewReward {
                player_id,
                external_player_id: player.external_id,
                batch_id: None,
                source: RewardSource::StardustShop,
                reward_kind: item.reward_kind,
                outcome_key: item.outcome_key.to_string(),
                outcome_name: item.name.to_string(),
                is_variant: item.is_variant,
                quantity,
            },
            Utc::now(),
        )
        .await?;

        txn.commit().await?;
        log::info!(
            "Player {player_id} redeemed {quantity} x {} for {total_cost} stardust",
            item.item_key
        );

        Ok(RedeemResponse {
            item_key: item.item_key.to_string(),
            quantity,
            stardust_spent: total_cost,
            new_stardust_balance: debit.balance_after,
            pending_reward_id: reward.id,
        })
    }
}
