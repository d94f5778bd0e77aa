use crate::entities::player_entity as players;
use crate::error::{AppError, AppResult};
use crate::models::{GrantCurrencyRequest, PlayerResponse};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};

#[derive(Clone)]
pub struct PlayerService {
    pool: DatabaseConnection,
}

impl PlayerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_player(&self, player_id: i64) -> AppResult<PlayerResponse> {
        Ok(Self::find(&self.pool, player_id).await?.into())
    }

    /// 管理员发放主货币; 玩家不存在时按 external_id 创建
    pub async fn grant_currency(
        &self,
        player_id: i64,
        req: &GrantCurrencyRequest,
    ) -> AppResult<PlayerResponse> {
        if req.amount <= 0 {
            return Err(AppError::ValidationError(
                "Amount to grant must be positive".into(),
            ));
        }

        let txn = self.pool.begin().await?;
        let now = Utc::now();

        let existing = players::Entity::find_by_id(player_id).one(&txn).await?;
        let updated = match existing {
            Some(p) => {
                players::Entity::update_many()
                    .col_expr(
                        players::Column::Balance,
                        Expr::col(players::Column::Balance).add(req.amount),
                    )
                    .col_expr(players::Column::UpdatedAt, Expr::value(now))
                    .filter(players::Column::Id.eq(p.id))
                    .exec(&txn)
                    .await?;
                Self::find(&txn, player_id).await?
            }
            None => {
                let external_id = req
                    .external_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        AppError::ValidationError(
                            "external_id is required for a new player".into(),
                        )
                    })?;
                players::ActiveModel {
                    id: Set(player_id),
                    external_id: Set(external_id.to_string()),
                    balance: Set(req.amount),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        log::info!(
            "Granted {} currency to player {} (balance {})",
            req.amount,
            player_id,
            updated.balance
        );
        Ok(updated.into())
    }

    pub async fn find<C: ConnectionTrait>(conn: &C, player_id: i64) -> AppResult<players::Model> {
        players::Entity::find_by_id(player_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Player {player_id}")))
    }

    /// 条件扣减主货币 (WHERE balance >= cost), 返回扣减后的玩家记录
    pub async fn debit<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        cost: i64,
    ) -> AppResult<players::Model> {
        let result = players::Entity::update_many()
            .col_expr(
                players::Column::Balance,
                Expr::col(players::Column::Balance).sub(cost),
            )
            .col_expr(players::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(players::Column::Id.eq(player_id))
            .filter(players::Column::Balance.gte(cost))
            .exec(conn)
            .await?;

        let player = Self::find(conn, player_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InsufficientBalance {
                required: cost,
                available: player.balance,
            });
        }
        Ok(player)
    }
}
