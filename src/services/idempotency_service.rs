use crate::config::IdempotencyConfig;
use crate::entities::{IdempotencyStatus, idempotency_record_entity as records};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

const MAX_TOKEN_LEN: usize = 128;

/// 令牌占用结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClaim {
    /// 首次执行 (或接管了过期记录)
    Fresh,
    /// 已完成, 返回首次执行时保存的响应
    Replay(String),
}

/// 幂等令牌: 占用 -> 完成 (与业务同一事务) / 失败时释放
#[derive(Clone)]
pub struct IdempotencyService {
    pool: DatabaseConnection,
    config: IdempotencyConfig,
}

impl IdempotencyService {
    pub fn new(pool: DatabaseConnection, config: IdempotencyConfig) -> Self {
        Self { pool, config }
    }

    fn retention(&self) -> Duration {
        Duration::hours(self.config.retention_hours)
    }

    fn lease(&self) -> Duration {
        Duration::seconds(self.config.in_flight_lease_seconds)
    }

    pub fn validate_token(token: &str) -> AppResult<()> {
        if token.trim().is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(AppError::ValidationError(format!(
                "Idempotency key must be 1..={MAX_TOKEN_LEN} characters"
            )));
        }
        Ok(())
    }

    pub async fn claim(
        &self,
        token: &str,
        player_id: i64,
        banner_id: Uuid,
        operation: &str,
        now: DateTime<Utc>,
    ) -> AppResult<TokenClaim> {
        Self::validate_token(token)?;

        // 插入与删除之间可能交错, 有限次重试
        for _ in 0..3 {
            let am = records::ActiveModel {
                token: Set(token.to_string()),
                player_id: Set(player_id),
                banner_id: Set(banner_id),
                operation: Set(operation.to_string()),
                status: Set(IdempotencyStatus::InFlight),
                response: Set(None),
                created_at: Set(now),
                expires_at: Set(now + self.retention()),
            };
            let inserted = records::Entity::insert(am)
                .on_conflict(
                    OnConflict::column(records::Column::Token)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.pool)
                .await?;
            if inserted == 1 {
                return Ok(TokenClaim::Fresh);
            }

            let Some(existing) = records::Entity::find_by_id(token.to_string())
                .one(&self.pool)
                .await?
            else {
                continue;
            };

            if existing.player_id != player_id
                || existing.banner_id != banner_id
                || existing.operation != operation
            {
                return Err(AppError::ValidationError(
                    "Idempotency key was already used for a different request".into(),
                ));
            }

            match existing.status {
                IdempotencyStatus::Completed if existing.expires_at > now => {
                    let body = existing.response.ok_or_else(|| {
                        AppError::InternalError(
                            "Completed idempotency record has no response".into(),
                        )
                    })?;
                    return Ok(TokenClaim::Replay(body));
                }
                IdempotencyStatus::InFlight if existing.created_at + self.lease() > now => {
                    return Err(AppError::AlreadyInFlight);
                }
                _ => {}
            }

            // 过期或遗弃的记录: 条件接管
            let result = records::Entity::update_many()
                .col_expr(records::Column::Status, Expr::value(IdempotencyStatus::InFlight))
                .col_expr(records::Column::Response, Expr::value(Option::<String>::None))
                .col_expr(records::Column::CreatedAt, Expr::value(now))
                .col_expr(records::Column::ExpiresAt, Expr::value(now + self.retention()))
                .filter(records::Column::Token.eq(token))
                .filter(records::Column::Status.eq(existing.status))
                .filter(records::Column::CreatedAt.eq(existing.created_at))
                .exec(&self.pool)
                .await?;
            if result.rows_affected == 1 {
                log::info!("Idempotency key {token} taken over after expiry");
                return Ok(TokenClaim::Fresh);
            }
            return Err(AppError::AlreadyInFlight);
        }

        Err(AppError::AlreadyInFlight)
    }

    /// 在业务事务内标记完成并保存响应
    pub async fn complete<C: ConnectionTrait>(
        &self,
        conn: &C,
        token: &str,
        response: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = records::Entity::update_many()
            .col_expr(records::Column::Status, Expr::value(IdempotencyStatus::Completed))
            .col_expr(records::Column::Response, Expr::value(Some(response.to_string())))
            .col_expr(records::Column::ExpiresAt, Expr::value(now + self.retention()))
            .filter(records::Column::Token.eq(token))
            .filter(records::Column::Status.eq(IdempotencyStatus::InFlight))
            .exec(conn)
            .await?;
        if result.rows_affected != 1 {
            return Err(AppError::InternalError(format!(
                "Idempotency claim for {token} was lost"
            )));
        }
        Ok(())
    }

    /// 执行失败后释放占用, 允许客户端重试
    pub async fn release(&self, token: &str) -> AppResult<()> {
        records::Entity::delete_many()
            .filter(records::Column::Token.eq(token))
            .filter(records::Column::Status.eq(IdempotencyStatus::InFlight))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    /// 后台任务: 删除过期的完成记录与遗弃的占用
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = records::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(records::Column::ExpiresAt.lt(now))
                    .add(
                        Condition::all()
                            .add(records::Column::Status.eq(IdempotencyStatus::InFlight))
                            .add(records::Column::CreatedAt.lt(now - self.lease())),
                    ),
            )
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_validation() {
        assert!(IdempotencyService::validate_token("abc-123").is_ok());
        assert!(IdempotencyService::validate_token("   ").is_err());
        assert!(IdempotencyService::validate_token(&"x".repeat(129)).is_err());
    }
}
