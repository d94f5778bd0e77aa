use sea_orm_migration::prelude::*;

/// Pull history (每个抽取结果一条, 不可变)
#[derive(DeriveIden)]
enum PullHistory {
    Table,
    Id,
    BatchId,
    PlayerId,
    BannerId,
    Tier,
    OutcomeKind,
    OutcomeKey,
    OutcomeName,
    IsVariant,
    IsFeatured,
    WasDuplicate,
    IsNewEntry,
    StardustEarned,
    Cost,
    CreatedAt,
}

/// Pending rewards (待外部代理发放的奖励)
#[derive(DeriveIden)]
enum PendingRewards {
    Table,
    Id,
    PlayerId,
    ExternalPlayerId,
    BatchId,
    Source,
    RewardKind,
    OutcomeKey,
    OutcomeName,
    IsVariant,
    Quantity,
    Status,
    Attempts,
    LastError,
    CreatedAt,
    UpdatedAt,
    DeliveredAt,
}

/// Idempotency records (幂等令牌)
#[derive(DeriveIden)]
enum IdempotencyRecords {
    Table,
    Token,
    PlayerId,
    BannerId,
    Operation,
    Status,
    Response,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PullHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PullHistory::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PullHistory::BatchId).uuid().not_null())
                    .col(ColumnDef::new(PullHistory::PlayerId).big_integer().not_null())
                    .col(ColumnDef::new(PullHistory::BannerId).uuid().not_null())
                    .col(ColumnDef::new(PullHistory::Tier).string_len(16).not_null())
                    .col(ColumnDef::new(PullHistory::OutcomeKind).string_len(16).not_null())
                    .col(ColumnDef::new(PullHistory::OutcomeKey).string_len(64).not_null())
                    .col(
                        ColumnDef::new(PullHistory::OutcomeName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PullHistory::IsVariant).boolean().not_null())
                    .col(ColumnDef::new(PullHistory::IsFeatured).boolean().not_null())
                    .col(ColumnDef::new(PullHistory::WasDuplicate).boolean().not_null())
                    .col(
                        ColumnDef::new(PullHistory::IsNewEntry)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PullHistory::StardustEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PullHistory::Cost).big_integer().not_null())
                    .col(
                        ColumnDef::new(PullHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pull_history_player")
                    .table(PullHistory::Table)
                    .col(PullHistory::PlayerId)
                    .col(PullHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pull_history_batch")
                    .table(PullHistory::Table)
                    .col(PullHistory::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PendingRewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingRewards::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PendingRewards::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRewards::ExternalPlayerId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingRewards::BatchId).uuid().null())
                    .col(ColumnDef::new(PendingRewards::Source).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PendingRewards::RewardKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRewards::OutcomeKey)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRewards::OutcomeName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingRewards::IsVariant).boolean().not_null())
                    .col(ColumnDef::new(PendingRewards::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(PendingRewards::Status).string_len(24).not_null())
                    .col(
                        ColumnDef::new(PendingRewards::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PendingRewards::LastError).text().null())
                    .col(
                        ColumnDef::new(PendingRewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRewards::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingRewards::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 外部代理按 external_player_id + status 轮询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pending_rewards_external_status")
                    .table(PendingRewards::Table)
                    .col(PendingRewards::ExternalPlayerId)
                    .col(PendingRewards::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IdempotencyRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdempotencyRecords::Token)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IdempotencyRecords::BannerId).uuid().not_null())
                    .col(
                        ColumnDef::new(IdempotencyRecords::Operation)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IdempotencyRecords::Response).text().null())
                    .col(
                        ColumnDef::new(IdempotencyRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_idempotency_records_expires")
                    .table(IdempotencyRecords::Table)
                    .col(IdempotencyRecords::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：幂等 -> 待发放 -> 历史
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(IdempotencyRecords::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PendingRewards::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(PullHistory::Table).to_owned())
            .await?;
        Ok(())
    }
}
