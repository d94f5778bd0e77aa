use sea_orm_migration::prelude::*;

/// Pity records (每个玩家 × 卡池的保底计数)
#[derive(DeriveIden)]
enum PityRecords {
    Table,
    PlayerId,
    BannerId,
    PullsSinceTop,
    PullsSinceSecond,
    FeaturedGuarantee,
    LifetimePulls,
    LifetimeSpend,
    UpdatedAt,
}

/// Target paths (定轨)
#[derive(DeriveIden)]
enum TargetPaths {
    Table,
    PlayerId,
    BannerId,
    TargetKey,
    FatePoints,
    UpdatedAt,
}

/// Collection entries (图鉴: 普通 / 闪光分别记录)
#[derive(DeriveIden)]
enum CollectionEntries {
    Table,
    PlayerId,
    OutcomeKey,
    HasNormal,
    HasVariant,
    NormalObtainedAt,
    VariantObtainedAt,
}

/// Stardust accounts (星尘账户)
#[derive(DeriveIden)]
enum StardustAccounts {
    Table,
    PlayerId,
    Balance,
    LifetimeEarned,
    LifetimeSpent,
    UpdatedAt,
}

/// Stardust transactions (星尘流水, 仅追加)
#[derive(DeriveIden)]
enum StardustTransactions {
    Table,
    Id,
    PlayerId,
    TransactionType,
    Amount,
    BalanceAfter,
    Reason,
    ItemKey,
    Details,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PityRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PityRecords::PlayerId).big_integer().not_null())
                    .col(ColumnDef::new(PityRecords::BannerId).uuid().not_null())
                    .col(
                        ColumnDef::new(PityRecords::PullsSinceTop)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PityRecords::PullsSinceSecond)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PityRecords::FeaturedGuarantee)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PityRecords::LifetimePulls)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PityRecords::LifetimeSpend)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PityRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_pity_records")
                            .col(PityRecords::PlayerId)
                            .col(PityRecords::BannerId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TargetPaths::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TargetPaths::PlayerId).big_integer().not_null())
                    .col(ColumnDef::new(TargetPaths::BannerId).uuid().not_null())
                    .col(ColumnDef::new(TargetPaths::TargetKey).string_len(64).not_null())
                    .col(
                        ColumnDef::new(TargetPaths::FatePoints)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TargetPaths::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_target_paths")
                            .col(TargetPaths::PlayerId)
                            .col(TargetPaths::BannerId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CollectionEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionEntries::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionEntries::OutcomeKey)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionEntries::HasNormal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionEntries::HasVariant)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionEntries::NormalObtainedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollectionEntries::VariantObtainedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_collection_entries")
                            .col(CollectionEntries::PlayerId)
                            .col(CollectionEntries::OutcomeKey),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StardustAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StardustAccounts::PlayerId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StardustAccounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StardustAccounts::LifetimeEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StardustAccounts::LifetimeSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StardustAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StardustTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StardustTransactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StardustTransactions::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StardustTransactions::TransactionType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StardustTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StardustTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StardustTransactions::Reason)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StardustTransactions::ItemKey)
                            .string_len(64)
                            .null(),
                    )
                    .col(ColumnDef::new(StardustTransactions::Details).text().not_null())
                    .col(
                        ColumnDef::new(StardustTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 限购统计按 (player_id, item_key) 计数
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_stardust_transactions_player_item")
                    .table(StardustTransactions::Table)
                    .col(StardustTransactions::PlayerId)
                    .col(StardustTransactions::ItemKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(StardustTransactions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(StardustAccounts::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(CollectionEntries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(TargetPaths::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(PityRecords::Table).to_owned())
            .await?;
        Ok(())
    }
}
