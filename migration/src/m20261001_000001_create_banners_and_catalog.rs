use sea_orm_migration::prelude::*;

/// Players (外部系统拥有的玩家主货币钱包)
#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    ExternalId,
    Balance,
    CreatedAt,
    UpdatedAt,
}

/// Banners (卡池配置)
#[derive(DeriveIden)]
enum Banners {
    Table,
    Id,
    Name,
    Description,
    Kind,
    FeaturedJson,
    PoolJson,
    RateUpMultiplier,
    SingleCost,
    MultiCost,
    StartsAt,
    EndsAt,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

/// Pool entries (可抽取的精灵 / 道具目录)
#[derive(DeriveIden)]
enum PoolEntries {
    Table,
    OutcomeKey,
    Name,
    Kind,
    Tier,
    BaseWeight,
    ShinyEligible,
    IsActive,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Players::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Players::ExternalId).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Players::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Players::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Players::UpdatedAt)
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
                    .name("idx_players_external_id_unique")
                    .table(Players::Table)
                    .col(Players::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Banners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Banners::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Banners::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Banners::Description).text().null())
                    .col(ColumnDef::new(Banners::Kind).string_len(16).not_null())
                    // JSON 数组: [{ "outcome_key": "...", "tier": "legendary" }]
                    .col(ColumnDef::new(Banners::FeaturedJson).text().not_null())
                    // NULL = 使用完整目录
                    .col(ColumnDef::new(Banners::PoolJson).text().null())
                    .col(
                        ColumnDef::new(Banners::RateUpMultiplier)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(ColumnDef::new(Banners::SingleCost).big_integer().not_null())
                    .col(ColumnDef::new(Banners::MultiCost).big_integer().not_null())
                    .col(
                        ColumnDef::new(Banners::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Banners::EndsAt)
                            .timestamp_with_time_zone()
                            .null(), // NULL = 永不过期
                    )
                    .col(
                        ColumnDef::new(Banners::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Banners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Banners::UpdatedAt)
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
                    .name("idx_banners_active")
                    .table(Banners::Table)
                    .col(Banners::IsActive)
                    .col(Banners::EndsAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PoolEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PoolEntries::OutcomeKey)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PoolEntries::Name).string_len(255).not_null())
                    .col(ColumnDef::new(PoolEntries::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(PoolEntries::Tier).string_len(16).not_null())
                    .col(ColumnDef::new(PoolEntries::BaseWeight).double().not_null())
                    .col(
                        ColumnDef::new(PoolEntries::ShinyEligible)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PoolEntries::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pool_entries_tier")
                    .table(PoolEntries::Table)
                    .col(PoolEntries::Tier)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(PoolEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Banners::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Players::Table).to_owned())
            .await?;
        Ok(())
    }
}
