use sea_orm_migration::prelude::*;

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

/// 初始目录 (outcome_key, name, kind, tier, base_weight, shiny_eligible)
///
/// 层级内权重为相对值, 层级总概率由配置中的 tier_rates 决定。
/// 道具不参与闪光判定。
const CATALOG: &[(&str, &str, &str, &str, f64, bool)] = &[
    ("pidgey", "Pidgey", "creature", "common", 100.0, true),
    ("rattata", "Rattata", "creature", "common", 100.0, true),
    ("caterpie", "Caterpie", "creature", "common", 100.0, true),
    ("weedle", "Weedle", "creature", "common", 100.0, true),
    ("zubat", "Zubat", "creature", "common", 90.0, true),
    ("magikarp", "Magikarp", "creature", "common", 120.0, true),
    ("pikachu", "Pikachu", "creature", "uncommon", 80.0, true),
    ("eevee", "Eevee", "creature", "uncommon", 80.0, true),
    ("growlithe", "Growlithe", "creature", "uncommon", 100.0, true),
    ("vulpix", "Vulpix", "creature", "uncommon", 100.0, true),
    ("abra", "Abra", "creature", "uncommon", 90.0, true),
    ("machop", "Machop", "creature", "uncommon", 100.0, true),
    ("snorlax", "Snorlax", "creature", "rare", 100.0, true),
    ("lapras", "Lapras", "creature", "rare", 100.0, true),
    ("gyarados", "Gyarados", "creature", "rare", 100.0, true),
    ("scyther", "Scyther", "creature", "rare", 100.0, true),
    ("dragonite", "Dragonite", "creature", "epic", 100.0, true),
    ("tyranitar", "Tyranitar", "creature", "epic", 100.0, true),
    ("gengar", "Gengar", "creature", "epic", 100.0, true),
    ("alakazam", "Alakazam", "creature", "epic", 100.0, true),
    ("articuno", "Articuno", "creature", "legendary", 100.0, true),
    ("zapdos", "Zapdos", "creature", "legendary", 100.0, true),
    ("moltres", "Moltres", "creature", "legendary", 100.0, true),
    ("mewtwo", "Mewtwo", "creature", "legendary", 60.0, true),
    ("lugia", "Lugia", "creature", "legendary", 60.0, true),
    ("ho_oh", "Ho-Oh", "creature", "legendary", 60.0, true),
    ("rayquaza", "Rayquaza", "creature", "legendary", 40.0, true),
    ("mew", "Mew", "creature", "mythic", 100.0, true),
    ("celebi", "Celebi", "creature", "mythic", 100.0, true),
    ("jirachi", "Jirachi", "creature", "mythic", 100.0, true),
    ("potion", "Potion", "item", "common", 100.0, false),
    ("great_ball", "Great Ball", "item", "uncommon", 100.0, false),
    ("rare_candy", "Rare Candy", "item", "rare", 100.0, false),
    ("ability_capsule", "Ability Capsule", "item", "epic", 100.0, false),
    ("master_ball", "Master Ball", "item", "legendary", 100.0, false),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(PoolEntries::Table).columns([
            PoolEntries::OutcomeKey,
            PoolEntries::Name,
            PoolEntries::Kind,
            PoolEntries::Tier,
            PoolEntries::BaseWeight,
            PoolEntries::ShinyEligible,
            PoolEntries::IsActive,
        ]);
        for (key, name, kind, tier, weight, shiny) in CATALOG {
            insert.values_panic([
                (*key).into(),
                (*name).into(),
                (*kind).into(),
                (*tier).into(),
                (*weight).into(),
                (*shiny).into(),
                true.into(),
            ]);
        }
        insert.on_conflict(
            OnConflict::column(PoolEntries::OutcomeKey)
                .do_nothing()
                .to_owned(),
        );

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let keys: Vec<&str> = CATALOG.iter().map(|(key, ..)| *key).collect();
        let delete = Query::delete()
            .from_table(PoolEntries::Table)
            .and_where(Expr::col(PoolEntries::OutcomeKey).is_in(keys))
            .to_owned();
        manager.exec_stmt(delete).await
    }
}
