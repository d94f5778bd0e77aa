use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 稀有度层级, 声明顺序即稀有度顺序 (Common 最低)
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[sea_orm(string_value = "common")]
    Common,
    #[sea_orm(string_value = "uncommon")]
    Uncommon,
    #[sea_orm(string_value = "rare")]
    Rare,
    #[sea_orm(string_value = "epic")]
    Epic,
    #[sea_orm(string_value = "legendary")]
    Legendary,
    #[sea_orm(string_value = "mythic")]
    Mythic,
}

impl Tier {
    pub const COUNT: usize = 6;

    pub const ALL: [Tier; Tier::COUNT] = [
        Tier::Common,
        Tier::Uncommon,
        Tier::Rare,
        Tier::Epic,
        Tier::Legendary,
        Tier::Mythic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Legendary 及以上: 大保底计数在此重置
    pub fn is_top(self) -> bool {
        self >= Tier::Legendary
    }

    /// Epic 及以上: 小保底计数在此重置
    pub fn is_second_or_above(self) -> bool {
        self >= Tier::Epic
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Common => "common",
            Tier::Uncommon => "uncommon",
            Tier::Rare => "rare",
            Tier::Epic => "epic",
            Tier::Legendary => "legendary",
            Tier::Mythic => "mythic",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    #[sea_orm(string_value = "creature")]
    Creature,
    #[sea_orm(string_value = "item")]
    Item,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Creature => write!(f, "creature"),
            OutcomeKind::Item => write!(f, "item"),
        }
    }
}

/// 可抽取目录实体 (只读参考数据, 由迁移初始化)
/// - base_weight: 层级内相对权重, 必须 > 0
/// - shiny_eligible: 是否可能抽出闪光 (道具恒为 false)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pool_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub outcome_key: String,
    pub name: String,
    pub kind: OutcomeKind,
    pub tier: Tier,
    pub base_weight: f64,
    pub shiny_eligible: bool,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
