use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    RewardKind, StardustTransactionType, stardust_account_entity, stardust_transaction_entity,
};

/// 星尘商店商品 (静态目录)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShopItem {
    #[schema(value_type = String)]
    pub item_key: &'static str,
    #[schema(value_type = String)]
    pub name: &'static str,
    /// 兑换后发放的奖励类型与目录标识
    pub reward_kind: RewardKind,
    #[schema(value_type = String)]
    pub outcome_key: &'static str,
    pub is_variant: bool,
    /// 单价 (星尘)
    pub cost: i64,
    /// 每个玩家累计可兑换次数; None = 不限
    pub purchase_limit: Option<i64>,
}

pub const SHOP_CATALOG: &[ShopItem] = &[
    ShopItem {
        item_key: "potion_bundle",
        name: "Potion",
        reward_kind: RewardKind::Item,
        outcome_key: "potion",
        is_variant: false,
        cost: 20,
        purchase_limit: None,
    },
    ShopItem {
        item_key: "rare_candy",
        name: "Rare Candy",
        reward_kind: RewardKind::Item,
        outcome_key: "rare_candy",
        is_variant: false,
        cost: 100,
        purchase_limit: None,
    },
    ShopItem {
        item_key: "ability_capsule",
        name: "Ability Capsule",
        reward_kind: RewardKind::Item,
        outcome_key: "ability_capsule",
        is_variant: false,
        cost: 250,
        purchase_limit: Some(5),
    },
    ShopItem {
        item_key: "master_ball",
        name: "Master Ball",
        reward_kind: RewardKind::Item,
        outcome_key: "master_ball",
        is_variant: false,
        cost: 1000,
        purchase_limit: Some(1),
    },
    ShopItem {
        item_key: "shiny_eevee",
        name: "Eevee (Shiny)",
        reward_kind: RewardKind::Creature,
        outcome_key: "eevee",
        is_variant: true,
        cost: 600,
        purchase_limit: Some(1),
    },
];

pub fn find_shop_item(key: &str) -> Option<&'static ShopItem> {
    SHOP_CATALOG.iter().find(|i| i.item_key == key)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StardustAccountResponse {
    pub player_id: i64,
    pub balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
}

impl From<stardust_account_entity::Model> for StardustAccountResponse {
    fn from(m: stardust_account_entity::Model) -> Self {
        StardustAccountResponse {
            player_id: m.player_id,
            balance: m.balance,
            lifetime_earned: m.lifetime_earned,
            lifetime_spent: m.lifetime_spent,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StardustTransactionResponse {
    pub id: Uuid,
    pub transaction_type: StardustTransactionType,
    pub amount: i64,
    pub balance_after: i64,
    pub reason: String,
    pub item_key: Option<String>,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<stardust_transaction_entity::Model> for StardustTransactionResponse {
    fn from(m: stardust_transaction_entity::Model) -> Self {
        StardustTransactionResponse {
            id: m.id,
            transaction_type: m.transaction_type,
            amount: m.amount,
            balance_after: m.balance_after,
            reason: m.reason,
            item_key: m.item_key,
            details: serde_json::from_str(&m.details).unwrap_or(serde_json::Value::Null),
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StardustTransactionQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RedeemRequest {
    pub item_key: String,
    /// 默认 1; 限购商品只能为 1
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedeemResponse {
    pub item_key: String,
    pub quantity: i64,
    pub stardust_spent: i64,
    pub new_stardust_balance: i64,
    pub pending_reward_id: Uuid,
}

/// 单次星尘入账的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StardustCredit {
    pub amount: i64,
    pub balance_after: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_shop_catalog_is_well_formed() {
        let mut keys = HashSet::new();
        for item in SHOP_CATALOG {
            assert!(keys.insert(item.item_key), "duplicate {}", item.item_key);
            assert!(item.cost > 0);
            assert!(item.purchase_limit.is_none_or(|l| l > 0));
        }
        assert!(find_shop_item("master_ball").is_some());
        assert!(find_shop_item("missing").is_none());
    }
}
