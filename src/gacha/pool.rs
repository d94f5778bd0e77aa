//! Weighted pool construction.
//!
//! A [`PoolSnapshot`] is built once per request from a banner and the active
//! catalog and is never mutated afterwards; changes to the banner or catalog are
//! picked up by building a new snapshot.

use crate::entities::{OutcomeKind, Tier, pool_entry_entity as catalog};
use crate::error::{AppError, AppResult};
use crate::models::BannerDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use uuid::Uuid;

/// A drawable outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Creature {
        key: String,
        name: String,
        shiny_eligible: bool,
    },
    Item {
        key: String,
        name: String,
    },
}

impl Outcome {
    pub fn key(&self) -> &str {
        match self {
            Outcome::Creature { key, .. } | Outcome::Item { key, .. } => key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Outcome::Creature { name, .. } | Outcome::Item { name, .. } => name,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Creature { .. } => OutcomeKind::Creature,
            Outcome::Item { .. } => OutcomeKind::Item,
        }
    }

    /// Only shiny-eligible creatures can roll the rare variant.
    pub fn can_be_variant(&self) -> bool {
        matches!(
            self,
            Outcome::Creature {
                shiny_eligible: true,
                ..
            }
        )
    }

    /// Items are consumables and never count towards the collection.
    pub fn is_collectible(&self) -> bool {
        matches!(self, Outcome::Creature { .. })
    }
}

impl From<&catalog::Model> for Outcome {
    fn from(m: &catalog::Model) -> Self {
        match m.kind {
            OutcomeKind::Creature => Outcome::Creature {
                key: m.outcome_key.clone(),
                name: m.name.clone(),
                shiny_eligible: m.shiny_eligible,
            },
            OutcomeKind::Item => Outcome::Item {
                key: m.outcome_key.clone(),
                name: m.name.clone(),
            },
        }
    }
}

/// One mass value per tier, indexed by [`Tier::index`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TierWeights([f64; Tier::COUNT]);

impl TierWeights {
    pub fn get(&self, tier: Tier) -> f64 {
        self.0[tier.index()]
    }

    pub fn set(&mut self, tier: Tier, value: f64) {
        self.0[tier.index()] = value;
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn sum_where(&self, pred: impl Fn(Tier) -> bool) -> f64 {
        Tier::ALL
            .iter()
            .filter(|t| pred(**t))
            .map(|t| self.get(*t))
            .sum()
    }

    pub fn scale_where(&mut self, pred: impl Fn(Tier) -> bool, factor: f64) {
        for t in Tier::ALL {
            if pred(t) {
                self.0[t.index()] *= factor;
            }
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Fixed base probability of each tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierRates {
    pub common: f64,
    pub uncommon: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
    pub mythic: f64,
}

impl Default for TierRates {
    fn default() -> Self {
        Self {
            common: 0.55,
            uncommon: 0.27,
            rare: 0.12,
            epic: 0.05,
            legendary: 0.009,
            mythic: 0.001,
        }
    }
}

impl TierRates {
    pub fn rate(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Common => self.common,
            Tier::Uncommon => self.uncommon,
            Tier::Rare => self.rare,
            Tier::Epic => self.epic,
            Tier::Legendary => self.legendary,
            Tier::Mythic => self.mythic,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut total = 0.0;
        for tier in Tier::ALL {
            let r = self.rate(tier);
            if !r.is_finite() || r < 0.0 {
                return Err(format!("tier rate for {tier} must be a non-negative number"));
            }
            total += r;
        }
        if total <= 0.0 {
            return Err("tier rates must not all be zero".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub outcome: Outcome,
    pub tier: Tier,
    pub weight: f64,
    pub is_featured: bool,
}

#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    version: u64,
    banner_id: Uuid,
    entries: Vec<PoolEntry>,
    tier_weights: TierWeights,
    total_weight: f64,
    used_fallback: bool,
}

impl PoolSnapshot {
    /// Content fingerprint of the banner and catalog this snapshot was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn banner_id(&self) -> Uuid {
        self.banner_id
    }

    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    pub fn tier_weights(&self) -> TierWeights {
        self.tier_weights
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// True when the banner-specific pool was empty and the full catalog was used.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    pub fn in_tier(&self, tier: Tier) -> impl Iterator<Item = &PoolEntry> {
        self.entries.iter().filter(move |e| e.tier == tier)
    }

    pub fn featured_in_tier(&self, tier: Tier) -> Vec<&PoolEntry> {
        self.in_tier(tier).filter(|e| e.is_featured).collect()
    }

    pub fn generic_in_tier(&self, tier: Tier) -> Vec<&PoolEntry> {
        self.in_tier(tier).filter(|e| !e.is_featured).collect()
    }

    pub fn find(&self, key: &str) -> Option<&PoolEntry> {
        self.entries.iter().find(|e| e.outcome.key() == key)
    }
}

pub struct PoolBuilder {
    rates: TierRates,
    item_multiplier: f64,
}

impl PoolBuilder {
    pub fn new(rates: TierRates, item_multiplier: f64) -> Self {
        Self {
            rates,
            item_multiplier,
        }
    }

    /// Flatten `catalog` into a weighted pool for `banner`.
    ///
    /// Entry weight = tier rate × (effective weight / tier effective total) × item multiplier,
    /// where the effective weight is the base weight times the banner's rate-up when featured.
    pub fn build(
        &self,
        banner: &BannerDefinition,
        catalog: &[catalog::Model],
    ) -> AppResult<PoolSnapshot> {
        let active: Vec<&catalog::Model> = catalog
            .iter()
            .filter(|m| m.is_active && m.base_weight.is_finite() && m.base_weight > 0.0)
            .collect();
        if active.is_empty() {
            return Err(AppError::PoolEmpty("catalog has no drawable entries".into()));
        }

        let featured: HashSet<&str> = banner
            .featured
            .iter()
            .map(|f| f.outcome_key.as_str())
            .collect();

        let mut used_fallback = false;
        let selected: Vec<&catalog::Model> = match &banner.pool_keys {
            Some(keys) => {
                let keys: HashSet<&str> = keys.iter().map(String::as_str).collect();
                let restricted: Vec<&catalog::Model> = active
                    .iter()
                    .copied()
                    .filter(|m| {
                        keys.contains(m.outcome_key.as_str())
                            || featured.contains(m.outcome_key.as_str())
                    })
                    .collect();
                if restricted.is_empty() {
                    log::warn!(
                        "Banner {} has an empty specific pool, falling back to full catalog",
                        banner.id
                    );
                    used_fallback = true;
                    active
                } else {
                    restricted
                }
            }
            None => active,
        };

        let effective = |m: &catalog::Model| {
            if featured.contains(m.outcome_key.as_str()) {
                m.base_weight * banner.rate_up_multiplier
            } else {
                m.base_weight
            }
        };

        let mut tier_raw = TierWeights::default();
        for m in &selected {
            tier_raw.set(m.tier, tier_raw.get(m.tier) + effective(m));
        }

        let mut entries = Vec::with_capacity(selected.len());
        let mut tier_weights = TierWeights::default();
        for m in &selected {
            let raw_total = tier_raw.get(m.tier);
            let mut weight = self.rates.rate(m.tier) * effective(m) / raw_total;
            if m.kind == OutcomeKind::Item {
                weight *= self.item_multiplier;
            }
            if weight <= 0.0 {
                continue;
            }
            tier_weights.set(m.tier, tier_weights.get(m.tier) + weight);
            entries.push(PoolEntry {
                outcome: Outcome::from(*m),
                tier: m.tier,
                weight,
                is_featured: featured.contains(m.outcome_key.as_str()),
            });
        }

        let total_weight = tier_weights.total();
        if entries.is_empty() || total_weight <= 0.0 {
            return Err(AppError::PoolEmpty(format!(
                "banner {} has no entry with positive weight",
                banner.id
            )));
        }

        let mut hasher = DefaultHasher::new();
        banner.id.hash(&mut hasher);
        banner.updated_at.timestamp_millis().hash(&mut hasher);
        for e in &entries {
            e.outcome.key().hash(&mut hasher);
            e.weight.to_bits().hash(&mut hasher);
            e.is_featured.hash(&mut hasher);
        }

        Ok(PoolSnapshot {
            version: hasher.finish(),
            banner_id: banner.id,
            entries,
            tier_weights,
            total_weight,
            used_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BannerKind;
    use crate::gacha::random::{SecureRandomSource, SeededRandomSource};
    use crate::models::FeaturedEntry;
    use chrono::Utc;

    fn entry(key: &str, kind: OutcomeKind, tier: Tier, weight: f64) -> catalog::Model {
        catalog::Model {
            outcome_key: key.to_string(),
            name: key.to_uppercase(),
            kind,
            tier,
            base_weight: weight,
            shiny_eligible: kind == OutcomeKind::Creature,
            is_active: true,
        }
    }

    fn banner(featured: &[(&str, Tier)], rate_up: f64) -> BannerDefinition {
        BannerDefinition {
            id: Uuid::new_v4(),
            kind: BannerKind::Limited,
            featured: featured
                .iter()
                .map(|(k, t)| FeaturedEntry {
                    outcome_key: k.to_string(),
                    tier: *t,
                })
                .collect(),
            pool_keys: None,
            rate_up_multiplier: rate_up,
            updated_at: Utc::now(),
        }
    }

    fn catalog_fixture() -> Vec<catalog::Model> {
        vec![
            entry("pidgey", OutcomeKind::Creature, Tier::Common, 100.0),
            entry("rattata", OutcomeKind::Creature, Tier::Common, 100.0),
            entry("potion", OutcomeKind::Item, Tier::Common, 100.0),
            entry("snorlax", OutcomeKind::Creature, Tier::Rare, 100.0),
            entry("mewtwo", OutcomeKind::Creature, Tier::Legendary, 100.0),
            entry("lugia", OutcomeKind::Creature, Tier::Legendary, 100.0),
        ]
    }

    #[test]
    fn test_rate_up_applies_only_to_featured() {
        let rates = TierRates::default();
        let pool = PoolBuilder::new(rates, 1.0)
            .build(&banner(&[("mewtwo", Tier::Legendary)], 3.0), &catalog_fixture())
            .unwrap();
        let mewtwo = pool.find("mewtwo").unwrap();
        let lugia = pool.find("lugia").unwrap();
        assert!(mewtwo.is_featured);
        assert!(!lugia.is_featured);
        assert!((mewtwo.weight / lugia.weight - 3.0).abs() < 1e-9);
        // the tier keeps its base probability mass
        assert!((pool.tier_weights().get(Tier::Legendary) - rates.legendary).abs() < 1e-12);
    }

    #[test]
    fn test_items_are_down_weighted() {
        let pool = PoolBuilder::new(TierRates::default(), 0.5)
            .build(&banner(&[], 1.0), &catalog_fixture())
            .unwrap();
        let potion = pool.find("potion").unwrap();
        let pidgey = pool.find("pidgey").unwrap();
        assert!((potion.weight / pidgey.weight - 0.5).abs() < 1e-9);
        assert!(pool.tier_weights().get(Tier::Common) < TierRates::default().common);
    }

    #[test]
    fn test_empty_specific_pool_falls_back_to_catalog() {
        let mut def = banner(&[], 1.0);
        def.pool_keys = Some(vec!["does_not_exist".into()]);
        let pool = PoolBuilder::new(TierRates::default(), 1.0)
            .build(&def, &catalog_fixture())
            .unwrap();
        assert!(pool.used_fallback());
        assert_eq!(pool.entries().len(), catalog_fixture().len());
    }

    #[test]
    fn test_specific_pool_keeps_featured_entries() {
        let mut def = banner(&[("mewtwo", Tier::Legendary)], 2.0);
        def.pool_keys = Some(vec!["pidgey".into()]);
        let pool = PoolBuilder::new(TierRates::default(), 1.0)
            .build(&def, &catalog_fixture())
            .unwrap();
        assert!(!pool.used_fallback());
        let keys: Vec<&str> = pool.entries().iter().map(|e| e.outcome.key()).collect();
        assert_eq!(keys, vec!["pidgey", "mewtwo"]);
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let err = PoolBuilder::new(TierRates::default(), 1.0)
            .build(&banner(&[], 1.0), &[])
            .unwrap_err();
        assert!(matches!(err, AppError::PoolEmpty(_)));
    }

    #[test]
    fn test_version_changes_with_content() {
        let def = banner(&[("mewtwo", Tier::Legendary)], 2.0);
        let builder = PoolBuilder::new(TierRates::default(), 1.0);
        let a = builder.build(&def, &catalog_fixture()).unwrap();
        let b = builder.build(&def, &catalog_fixture()).unwrap();
        assert_eq!(a.version(), b.version());

        let mut changed = catalog_fixture();
        changed[0].base_weight = 50.0;
        let c = builder.build(&def, &changed).unwrap();
        assert_ne!(a.version(), c.version());
    }

    #[test]
    fn test_flattened_pool_frequencies_match_weights() {
        let pool = PoolBuilder::new(TierRates::default(), 1.0)
            .build(&banner(&[], 1.0), &catalog_fixture())
            .unwrap();
        let weights: Vec<f64> = pool.entries().iter().map(|e| e.weight).collect();
        let rng = SeededRandomSource::new(2024);
        let n = 300_000;
        let mut counts = vec![0usize; weights.len()];
        for _ in 0..n {
            counts[rng.weighted_index(&weights).unwrap()] += 1;
        }
        for (i, w) in weights.iter().enumerate() {
            let expected = w / pool.total_weight();
            let observed = counts[i] as f64 / n as f64;
            assert!(
                (observed - expected).abs() < 0.004,
                "entry {i}: expected {expected}, observed {observed}"
            );
        }
    }
}
