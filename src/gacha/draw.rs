//! Single-draw resolution: pity-adjusted tier draw, featured 50/50 with target
//! override, generic pick and variant roll.

use crate::entities::{FeaturedGuarantee, Tier};
use crate::gacha::fate::{FateProgress, TargetPath};
use crate::gacha::pity::{PityCounters, PityRules};
use crate::gacha::pool::{Outcome, PoolEntry, PoolSnapshot};
use crate::gacha::random::{RandomError, RandomExt, SecureRandomSource};
use serde::{Deserialize, Serialize};

pub struct DrawContext<'a> {
    pub pool: &'a PoolSnapshot,
    pub pity: &'a PityRules,
    pub max_fate_points: u32,
    pub featured_win_rate: f64,
    pub shiny_rate: f64,
}

/// Mutable per-(player, banner) state carried across the draws of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub counters: PityCounters,
    pub guarantee: FeaturedGuarantee,
    pub target: Option<TargetPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeaturedResolution {
    /// 该层级没有 UP 条目
    NotFeaturedTier,
    /// 定轨点数已满, 直接给出目标
    TargetForced,
    /// 上次歪了, 本次必定 UP
    Guaranteed,
    WonCoinFlip,
    LostCoinFlip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawResult {
    pub outcome: Outcome,
    pub tier: Tier,
    pub is_featured: bool,
    pub is_variant: bool,
    pub resolution: FeaturedResolution,
    pub fate: Option<FateProgress>,
    /// 本抽之前的计数 (用于审计)
    pub counters_before: PityCounters,
}

fn pick<'a>(
    rng: &dyn SecureRandomSource,
    entries: &[&'a PoolEntry],
) -> Result<&'a PoolEntry, RandomError> {
    let weights: Vec<f64> = entries.iter().map(|e| e.weight).collect();
    rng.weighted_choice(entries, &weights).copied()
}

/// Resolve one draw and advance `state`.
pub fn resolve_draw(
    ctx: &DrawContext<'_>,
    state: &mut DrawState,
    rng: &dyn SecureRandomSource,
) -> Result<DrawResult, RandomError> {
    let counters_before = state.counters;
    let adjusted = ctx.pity.adjust(ctx.pool.tier_weights(), state.counters);
    let tier = Tier::ALL[rng.weighted_index(adjusted.as_slice())?];

    let featured = ctx.pool.featured_in_tier(tier);
    let generic = ctx.pool.generic_in_tier(tier);

    let target_in_tier = state
        .target
        .as_ref()
        .filter(|t| featured.iter().any(|e| e.outcome.key() == t.target_key));

    let (entry, resolution) = if featured.is_empty() {
        (pick(rng, &generic)?, FeaturedResolution::NotFeaturedTier)
    } else if let Some(target) = target_in_tier.filter(|t| t.should_force(ctx.max_fate_points)) {
        let forced = featured
            .iter()
            .copied()
            .find(|e| e.outcome.key() == target.target_key)
            .ok_or(RandomError::Empty)?;
        (forced, FeaturedResolution::TargetForced)
    } else if state.guarantee == FeaturedGuarantee::Guaranteed || generic.is_empty() {
        (pick(rng, &featured)?, FeaturedResolution::Guaranteed)
    } else if rng.chance(ctx.featured_win_rate)? {
        (pick(rng, &featured)?, FeaturedResolution::WonCoinFlip)
    } else {
        (pick(rng, &generic)?, FeaturedResolution::LostCoinFlip)
    };

    match resolution {
        FeaturedResolution::NotFeaturedTier => {}
        FeaturedResolution::LostCoinFlip => state.guarantee = FeaturedGuarantee::Guaranteed,
        _ => state.guarantee = FeaturedGuarantee::CoinFlip,
    }

    let fate = if target_in_tier.is_some() {
        state
            .target
            .as_mut()
            .map(|t| t.record_featured_result(entry.outcome.key(), ctx.max_fate_points))
    } else {
        None
    };

    state.counters = state.counters.after_outcome(tier);

    let is_variant = entry.outcome.can_be_variant() && rng.chance(ctx.shiny_rate)?;

    Ok(DrawResult {
        outcome: entry.outcome.clone(),
        tier,
        is_featured: entry.is_featured,
        is_variant,
        resolution,
        fate,
        counters_before,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BannerKind, OutcomeKind, pool_entry_entity as catalog};
    use crate::gacha::pool::{PoolBuilder, TierRates};
    use crate::gacha::random::SeededRandomSource;
    use crate::models::{BannerDefinition, FeaturedEntry};
    use chrono::Utc;
    use uuid::Uuid;

    fn creature(key: &str, tier: Tier) -> catalog::Model {
        catalog::Model {
            outcome_key: key.into(),
            name: key.into(),
            kind: OutcomeKind::Creature,
            tier,
            base_weight: 100.0,
            shiny_eligible: true,
            is_active: true,
        }
    }

    fn pool() -> PoolSnapshot {
        let catalog = vec![
            creature("pidgey", Tier::Common),
            creature("oddish", Tier::Uncommon),
            creature("snorlax", Tier::Rare),
            creature("dragonite", Tier::Epic),
            creature("mewtwo", Tier::Legendary),
            creature("lugia", Tier::Legendary),
            creature("ho_oh", Tier::Legendary),
            creature("mew", Tier::Mythic),
        ];
        let banner = BannerDefinition {
            id: Uuid::new_v4(),
            kind: BannerKind::Limited,
            featured: vec![
                FeaturedEntry {
                    outcome_key: "mewtwo".into(),
                    tier: Tier::Legendary,
                },
                FeaturedEntry {
                    outcome_key: "lugia".into(),
                    tier: Tier::Legendary,
                },
            ],
            pool_keys: None,
            rate_up_multiplier: 1.0,
            updated_at: Utc::now(),
        };
        PoolBuilder::new(TierRates::default(), 1.0)
            .build(&banner, &catalog)
            .unwrap()
    }

    fn ctx<'a>(pool: &'a PoolSnapshot, rules: &'a PityRules) -> DrawContext<'a> {
        DrawContext {
            pool,
            pity: rules,
            max_fate_points: 2,
            featured_win_rate: 0.5,
            shiny_rate: 0.0,
        }
    }

    fn at_hard_pity() -> DrawState {
        DrawState {
            counters: PityCounters::new(89, 0),
            guarantee: FeaturedGuarantee::CoinFlip,
            target: None,
        }
    }

    #[test]
    fn test_hard_pity_always_yields_top_tier() {
        let pool = pool();
        let rules = PityRules::default();
        let rng = SeededRandomSource::new(7);
        for _ in 0..500 {
            let mut state = at_hard_pity();
            let result = resolve_draw(&ctx(&pool, &rules), &mut state, &rng).unwrap();
            assert!(result.tier.is_top());
            assert_eq!(state.counters, PityCounters::default());
        }
    }

    #[test]
    fn test_lost_coin_flip_guarantees_next_featured() {
        let pool = pool();
        let rules = PityRules::default();
        let rng = SeededRandomSource::new(11);
        let mut losses = 0;
        for _ in 0..2000 {
            let mut state = at_hard_pity();
            state.counters = PityCounters::new(89, 0);
            let first = resolve_draw(&ctx(&pool, &rules), &mut state, &rng).unwrap();
            if first.tier != Tier::Legendary || first.is_featured {
                continue;
            }
            losses += 1;
            assert_eq!(first.resolution, FeaturedResolution::LostCoinFlip);
            assert_eq!(state.guarantee, FeaturedGuarantee::Guaranteed);

            // 强制下一抽仍落在 Legendary 层级
            loop {
                state.counters = PityCounters::new(89, 0);
                let next = resolve_draw(&ctx(&pool, &rules), &mut state, &rng).unwrap();
                if next.tier == Tier::Legendary {
                    assert!(next.is_featured);
                    assert_eq!(next.resolution, FeaturedResolution::Guaranteed);
                    assert_eq!(state.guarantee, FeaturedGuarantee::CoinFlip);
                    break;
                }
            }
        }
        assert!(losses > 0);
    }

    #[test]
    fn test_target_path_converges() {
        let pool = pool();
        let rules = PityRules::default();
        let rng = SeededRandomSource::new(99);
        for _ in 0..200 {
            let mut state = DrawState {
                counters: PityCounters::new(89, 0),
                guarantee: FeaturedGuarantee::CoinFlip,
                target: Some(TargetPath::new("mewtwo")),
            };
            let mut legendary_draws = 0;
            loop {
                state.counters = PityCounters::new(89, 0);
                let r = resolve_draw(&ctx(&pool, &rules), &mut state, &rng).unwrap();
                if r.tier != Tier::Legendary {
                    continue;
                }
                legendary_draws += 1;
                if r.outcome.key() == "mewtwo" {
                    break;
                }
                assert!(legendary_draws <= 3, "target not reached after fate cap");
            }
            assert_eq!(state.target.as_ref().unwrap().fate_points, 0);
        }
    }

    #[test]
    fn test_forced_target_when_points_full() {
        let pool = pool();
        let rules = PityRules::default();
        let rng = SeededRandomSource::new(5);
        let mut seen = 0;
        while seen < 50 {
            let mut state = DrawState {
                counters: PityCounters::new(89, 0),
                guarantee: FeaturedGuarantee::CoinFlip,
                target: Some(TargetPath {
                    target_key: "lugia".into(),
                    fate_points: 2,
                }),
            };
            let r = resolve_draw(&ctx(&pool, &rules), &mut state, &rng).unwrap();
            if r.tier == Tier::Legendary {
                seen += 1;
                assert_eq!(r.outcome.key(), "lugia");
                assert_eq!(r.resolution, FeaturedResolution::TargetForced);
                assert!(r.fate.unwrap().target_satisfied);
            }
        }
    }

    #[test]
    fn test_shiny_roll_respects_rate() {
        let pool = pool();
        let rules = PityRules::default();
        let rng = SeededRandomSource::new(3);
        let mut c = ctx(&pool, &rules);
        c.shiny_rate = 1.0;
        let mut state = at_hard_pity();
        let r = resolve_draw(&c, &mut state, &rng).unwrap();
        assert!(r.is_variant);
        c.shiny_rate = 0.0;
        let r = resolve_draw(&c, &mut state, &rng).unwrap();
        assert!(!r.is_variant);
    }
}
