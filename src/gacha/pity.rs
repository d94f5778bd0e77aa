//! Pity counters and the tier-weight adjustment they drive.

use crate::entities::Tier;
use crate::gacha::pool::TierWeights;
use serde::{Deserialize, Serialize};

/// 保底参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PityRules {
    /// 第 hard_pity 抽必出 Legendary 及以上
    pub hard_pity: u32,
    /// 计数达到此值后开始提升顶级概率
    pub soft_pity_start: u32,
    pub soft_pity_increment: f64,
    /// 第 second_hard_pity 抽必出 Epic 及以上
    pub second_hard_pity: u32,
}

impl Default for PityRules {
    fn default() -> Self {
        Self {
            hard_pity: 90,
            soft_pity_start: 74,
            soft_pity_increment: 0.06,
            second_hard_pity: 10,
        }
    }
}

impl PityRules {
    pub fn validate(&self) -> Result<(), String> {
        if self.hard_pity == 0 {
            return Err("hard_pity must be positive".into());
        }
        if self.soft_pity_start >= self.hard_pity {
            return Err("soft_pity_start must be below hard_pity".into());
        }
        if !self.soft_pity_increment.is_finite() || self.soft_pity_increment < 0.0 {
            return Err("soft_pity_increment must be a non-negative number".into());
        }
        if self.second_hard_pity == 0 {
            return Err("second_hard_pity must be positive".into());
        }
        Ok(())
    }

    pub fn is_hard_pity(&self, counters: PityCounters) -> bool {
        counters.pulls_since_top + 1 >= self.hard_pity
    }

    pub fn is_second_hard_pity(&self, counters: PityCounters) -> bool {
        counters.pulls_since_second + 1 >= self.second_hard_pity
    }

    pub fn soft_pity_active(&self, counters: PityCounters) -> bool {
        counters.pulls_since_top >= self.soft_pity_start && !self.is_hard_pity(counters)
    }

    /// 距离硬保底还差的抽数 (包含触发保底的那一抽)
    pub fn pulls_until_hard_pity(&self, counters: PityCounters) -> u32 {
        self.hard_pity.saturating_sub(counters.pulls_since_top)
    }

    /// Probability-mass adjustment for the next pull.
    pub fn adjust(&self, base: TierWeights, counters: PityCounters) -> TierWeights {
        let mut weights = base;
        let total = weights.total();
        if total <= 0.0 {
            return weights;
        }

        let top_mass = weights.sum_where(Tier::is_top);
        if self.is_hard_pity(counters) && top_mass > 0.0 {
            weights.scale_where(|t| !t.is_top(), 0.0);
            return weights;
        }

        if counters.pulls_since_top >= self.soft_pity_start && top_mass > 0.0 {
            let base_share = top_mass / total;
            let steps = f64::from(counters.pulls_since_top - self.soft_pity_start + 1);
            let share = (base_share + steps * self.soft_pity_increment).min(1.0);
            let rest_mass = total - top_mass;
            weights.scale_where(Tier::is_top, share * total / top_mass);
            if rest_mass > 0.0 {
                weights.scale_where(|t| !t.is_top(), (1.0 - share) * total / rest_mass);
            }
        }

        if self.is_second_hard_pity(counters) && weights.sum_where(Tier::is_second_or_above) > 0.0
        {
            weights.scale_where(|t| !t.is_second_or_above(), 0.0);
        }

        weights
    }

    /// Current probability that the next pull is top tier.
    pub fn top_tier_chance(&self, base: TierWeights, counters: PityCounters) -> f64 {
        let adjusted = self.adjust(base, counters);
        let total = adjusted.total();
        if total <= 0.0 {
            return 0.0;
        }
        adjusted.sum_where(Tier::is_top) / total
    }
}

/// 单个 (玩家, 卡池) 的保底计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PityCounters {
    pub pulls_since_top: u32,
    pub pulls_since_second: u32,
}

impl PityCounters {
    pub fn new(pulls_since_top: u32, pulls_since_second: u32) -> Self {
        Self {
            pulls_since_top,
            pulls_since_second,
        }
    }

    /// 顶级结果重置两个计数; Epic 只重置小保底计数
    pub fn after_outcome(self, tier: Tier) -> Self {
        if tier.is_top() {
            Self::default()
        } else if tier.is_second_or_above() {
            Self {
                pulls_since_top: self.pulls_since_top.saturating_add(1),
                pulls_since_second: 0,
            }
        } else {
            Self {
                pulls_since_top: self.pulls_since_top.saturating_add(1),
                pulls_since_second: self.pulls_since_second.saturating_add(1),
            }
        }
    }
}
