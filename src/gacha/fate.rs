//! Target path ("定轨") rules.
//!
//! A player nominates one featured outcome of a banner. Every featured-tier result
//! that is not the nominated outcome earns one fate point; once the points reach the
//! configured maximum, the next draw landing in the target's tier yields the target.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPath {
    pub target_key: String,
    pub fate_points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FateProgress {
    pub fate_points: u32,
    /// 抽到了目标, 点数归零
    pub target_satisfied: bool,
    /// 本次结果使点数恰好达到上限
    pub cap_reached: bool,
}

impl TargetPath {
    pub fn new(target_key: impl Into<String>) -> Self {
        Self {
            target_key: target_key.into(),
            fate_points: 0,
        }
    }

    /// Nominate `key`; returns true when the target actually changed.
    pub fn retarget(&mut self, key: &str) -> bool {
        if self.target_key == key {
            return false;
        }
        self.target_key = key.to_string();
        self.fate_points = 0;
        true
    }

    pub fn should_force(&self, max_fate_points: u32) -> bool {
        max_fate_points > 0 && self.fate_points >= max_fate_points
    }

    pub fn record_featured_result(
        &mut self,
        outcome_key: &str,
        max_fate_points: u32,
    ) -> FateProgress {
        if outcome_key == self.target_key {
            self.fate_points = 0;
            return FateProgress {
                fate_points: 0,
                target_satisfied: true,
                cap_reached: false,
            };
        }

        let before = self.fate_points;
        self.fate_points = (before + 1).min(max_fate_points);
        FateProgress {
            fate_points: self.fate_points,
            target_satisfied: false,
            cap_reached: before < max_fate_points && self.fate_points == max_fate_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_saturate_at_max() {
        let mut path = TargetPath::new("mewtwo");
        let first = path.record_featured_result("lugia", 2);
        assert_eq!(first.fate_points, 1);
        assert!(!first.cap_reached);
        let second = path.record_featured_result("lugia", 2);
        assert_eq!(second.fate_points, 2);
        assert!(second.cap_reached);
        let third = path.record_featured_result("ho_oh", 2);
        assert_eq!(third.fate_points, 2);
        assert!(!third.cap_reached);
        assert!(path.should_force(2));
    }

    #[test]
    fn test_winning_target_resets() {
        let mut path = TargetPath {
            target_key: "mewtwo".into(),
            fate_points: 2,
        };
        let progress = path.record_featured_result("mewtwo", 2);
        assert!(progress.target_satisfied);
        assert_eq!(path.fate_points, 0);
        assert!(!path.should_force(2));
    }

    #[test]
    fn test_retarget_resets_only_on_change() {
        let mut path = TargetPath {
            target_key: "mewtwo".into(),
            fate_points: 1,
        };
        assert!(!path.retarget("mewtwo"));
        assert_eq!(path.fate_points, 1);
        assert!(path.retarget("lugia"));
        assert_eq!(path.fate_points, 0);
        assert_eq!(path.target_key, "lugia");
    }

    #[test]
    fn test_zero_max_never_forces() {
        let mut path = TargetPath::new("mewtwo");
        path.record_featured_result("lugia", 0);
        assert_eq!(path.fate_points, 0);
        assert!(!path.should_force(0));
    }
}
