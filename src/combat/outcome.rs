//! Attack and defense roll outcomes
//!
//! All of combat resolution consumes rolls through [`CombatRollOutcome`],
//! regardless of which engine or fallback produced them. The policy the
//! roller chose travels with the total because the competency stage
//! branches on it.

use serde::{Deserialize, Serialize};

use crate::progression::ProgressTrack;

/// How a combatant chose to roll
///
/// `Execution` rolls twice and keeps the better total; `Learning` rolls
/// twice and keeps the worse, betting the spread against their rank for
/// a chance at progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollPolicy {
    Execution,
    Learning,
}

impl RollPolicy {
    /// Parse a sheet value; unknown strings fall back to `Execution`
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "learning" => RollPolicy::Learning,
            _ => RollPolicy::Execution,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            RollPolicy::Execution => "execution",
            RollPolicy::Learning => "learning",
        }
    }

    /// Pick the total this policy keeps out of a double roll
    pub fn keep(&self, first: i32, second: i32) -> i32 {
        match self {
            RollPolicy::Execution => first.max(second),
            RollPolicy::Learning => first.min(second),
        }
    }
}

impl Default for RollPolicy {
    fn default() -> Self {
        RollPolicy::Execution
    }
}

/// What was rolled with: a weapon, a maneuver, or a relic
///
/// The key doubles as the progression entry key, so awards land on the
/// same track the attack was made with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollMeta {
    pub key: String,
    pub is_maneuver: bool,
    pub is_relic: bool,
}

impl RollMeta {
    pub fn weapon(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_maneuver: false,
            is_relic: false,
        }
    }

    pub fn maneuver(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_maneuver: true,
            is_relic: false,
        }
    }

    pub fn relic(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_maneuver: false,
            is_relic: true,
        }
    }

    /// Progression track this roll trains
    pub fn track(&self) -> ProgressTrack {
        if self.is_relic {
            ProgressTrack::Relics
        } else if self.is_maneuver {
            ProgressTrack::Maneuvers
        } else {
            ProgressTrack::Weapons
        }
    }
}

/// A finished roll: the kept total, the policy that kept it, and the
/// raw pair when both dice totals are known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRollOutcome {
    pub total: i32,
    pub policy: RollPolicy,
    /// Both totals of the double roll; `None` for single-roll fallbacks
    pub pair: Option<(i32, i32)>,
    pub meta: RollMeta,
}

impl CombatRollOutcome {
    pub fn new(total: i32, policy: RollPolicy, meta: RollMeta) -> Self {
        Self {
            total,
            policy,
            pair: None,
            meta,
        }
    }

    /// Build from a double roll, keeping the total the policy dictates
    pub fn from_pair(first: i32, second: i32, policy: RollPolicy, meta: RollMeta) -> Self {
        Self {
            total: policy.keep(first, second),
            policy,
            pair: Some((first, second)),
            meta,
        }
    }

    /// Absolute spread between the two dice totals, when both are known
    pub fn learning_spread(&self) -> Option<u32> {
        self.pair.map(|(a, b)| a.abs_diff(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_key() {
        assert_eq!(RollPolicy::from_key("learning"), RollPolicy::Learning);
        assert_eq!(RollPolicy::from_key(" Learning "), RollPolicy::Learning);
        assert_eq!(RollPolicy::from_key("execution"), RollPolicy::Execution);
        assert_eq!(RollPolicy::from_key("anything"), RollPolicy::Execution);
    }

    #[test]
    fn test_execution_keeps_better_total() {
        let outcome = CombatRollOutcome::from_pair(12, 17, RollPolicy::Execution, RollMeta::weapon("sword"));
        assert_eq!(outcome.total, 17);
        assert_eq!(outcome.pair, Some((12, 17)));
    }

    #[test]
    fn test_learning_keeps_worse_total() {
        let outcome = CombatRollOutcome::from_pair(12, 17, RollPolicy::Learning, RollMeta::weapon("sword"));
        assert_eq!(outcome.total, 12);
        assert_eq!(outcome.learning_spread(), Some(5));
    }

    #[test]
    fn test_single_roll_has_no_spread() {
        let outcome = CombatRollOutcome::new(10, RollPolicy::Execution, RollMeta::weapon("sword"));
        assert_eq!(outcome.learning_spread(), None);
    }

    #[test]
    fn test_meta_selects_track() {
        assert_eq!(RollMeta::weapon("sword").track(), ProgressTrack::Weapons);
        assert_eq!(RollMeta::maneuver("riposte").track(), ProgressTrack::Maneuvers);
        assert_eq!(RollMeta::relic("sunblade").track(), ProgressTrack::Relics);
    }
}
