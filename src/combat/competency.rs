//! Competency comparison and progress awards
//!
//! After the defense roll lands, attack and defense totals meet here.
//! The winner decides whether resolution proceeds to damage; the two
//! policies decide who banks progress. Ties go to the attacker.

use crate::combat::constants::{AWARD_AMOUNT, EVASION_KEY};
use crate::combat::outcome::{CombatRollOutcome, RollPolicy};
use crate::core::ActorId;
use crate::progression::{ProgressAward, ProgressTrack};

/// Everything the comparison needs in one place
pub struct CompetencyInputs<'a> {
    pub attacker: ActorId,
    pub defender: ActorId,
    pub attack: &'a CombatRollOutcome,
    pub defense: &'a CombatRollOutcome,
    /// Attacker's rank on the track the attack was made with
    pub attacker_rank: u32,
    /// Category key of the defender's worn armor, `None` when unarmored
    pub defender_armor_key: Option<&'a str>,
}

/// Verdict of the comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetencyResult {
    pub attacker_wins: bool,
    pub attacker_learned: bool,
    pub proceed_to_damage: bool,
    pub awards: Vec<ProgressAward>,
}

fn attacker_award(inputs: &CompetencyInputs) -> ProgressAward {
    ProgressAward {
        actor: inputs.attacker,
        track: inputs.attack.meta.track(),
        key: inputs.attack.meta.key.clone(),
        amount: AWARD_AMOUNT,
    }
}

fn defender_evasion_award(inputs: &CompetencyInputs) -> ProgressAward {
    ProgressAward {
        actor: inputs.defender,
        track: ProgressTrack::Evasion,
        key: EVASION_KEY.to_string(),
        amount: AWARD_AMOUNT,
    }
}

/// Armor learns only when there is armor to learn with
fn defender_armor_award(inputs: &CompetencyInputs) -> Option<ProgressAward> {
    inputs.defender_armor_key.map(|key| ProgressAward {
        actor: inputs.defender,
        track: ProgressTrack::Armor,
        key: key.to_string(),
        amount: AWARD_AMOUNT,
    })
}

/// Compare totals and hand out awards per the policy pairing
///
/// The attacker learned when they rolled a `Learning` double and the
/// spread between the two totals exceeds their own rank. Defender-side
/// awards depend only on the defender's policy and who won: a losing
/// defender who rolled `Learning` banks armor progress (they were hit
/// in armor), a winning one banks evasion progress.
pub fn evaluate(inputs: &CompetencyInputs) -> CompetencyResult {
    let attacker_wins = inputs.attack.total >= inputs.defense.total;
    let attacker_learned = inputs.attack.policy == RollPolicy::Learning
        && inputs
            .attack
            .learning_spread()
            .is_some_and(|spread| spread > inputs.attacker_rank);

    let mut awards = Vec::new();
    match (inputs.attack.policy, inputs.defense.policy, attacker_wins) {
        (RollPolicy::Execution, RollPolicy::Execution, _) => {}
        (RollPolicy::Learning, RollPolicy::Learning, true) => {
            if attacker_learned {
                awards.push(attacker_award(inputs));
            }
            awards.extend(defender_armor_award(inputs));
        }
        (RollPolicy::Learning, RollPolicy::Learning, false) => {
            awards.push(defender_evasion_award(inputs));
        }
        (RollPolicy::Learning, RollPolicy::Execution, true) => {
            if attacker_learned {
                awards.push(attacker_award(inputs));
            }
        }
        (RollPolicy::Learning, RollPolicy::Execution, false) => {}
        (RollPolicy::Execution, RollPolicy::Learning, true) => {
            awards.extend(defender_armor_award(inputs));
        }
        (RollPolicy::Execution, RollPolicy::Learning, false) => {
            awards.push(defender_evasion_award(inputs));
        }
    }

    tracing::debug!(
        "Competency: attack {} ({}) vs defense {} ({}) -> wins={} learned={} awards={}",
        inputs.attack.total,
        inputs.attack.policy.key(),
        inputs.defense.total,
        inputs.defense.policy.key(),
        attacker_wins,
        attacker_learned,
        awards.len()
    );

    CompetencyResult {
        attacker_wins,
        attacker_learned,
        proceed_to_damage: attacker_wins,
        awards,
    }
}
