//! Progression tracks and rank-up arithmetic
//!
//! Every trainable thing lives on one of five tracks. An entry is a
//! `{level, rank, progress}` triple stored on the actor sheet under
//! `progression.<track>.<key>`; banked progress converts into rank-ups
//! once it crosses the current threshold.

use serde::{Deserialize, Serialize};

/// Progress needed per rank step: rank 0 -> 1 costs 10, rank 1 -> 2
/// costs 20, and so on
pub const PROGRESS_PER_RANK: u32 = 10;

/// The five trainable track families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressTrack {
    Weapons,
    Maneuvers,
    Relics,
    Evasion,
    Armor,
}

impl ProgressTrack {
    /// Sheet key under `progression.`
    pub fn key(&self) -> &'static str {
        match self {
            ProgressTrack::Weapons => "weapons",
            ProgressTrack::Maneuvers => "maneuvers",
            ProgressTrack::Relics => "relics",
            ProgressTrack::Evasion => "evasion",
            ProgressTrack::Armor => "armor",
        }
    }
}

/// One pending grant of progress on a track entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressAward {
    pub actor: crate::core::ActorId,
    pub track: ProgressTrack,
    pub key: String,
    pub amount: u32,
}

/// A stored track entry
///
/// `rank` feeds the learning-spread comparison, `level` feeds flat
/// check and armor formulas. Rank-ups raise both; seeded sheets may
/// hold them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressEntry {
    pub level: u32,
    pub rank: u32,
    pub progress: u32,
}

impl ProgressEntry {
    /// Progress required to leave the current rank
    pub fn next_rank_threshold(&self) -> u32 {
        (self.rank + 1) * PROGRESS_PER_RANK
    }

    /// Bank progress, converting full thresholds into rank-ups
    ///
    /// Overflow carries: banking 25 at rank 0 spends 10 on the step to
    /// rank 1 and keeps the remaining 15 banked toward the 20 needed
    /// for rank 2. Returns the number of rank-ups taken.
    pub fn bank(&mut self, amount: u32) -> u32 {
        self.progress += amount;
        let mut rank_ups = 0;
        while self.progress >= self.next_rank_threshold() {
            self.progress -= self.next_rank_threshold();
            self.rank += 1;
            self.level += 1;
            rank_ups += 1;
        }
        rank_ups
    }
}
