//! Weapon reach envelopes
//!
//! Reach answers one question for the action validator: how far, in
//! world meters, can this attacker threaten? Melee reach is declared in
//! cells and scaled through the grid; thrown and ranged reach is
//! declared in meters and used as-is.

use serde::{Deserialize, Serialize};

use crate::grid::GridScale;
use crate::world::SizeCategory;

/// Delivery mode of an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReachKind {
    Melee,
    Thrown,
    Ranged,
}

/// A weapon's reach declaration before size and scale are applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachProfile {
    pub kind: ReachKind,
    /// Cells for melee, meters for thrown and ranged
    pub base: f64,
}

impl ReachProfile {
    pub fn melee(cells: f64) -> Self {
        Self {
            kind: ReachKind::Melee,
            base: cells,
        }
    }

    pub fn thrown(meters: f64) -> Self {
        Self {
            kind: ReachKind::Thrown,
            base: meters,
        }
    }

    pub fn ranged(meters: f64) -> Self {
        Self {
            kind: ReachKind::Ranged,
            base: meters,
        }
    }

    /// Maximum threatened distance in meters
    ///
    /// Melee converts cells to meters through the scene scale. Thrown
    /// and ranged weapons add the size bonus directly in meters, which
    /// keeps long arms long regardless of how coarse the grid is.
    pub fn max_reach_m(&self, size: SizeCategory, scale: &GridScale) -> f64 {
        let bonus = size.reach_bonus_cells() as f64;
        match self.kind {
            ReachKind::Melee => (self.base + bonus) * scale.meters_per_cell,
            ReachKind::Thrown | ReachKind::Ranged => self.base + bonus,
        }
    }
}
