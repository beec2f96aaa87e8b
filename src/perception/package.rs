//! The perception package handed to validators and resolution flows
//!
//! Built fresh for one observer/target pair and never cached across
//! turns; token movement invalidates it.

use serde::{Deserialize, Serialize};

use crate::environment::Darkness;

/// Detail range in calm, unlit-by-necessity conditions, in meters
pub const STANDARD_DETAIL_RANGE_M: f64 = 60.0;

/// How well the observer can make the target out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityLevel {
    /// Close enough to act on detail
    DetailsOk,
    /// Shape and position only
    PresenceOnly,
    None,
}

/// How much of the target's silhouette is behind blockers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoverLevel {
    None,
    Light,
    Medium,
    Total,
}

impl CoverLevel {
    /// Attack modifier granted against a target in this much cover
    pub fn attack_modifier(&self) -> CoverModifier {
        match self {
            Self::None => CoverModifier::Flat(0),
            Self::Light => CoverModifier::Flat(-1),
            Self::Medium => CoverModifier::Flat(-3),
            Self::Total => CoverModifier::Unreachable,
        }
    }
}

/// Flat roll adjustment, or no legal attack at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverModifier {
    Flat(i32),
    Unreachable,
}

/// Stealth state as marked by the hosting application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Concealment {
    None,
    Hidden,
}

/// Everything one observer can tell about one target, this instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerceptionPackage {
    pub distance_m: f64,
    pub cells: u32,
    pub visibility: VisibilityLevel,
    pub detail_range_m: f64,
    pub cover: CoverLevel,
    pub concealment: Concealment,
    /// Difficulty bump for perceiving beyond detail range
    pub perception_dc_adjust: Option<u32>,
    pub cover_attack_modifier: CoverModifier,
    pub darkness: Darkness,
}
