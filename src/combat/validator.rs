//! Action validation before any dice are committed
//!
//! The validator builds a fresh perception package for the attack and
//! rejects it while everything is still side-effect free. Total cover
//! is checked before visibility so a target walled off inside blinding
//! darkness reads as unreachable rather than merely unseen.

use crate::combat::reach::ReachProfile;
use crate::core::{DuskError, Result, TokenId};
use crate::perception::{build_package, CoverLevel, PerceptionPackage, VisibilityLevel};
use crate::services::OcclusionService;
use crate::world::WorldContext;

/// Validate an attack declaration against the world as it stands
///
/// Rejections, in order: total cover, no line of sight, target beyond
/// `reach_m`. Passing `None` for reach skips the range check. On
/// success the caller gets the perception package the checks were made
/// against, ready to attach to the declaration.
pub fn validate_action(
    world: &WorldContext,
    occlusion: &dyn OcclusionService,
    attacker: TokenId,
    target: TokenId,
    reach_m: Option<f64>,
) -> Result<PerceptionPackage> {
    let package = build_package(world, occlusion, attacker, target)?;

    if package.cover == CoverLevel::Total {
        tracing::debug!("Validation rejected: target under total cover");
        return Err(DuskError::Unreachable);
    }
    if package.visibility == VisibilityLevel::None {
        tracing::debug!("Validation rejected: no line of sight");
        return Err(DuskError::NoVision);
    }
    if let Some(reach_m) = reach_m {
        if package.distance_m > reach_m {
            tracing::debug!(
                "Validation rejected: {:.1}m beyond reach {:.1}m",
                package.distance_m,
                reach_m
            );
            return Err(DuskError::OutOfRange {
                distance_m: package.distance_m,
                reach_m,
            });
        }
    }
    Ok(package)
}

/// Validate with a weapon's reach profile instead of raw meters
///
/// Resolves the attacker's size and the scene scale into a maximum
/// reach, then runs the standard checks.
pub fn validate_attack(
    world: &WorldContext,
    occlusion: &dyn OcclusionService,
    attacker: TokenId,
    target: TokenId,
    reach: &ReachProfile,
) -> Result<PerceptionPackage> {
    let size = world.token_size(attacker)?;
    let reach_m = reach.max_reach_m(size, &world.scene.scale);
    validate_action(world, occlusion, attacker, target, Some(reach_m))
}
