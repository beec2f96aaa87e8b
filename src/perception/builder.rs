//! Assembles perception packages from world, environment, and cover
//!
//! Pure geometry over the world context; nothing here suspends or
//! writes. Blinding darkness short-circuits before any ray is cast.

use crate::core::error::Result;
use crate::core::types::TokenId;
use crate::perception::cover::estimate_cover;
use crate::perception::package::{
    Concealment, CoverLevel, CoverModifier, PerceptionPackage, VisibilityLevel,
    STANDARD_DETAIL_RANGE_M,
};
use crate::services::ports::OcclusionService;
use crate::world::context::WorldContext;

/// Build the perception package for one observer/target pair
pub fn build_package(
    world: &WorldContext,
    occlusion: &dyn OcclusionService,
    observer: TokenId,
    target: TokenId,
) -> Result<PerceptionPackage> {
    let observer_token = world.token(observer)?;
    let target_token = world.token(target)?;
    let env = world.environment();

    let distance = world
        .scene
        .scale
        .distance(observer_token.position, target_token.position);
    let concealment = if target_token.hidden {
        Concealment::Hidden
    } else {
        Concealment::None
    };

    if env.darkness.is_blinding() {
        tracing::debug!(
            "Perception {} -> {}: blinded by {:?} darkness",
            observer_token.name,
            target_token.name,
            env.darkness
        );
        return Ok(PerceptionPackage {
            distance_m: distance.meters,
            cells: distance.cells,
            visibility: VisibilityLevel::None,
            detail_range_m: 0.0,
            cover: CoverLevel::Total,
            concealment,
            perception_dc_adjust: None,
            cover_attack_modifier: CoverModifier::Unreachable,
            darkness: env.darkness,
        });
    }

    let mut detail_range_m = STANDARD_DETAIL_RANGE_M;
    if let Some(cap) = env.weather_cap_m() {
        detail_range_m = detail_range_m.min(cap);
    }
    let light = world.effective_light(observer_token);
    if let Some(cap) = env.light_cap_m(light.as_ref()) {
        detail_range_m = detail_range_m.min(cap);
    }
    detail_range_m = detail_range_m.clamp(0.0, STANDARD_DETAIL_RANGE_M);

    let (visibility, perception_dc_adjust) = if distance.meters <= detail_range_m {
        (VisibilityLevel::DetailsOk, None)
    } else {
        // One difficulty point per two meters past detail range
        let over = distance.meters - detail_range_m;
        (VisibilityLevel::PresenceOnly, Some((over / 2.0).ceil() as u32))
    };

    let cover = estimate_cover(occlusion, observer_token.position, target_token);

    tracing::debug!(
        "Perception {} -> {}: {:.1}m ({} cells), detail {:.1}m, {:?}, cover {:?} ({}/{})",
        observer_token.name,
        target_token.name,
        distance.meters,
        distance.cells,
        detail_range_m,
        visibility,
        cover.level,
        cover.blocked,
        cover.samples
    );

    Ok(PerceptionPackage {
        distance_m: distance.meters,
        cells: distance.cells,
        visibility,
        detail_range_m,
        cover: cover.level,
        concealment,
        perception_dc_adjust,
        cover_attack_modifier: cover.level.attack_modifier(),
        darkness: env.darkness,
    })
}
