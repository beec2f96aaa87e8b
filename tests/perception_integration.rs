//! Perception pipeline integration tests
//!
//! Scenarios run through `build_package` and the action validator the
//! way a hosting application would, with real scenes and wall maps.

use duskmantle::combat::validate_action;
use duskmantle::environment::{
    Darkness, EnvironmentDefaults, FogIntensity, LightKind, LightSource, SceneEnvironment, Weather,
};
use duskmantle::grid::GridScale;
use duskmantle::perception::{
    build_package, Concealment, CoverLevel, CoverModifier, VisibilityLevel,
    STANDARD_DETAIL_RANGE_M,
};
use duskmantle::services::WallMapOcclusion;
use duskmantle::world::{Scene, Token, WorldContext};
use duskmantle::DuskError;
use glam::DVec2;

fn diagonal_world() -> (WorldContext, duskmantle::core::TokenId, duskmantle::core::TokenId) {
    // Ten cells across and ten down at one meter per cell
    let mut scene = Scene::new("moor", GridScale::default());
    let observer = scene.place(Token::new("scout", DVec2::new(0.0, 0.0)));
    let target = scene.place(Token::new("rider", DVec2::new(1000.0, 1000.0)));
    let world = WorldContext::new(scene, EnvironmentDefaults::default());
    (world, observer, target)
}

#[test]
fn test_clear_day_diagonal_distance() {
    let (world, observer, target) = diagonal_world();
    let occlusion = WallMapOcclusion::new();

    let package = build_package(&world, &occlusion, observer, target).unwrap();

    // Ten straight plus ten diagonal pairs up to fifteen cells
    assert_eq!(package.cells, 15);
    assert!((package.distance_m - 15.0).abs() < 1e-9);
    assert_eq!(package.visibility, VisibilityLevel::DetailsOk);
    assert_eq!(package.detail_range_m, STANDARD_DETAIL_RANGE_M);
    assert_eq!(package.perception_dc_adjust, None);
    assert_eq!(package.cover, CoverLevel::None);
    assert_eq!(package.cover_attack_modifier, CoverModifier::Flat(0));
    assert_eq!(package.concealment, Concealment::None);
}

#[test]
fn test_dense_fog_with_torch_throttles_detail() {
    let (mut world, observer, target) = diagonal_world();
    world.scene.environment = Some(SceneEnvironment {
        weather: Some(Weather::Fog(FogIntensity::Dense)),
        ..Default::default()
    });
    // The scout carries a torch; dense fog chokes it down to two meters
    if let Some(token) = world.scene.token_mut(observer) {
        token.light = Some(LightSource::new(LightKind::Torch));
    }
    let occlusion = WallMapOcclusion::new();

    let package = build_package(&world, &occlusion, observer, target).unwrap();

    assert!((package.detail_range_m - 2.0).abs() < 1e-9);
    assert_eq!(package.visibility, VisibilityLevel::PresenceOnly);
    // ceil((15 - 2) / 2) = 7
    assert_eq!(package.perception_dc_adjust, Some(7));
}

#[test]
fn test_partial_wall_gives_medium_cover() {
    let mut scene = Scene::new("alley", GridScale::default());
    let observer = scene.place(Token::new("scout", DVec2::new(0.0, 50.0)));
    let target = scene.place(
        Token::new("rider", DVec2::new(200.0, 50.0)).with_silhouette(100.0, 100.0),
    );
    let world = WorldContext::new(scene, EnvironmentDefaults::default());

    let mut occlusion = WallMapOcclusion::new();
    // Cuts the three level rays, misses the high and low ones
    occlusion.add_wall(DVec2::new(100.0, 30.0), DVec2::new(100.0, 70.0));

    let package = build_package(&world, &occlusion, observer, target).unwrap();

    assert_eq!(package.cover, CoverLevel::Medium);
    assert_eq!(package.cover_attack_modifier, CoverModifier::Flat(-3));
    // Medium cover is an attack penalty, not a sight blocker
    assert_eq!(package.visibility, VisibilityLevel::DetailsOk);
}

#[test]
fn test_hidden_token_reports_concealment() {
    let (mut world, observer, target) = diagonal_world();
    if let Some(token) = world.scene.token_mut(target) {
        token.hidden = true;
    }
    let occlusion = WallMapOcclusion::new();

    let package = build_package(&world, &occlusion, observer, target).unwrap();
    assert_eq!(package.concealment, Concealment::Hidden);
}

#[test]
fn test_blinding_darkness_blacks_out_the_package() {
    let (mut world, observer, target) = diagonal_world();
    world.scene.environment = Some(SceneEnvironment {
        darkness: Some(Darkness::Elemental),
        ..Default::default()
    });
    let occlusion = WallMapOcclusion::new();

    let package = build_package(&world, &occlusion, observer, target).unwrap();

    assert_eq!(package.visibility, VisibilityLevel::None);
    assert_eq!(package.detail_range_m, 0.0);
    assert_eq!(package.cover, CoverLevel::Total);
    assert_eq!(package.cover_attack_modifier, CoverModifier::Unreachable);
    // Distance is still reported for the record
    assert_eq!(package.cells, 15);
}

#[test]
fn test_validator_rejects_blinding_darkness_as_unreachable() {
    let (mut world, observer, target) = diagonal_world();
    world.scene.environment = Some(SceneEnvironment {
        darkness: Some(Darkness::Elemental),
        ..Default::default()
    });
    let occlusion = WallMapOcclusion::new();

    let result = validate_action(&world, &occlusion, observer, target, None);
    assert!(matches!(result, Err(DuskError::Unreachable)));
}

#[test]
fn test_validator_enforces_reach_after_sight() {
    let (world, observer, target) = diagonal_world();
    let occlusion = WallMapOcclusion::new();

    // 15m apart: a 10m thrown envelope falls short
    let result = validate_action(&world, &occlusion, observer, target, Some(10.0));
    assert!(matches!(result, Err(DuskError::OutOfRange { .. })));

    let package = validate_action(&world, &occlusion, observer, target, Some(20.0)).unwrap();
    assert_eq!(package.cells, 15);
}
