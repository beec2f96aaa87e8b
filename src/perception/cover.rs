//! Cover estimation by silhouette sampling
//!
//! Five rays from the observer, one per silhouette sample point; the
//! blocked fraction is banded into a cover level. An occlusion query
//! that fails counts as clear, so a flaky wall backend degrades toward
//! less cover rather than aborting the attack.

use glam::DVec2;

use crate::perception::package::CoverLevel;
use crate::services::ports::OcclusionService;
use crate::world::scene::Token;

/// Outcome of sampling one target's silhouette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverEstimate {
    pub level: CoverLevel,
    pub blocked: u32,
    pub samples: u32,
}

/// Band a blocked fraction into a cover level
///
/// Total only when every ray is blocked, with a little float slack,
/// then down through medium and light; ties go to the heavier band.
/// Defined over all of [0, 1] so a different sample count cannot
/// produce an unclassified fraction.
pub fn classify_cover(fraction: f64) -> CoverLevel {
    if fraction >= 0.99 {
        CoverLevel::Total
    } else if fraction >= 0.5 {
        CoverLevel::Medium
    } else if fraction >= 0.25 {
        CoverLevel::Light
    } else {
        CoverLevel::None
    }
}

/// Sample the target's silhouette and classify its cover
///
/// Tokens without a silhouette box are sampled at their position alone.
pub fn estimate_cover(
    occlusion: &dyn OcclusionService,
    observer: DVec2,
    target: &Token,
) -> CoverEstimate {
    let points: Vec<DVec2> = match &target.silhouette {
        Some(bounds) => bounds.sample_points().to_vec(),
        None => vec![target.position],
    };

    let samples = points.len() as u32;
    let blocked = points
        .iter()
        .filter(|point| match occlusion.sight_blocked(observer, **point) {
            Ok(blocked) => blocked,
            Err(err) => {
                tracing::warn!("Occlusion query failed, treating ray as clear: {}", err);
                false
            }
        })
        .count() as u32;

    let fraction = blocked as f64 / samples as f64;
    CoverEstimate {
        level: classify_cover(fraction),
        blocked,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::WallMapOcclusion;
    use crate::services::ports::OcclusionError;

    #[test]
    fn test_classification_bands() {
        assert_eq!(classify_cover(0.0), CoverLevel::None);
        assert_eq!(classify_cover(0.24), CoverLevel::None);
        assert_eq!(classify_cover(0.25), CoverLevel::Light);
        assert_eq!(classify_cover(0.4), CoverLevel::Light);
        assert_eq!(classify_cover(0.5), CoverLevel::Medium);
        assert_eq!(classify_cover(0.8), CoverLevel::Medium);
        assert_eq!(classify_cover(0.99), CoverLevel::Total);
        assert_eq!(classify_cover(1.0), CoverLevel::Total);
    }

    #[test]
    fn test_open_ground_is_no_cover() {
        let walls = WallMapOcclusion::new();
        let target =
            Token::new("orc", DVec2::new(200.0, 50.0)).with_silhouette(100.0, 100.0);
        let estimate = estimate_cover(&walls, DVec2::new(0.0, 50.0), &target);
        assert_eq!(estimate.level, CoverLevel::None);
        assert_eq!(estimate.blocked, 0);
        assert_eq!(estimate.samples, 5);
    }

    #[test]
    fn test_partial_wall_gives_medium_cover() {
        let mut walls = WallMapOcclusion::new();
        // Blocks the center and both side midpoints, misses top and bottom
        walls.add_wall(DVec2::new(100.0, 30.0), DVec2::new(100.0, 70.0));
        let target =
            Token::new("orc", DVec2::new(200.0, 50.0)).with_silhouette(100.0, 100.0);
        let estimate = estimate_cover(&walls, DVec2::new(0.0, 50.0), &target);
        assert_eq!(estimate.blocked, 3);
        assert_eq!(estimate.level, CoverLevel::Medium);
    }

    #[test]
    fn test_full_wall_gives_total_cover() {
        let mut walls = WallMapOcclusion::new();
        walls.add_wall(DVec2::new(100.0, -500.0), DVec2::new(100.0, 500.0));
        let target =
            Token::new("orc", DVec2::new(200.0, 50.0)).with_silhouette(100.0, 100.0);
        let estimate = estimate_cover(&walls, DVec2::new(0.0, 50.0), &target);
        assert_eq!(estimate.blocked, 5);
        assert_eq!(estimate.level, CoverLevel::Total);
    }

    #[test]
    fn test_missing_silhouette_samples_position_only() {
        let walls = WallMapOcclusion::new();
        let target = Token::new("orc", DVec2::new(200.0, 50.0));
        let estimate = estimate_cover(&walls, DVec2::new(0.0, 50.0), &target);
        assert_eq!(estimate.samples, 1);
    }

    struct FailingOcclusion;

    impl OcclusionService for FailingOcclusion {
        fn sight_blocked(&self, _from: DVec2, _to: DVec2) -> Result<bool, OcclusionError> {
            Err(OcclusionError::QueryFailed("wall index offline".to_string()))
        }
    }

    #[test]
    fn test_failed_queries_count_as_clear() {
        let target =
            Token::new("orc", DVec2::new(200.0, 50.0)).with_silhouette(100.0, 100.0);
        let estimate = estimate_cover(&FailingOcclusion, DVec2::new(0.0, 50.0), &target);
        assert_eq!(estimate.blocked, 0);
        assert_eq!(estimate.level, CoverLevel::None);
    }
}
