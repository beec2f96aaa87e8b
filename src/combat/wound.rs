//! Hit locations and wound application
//!
//! Damage lands on one of five body locations, drawn by weight when the
//! attack did not call its shot. Application walks an ordered ladder of
//! health models, using the richest one the target actually has.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::combat::constants::{HEALTH_VALUE_PATH, HEALTH_ZONES_PREFIX};
use crate::core::{ActorId, Result};
use crate::services::{ActorStore, WoundService};

/// Where a hit lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitLocation {
    Head,
    Chest,
    Arms,
    Legs,
    Feet,
}

impl HitLocation {
    /// Sheet key for zone pools and mitigation overrides
    pub fn key(&self) -> &'static str {
        match self {
            HitLocation::Head => "head",
            HitLocation::Chest => "chest",
            HitLocation::Arms => "arms",
            HitLocation::Legs => "legs",
            HitLocation::Feet => "feet",
        }
    }

    /// Relative chance of being struck, out of [`Self::total_weight`]
    pub fn hit_weight(&self) -> u32 {
        match self {
            HitLocation::Head => 1,
            HitLocation::Chest => 3,
            HitLocation::Arms => 2,
            HitLocation::Legs => 3,
            HitLocation::Feet => 1,
        }
    }

    pub fn total_weight() -> u32 {
        10
    }

    /// Draw a location with the standard weights
    pub fn draw(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..Self::total_weight()) {
            0 => HitLocation::Head,
            1..=3 => HitLocation::Chest,
            4..=5 => HitLocation::Arms,
            6..=8 => HitLocation::Legs,
            _ => HitLocation::Feet,
        }
    }
}

impl std::fmt::Display for HitLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Which health model absorbed the damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WoundModel {
    /// External wound subsystem took it
    Subsystem,
    /// Per-location pool at `health.zones.<location>.value`
    ZonePool,
    /// Single pool at `health.value`
    AggregatePool,
    /// No health model found; the wound exists only as a record
    RecordOnly,
}

/// Record of one applied wound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoundReport {
    pub location: HitLocation,
    pub amount: i32,
    pub model: WoundModel,
    /// Pool value after application, when a pool absorbed it
    pub remaining: Option<i64>,
}

/// Apply net damage through the health-model ladder
///
/// Tries the external wound subsystem first, then a per-location zone
/// pool, then the aggregate pool, and finally records the wound without
/// touching the sheet. A declining subsystem falls through; a failing
/// store read does not.
pub async fn apply_wound(
    store: &dyn ActorStore,
    wounds: Option<&dyn WoundService>,
    defender: ActorId,
    location: HitLocation,
    amount: i32,
) -> Result<WoundReport> {
    if let Some(service) = wounds {
        match service.apply(defender, location, amount).await {
            Ok(()) => {
                return Ok(WoundReport {
                    location,
                    amount,
                    model: WoundModel::Subsystem,
                    remaining: None,
                })
            }
            Err(err) => {
                tracing::warn!("Wound subsystem declined, falling back to pools: {}", err);
            }
        }
    }

    let zone_path = format!("{}.{}.value", HEALTH_ZONES_PREFIX, location.key());
    if let Some(value) = store
        .read_field(defender, &zone_path)
        .await?
        .and_then(|v| v.as_i64())
    {
        let next = value - i64::from(amount);
        store
            .write_fields(defender, vec![(zone_path, json!(next))])
            .await?;
        return Ok(WoundReport {
            location,
            amount,
            model: WoundModel::ZonePool,
            remaining: Some(next),
        });
    }

    if let Some(value) = store
        .read_field(defender, HEALTH_VALUE_PATH)
        .await?
        .and_then(|v| v.as_i64())
    {
        let next = value - i64::from(amount);
        store
            .write_fields(defender, vec![(HEALTH_VALUE_PATH.to_string(), json!(next))])
            .await?;
        return Ok(WoundReport {
            location,
            amount,
            model: WoundModel::AggregatePool,
            remaining: Some(next),
        });
    }

    tracing::debug!(
        "No health model on defender {}, wound recorded only",
        defender
    );
    Ok(WoundReport {
        location,
        amount,
        model: WoundModel::RecordOnly,
        remaining: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryStore, RecordingWounds};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weights_sum_to_total() {
        let sum: u32 = [
            HitLocation::Head,
            HitLocation::Chest,
            HitLocation::Arms,
            HitLocation::Legs,
            HitLocation::Feet,
        ]
        .iter()
        .map(|l| l.hit_weight())
        .sum();
        assert_eq!(sum, HitLocation::total_weight());
    }

    #[test]
    fn test_draw_covers_all_locations() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(HitLocation::draw(&mut rng));
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_draw_respects_weights_roughly() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut chest = 0;
        let mut head = 0;
        for _ in 0..10_000 {
            match HitLocation::draw(&mut rng) {
                HitLocation::Chest => chest += 1,
                HitLocation::Head => head += 1,
                _ => {}
            }
        }
        // Chest is weighted 3x head
        assert!(chest > head * 2);
    }

    #[tokio::test]
    async fn test_subsystem_takes_the_wound_first() {
        let actor = ActorId::new();
        let store = InMemoryStore::new();
        store.insert(actor, json!({"health": {"value": 20}}));
        let wounds = RecordingWounds::new();

        let report = apply_wound(&store, Some(&wounds), actor, HitLocation::Chest, 5)
            .await
            .unwrap();
        assert_eq!(report.model, WoundModel::Subsystem);
        assert_eq!(wounds.applied(), vec![(actor, HitLocation::Chest, 5)]);
        // Pool untouched
        let value = store.read_field(actor, "health.value").await.unwrap();
        assert_eq!(value.unwrap(), json!(20));
    }

    #[tokio::test]
    async fn test_zone_pool_preferred_over_aggregate() {
        let actor = ActorId::new();
        let store = InMemoryStore::new();
        store.insert(
            actor,
            json!({"health": {"value": 20, "zones": {"legs": {"value": 8}}}}),
        );

        let report = apply_wound(&store, None, actor, HitLocation::Legs, 3)
            .await
            .unwrap();
        assert_eq!(report.model, WoundModel::ZonePool);
        assert_eq!(report.remaining, Some(5));
        let aggregate = store.read_field(actor, "health.value").await.unwrap();
        assert_eq!(aggregate.unwrap(), json!(20));
    }

    #[tokio::test]
    async fn test_aggregate_pool_when_zone_missing() {
        let actor = ActorId::new();
        let store = InMemoryStore::new();
        store.insert(actor, json!({"health": {"value": 20}}));

        let report = apply_wound(&store, None, actor, HitLocation::Head, 6)
            .await
            .unwrap();
        assert_eq!(report.model, WoundModel::AggregatePool);
        assert_eq!(report.remaining, Some(14));
    }

    #[tokio::test]
    async fn test_record_only_without_health_model() {
        let actor = ActorId::new();
        let store = InMemoryStore::new();
        store.insert(actor, json!({"name": "Training Dummy"}));

        let report = apply_wound(&store, None, actor, HitLocation::Arms, 4)
            .await
            .unwrap();
        assert_eq!(report.model, WoundModel::RecordOnly);
        assert_eq!(report.remaining, None);
    }

    #[tokio::test]
    async fn test_offline_subsystem_falls_through_to_pool() {
        let actor = ActorId::new();
        let store = InMemoryStore::new();
        store.insert(actor, json!({"health": {"value": 10}}));
        let wounds = RecordingWounds::offline();

        let report = apply_wound(&store, Some(&wounds), actor, HitLocation::Feet, 2)
            .await
            .unwrap();
        assert_eq!(report.model, WoundModel::AggregatePool);
        assert_eq!(report.remaining, Some(8));
    }
}
