//! Impact and block sources
//!
//! Once a hit is confirmed, two numbers remain: how hard the attack
//! lands (impact) and how much the defender's protection absorbs
//! (block). Each is produced by an ordered chain of sources; the
//! orchestrator walks the chain and takes the first answer. Both
//! standard chains end in a source that always answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::combat::constants::{
    ARMOR_CATEGORY_PATH, ARMOR_MATERIAL_PATH, ARMOR_QUALITY_PATH, DAMAGE_BONUS_PATH,
    IMPACT_FALLBACK_BASE, MITIGATION_PATH_PREFIX,
};
use crate::combat::wound::HitLocation;
use crate::core::{ActorId, ItemId, Result};
use crate::progression::{InventoryRepo, ProgressionRepo, ProgressTrack};
use crate::services::{ActorStore, DamageEstimator, DiceService};

/// Worn armor weight class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmorCategory {
    None,
    Light,
    Medium,
    Heavy,
}

impl ArmorCategory {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "none" => Some(ArmorCategory::None),
            "light" => Some(ArmorCategory::Light),
            "medium" => Some(ArmorCategory::Medium),
            "heavy" => Some(ArmorCategory::Heavy),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ArmorCategory::None => "none",
            ArmorCategory::Light => "light",
            ArmorCategory::Medium => "medium",
            ArmorCategory::Heavy => "heavy",
        }
    }

    /// Base block for the full armor computation
    pub fn base_block(&self) -> i32 {
        match self {
            ArmorCategory::None => 0,
            ArmorCategory::Light => 2,
            ArmorCategory::Medium => 4,
            ArmorCategory::Heavy => 6,
        }
    }

    /// Flat block when nothing better is known about the armor
    pub fn flat_block(&self) -> i32 {
        match self {
            ArmorCategory::None => 0,
            ArmorCategory::Light => 1,
            ArmorCategory::Medium => 2,
            ArmorCategory::Heavy => 3,
        }
    }
}

/// Read the defender's worn armor category, `None` when unarmored
///
/// An explicit `"none"` entry and a missing entry both count as
/// unarmored; so does an unrecognized category string.
pub async fn worn_armor(
    store: &dyn ActorStore,
    defender: ActorId,
) -> Result<Option<ArmorCategory>> {
    let category = store
        .read_field(defender, ARMOR_CATEGORY_PATH)
        .await?
        .as_ref()
        .and_then(Value::as_str)
        .and_then(ArmorCategory::from_key)
        .filter(|category| *category != ArmorCategory::None);
    Ok(category)
}

/// Inputs to the impact chain
pub struct ImpactRequest<'a> {
    pub store: &'a dyn ActorStore,
    pub attacker: ActorId,
    /// Key of the weapon or maneuver the attack was made with
    pub weapon_key: &'a str,
    pub precomputed: Option<i32>,
    pub damage_formula: Option<&'a str>,
    pub weapon_item: Option<ItemId>,
}

/// Inputs to the block chain
pub struct BlockRequest<'a> {
    pub store: &'a dyn ActorStore,
    pub defender: ActorId,
    pub location: HitLocation,
}

/// One step in the impact chain; `Ok(None)` passes to the next source
#[async_trait]
pub trait ImpactSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn provide(&self, request: &ImpactRequest<'_>) -> Result<Option<i32>>;
}

/// One step in the block chain; `Ok(None)` passes to the next source
#[async_trait]
pub trait BlockSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn provide(&self, request: &BlockRequest<'_>) -> Result<Option<i32>>;
}

/// Uses an impact value the declaration already carries
pub struct PrecomputedImpact;

#[async_trait]
impl ImpactSource for PrecomputedImpact {
    fn name(&self) -> &'static str {
        "precomputed"
    }

    async fn provide(&self, request: &ImpactRequest<'_>) -> Result<Option<i32>> {
        Ok(request.precomputed)
    }
}

/// Rolls the attack's damage formula, from the declaration or the
/// weapon item's sheet record
pub struct WeaponFormulaImpact {
    dice: Arc<dyn DiceService>,
}

impl WeaponFormulaImpact {
    pub fn new(dice: Arc<dyn DiceService>) -> Self {
        Self { dice }
    }
}

#[async_trait]
impl ImpactSource for WeaponFormulaImpact {
    fn name(&self) -> &'static str {
        "weapon-formula"
    }

    async fn provide(&self, request: &ImpactRequest<'_>) -> Result<Option<i32>> {
        let formula = match request.damage_formula {
            Some(formula) => Some(formula.to_string()),
            None => match request.weapon_item {
                Some(item) => InventoryRepo::new(request.store)
                    .find(request.attacker, item)
                    .await?
                    .and_then(|record| {
                        record
                            .get("damage_formula")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    }),
                None => None,
            },
        };
        let Some(formula) = formula else {
            return Ok(None);
        };
        let total = self.dice.roll(&formula).await?;
        Ok(Some(total as i32))
    }
}

/// Asks the external damage estimator
pub struct EstimatorImpact {
    estimator: Arc<dyn DamageEstimator>,
}

impl EstimatorImpact {
    pub fn new(estimator: Arc<dyn DamageEstimator>) -> Self {
        Self { estimator }
    }
}

#[async_trait]
impl ImpactSource for EstimatorImpact {
    fn name(&self) -> &'static str {
        "estimator"
    }

    async fn provide(&self, request: &ImpactRequest<'_>) -> Result<Option<i32>> {
        let estimate = self
            .estimator
            .estimate_impact(request.attacker, request.weapon_key)
            .await?;
        Ok(Some(estimate))
    }
}

/// Terminal fallback: fixed baseline plus the attacker's flat bonus
pub struct ConstantImpact;

#[async_trait]
impl ImpactSource for ConstantImpact {
    fn name(&self) -> &'static str {
        "constant"
    }

    async fn provide(&self, request: &ImpactRequest<'_>) -> Result<Option<i32>> {
        let bonus = request
            .store
            .read_field(request.attacker, DAMAGE_BONUS_PATH)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(0) as i32;
        Ok(Some(IMPACT_FALLBACK_BASE + bonus))
    }
}

/// Uses a per-location mitigation value stored on the sheet
pub struct PrecomputedBlock;

#[async_trait]
impl BlockSource for PrecomputedBlock {
    fn name(&self) -> &'static str {
        "precomputed"
    }

    async fn provide(&self, request: &BlockRequest<'_>) -> Result<Option<i32>> {
        let path = format!("{}.{}", MITIGATION_PATH_PREFIX, request.location.key());
        let value = request
            .store
            .read_field(request.defender, &path)
            .await?
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        Ok(value)
    }
}

/// Full armor computation: category base + material bonus + competence
/// level + quality modifier
pub struct ArmorComputationBlock;

#[async_trait]
impl BlockSource for ArmorComputationBlock {
    fn name(&self) -> &'static str {
        "armor-computation"
    }

    async fn provide(&self, request: &BlockRequest<'_>) -> Result<Option<i32>> {
        let Some(category) = worn_armor(request.store, request.defender).await? else {
            return Ok(None);
        };
        let material = request
            .store
            .read_field(request.defender, ARMOR_MATERIAL_PATH)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(0) as i32;
        let quality = request
            .store
            .read_field(request.defender, ARMOR_QUALITY_PATH)
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(0) as i32;
        let competence = ProgressionRepo::new(request.store)
            .entry(request.defender, ProgressTrack::Armor, category.key())
            .await?
            .level as i32;
        Ok(Some(category.base_block() + material + competence + quality))
    }
}

/// Asks the external damage estimator
pub struct EstimatorBlock {
    estimator: Arc<dyn DamageEstimator>,
}

impl EstimatorBlock {
    pub fn new(estimator: Arc<dyn DamageEstimator>) -> Self {
        Self { estimator }
    }
}

#[async_trait]
impl BlockSource for EstimatorBlock {
    fn name(&self) -> &'static str {
        "estimator"
    }

    async fn provide(&self, request: &BlockRequest<'_>) -> Result<Option<i32>> {
        let estimate = self
            .estimator
            .estimate_block(request.defender, request.location)
            .await?;
        Ok(Some(estimate))
    }
}

/// Terminal fallback: flat value by worn category, zero when unarmored
pub struct CategoryFlatBlock;

#[async_trait]
impl BlockSource for CategoryFlatBlock {
    fn name(&self) -> &'static str {
        "category-flat"
    }

    async fn provide(&self, request: &BlockRequest<'_>) -> Result<Option<i32>> {
        let category = worn_armor(request.store, request.defender)
            .await?
            .unwrap_or(ArmorCategory::None);
        Ok(Some(category.flat_block()))
    }
}

/// The two resolved numbers side by side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactBlockResolution {
    pub impact: i32,
    pub block: i32,
}

impl ImpactBlockResolution {
    /// Damage that gets through, never negative
    pub fn net_damage(&self) -> i32 {
        (self.impact - self.block).max(0)
    }
}
