//! Combat resolution constants - all tunable values in one place
//!
//! Modifiers are ADDITIVE flat values. No percentage scaling anywhere
//! in the resolution pipeline.

// Defense fallback constants
pub const NEUTRAL_DEFENSE_TOTAL: i32 = 10;
pub const EVASION_KEY: &str = "dodge";

// Impact fallback constants
pub const IMPACT_FALLBACK_BASE: i32 = 4;

// Competency award constants
pub const AWARD_AMOUNT: u32 = 1;

// Actor sheet paths read by the resolution pipeline
pub const DEFENSE_FORMULA_PATH: &str = "combat.defense_formula";
pub const DEFENSE_POLICY_PATH: &str = "combat.policy";
pub const DAMAGE_BONUS_PATH: &str = "combat.damage_bonus";
pub const ARMOR_CATEGORY_PATH: &str = "combat.armor.category";
pub const ARMOR_MATERIAL_PATH: &str = "combat.armor.material_bonus";
pub const ARMOR_QUALITY_PATH: &str = "combat.armor.quality_modifier";
pub const MITIGATION_PATH_PREFIX: &str = "combat.mitigation";
pub const HEALTH_VALUE_PATH: &str = "health.value";
pub const HEALTH_ZONES_PREFIX: &str = "health.zones";
