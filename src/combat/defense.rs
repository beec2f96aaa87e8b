//! Defense roll acquisition
//!
//! The defender's total comes from an ordered chain of sources. The
//! standard chain asks the roll engine (using the defender's own
//! formula and policy), then falls back to a flat evasion check, then
//! puts the question to the operator. Declining the operator dialog
//! cancels the whole resolution.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::combat::constants::{
    DEFENSE_FORMULA_PATH, DEFENSE_POLICY_PATH, EVASION_KEY, NEUTRAL_DEFENSE_TOTAL,
};
use crate::combat::outcome::{CombatRollOutcome, RollMeta, RollPolicy};
use crate::core::{ActorId, DuskError, Result};
use crate::progression::{ProgressionRepo, ProgressTrack};
use crate::services::{ActorStore, DiceService, PromptAnswer, PromptService};
use crate::world::WorldContext;

/// What a defense source gets to work with
pub struct DefenseRequest<'a> {
    pub world: &'a WorldContext,
    pub store: &'a dyn ActorStore,
    pub defender: ActorId,
    pub attack: &'a CombatRollOutcome,
}

/// One step in the defense chain; `Ok(None)` passes to the next source
#[async_trait]
pub trait DefenseSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn provide(&self, request: &DefenseRequest<'_>) -> Result<Option<CombatRollOutcome>>;
}

fn defense_meta() -> RollMeta {
    RollMeta {
        key: EVASION_KEY.to_string(),
        is_maneuver: false,
        is_relic: false,
    }
}

/// Stand-in when every source passed: a flat neutral total
pub fn neutral_defense() -> CombatRollOutcome {
    CombatRollOutcome::new(
        NEUTRAL_DEFENSE_TOTAL,
        RollPolicy::Execution,
        defense_meta(),
    )
}

/// Rolls the defender's own defense formula twice under their policy
pub struct EngineRollSource {
    dice: Arc<dyn DiceService>,
}

impl EngineRollSource {
    pub fn new(dice: Arc<dyn DiceService>) -> Self {
        Self { dice }
    }
}

#[async_trait]
impl DefenseSource for EngineRollSource {
    fn name(&self) -> &'static str {
        "engine"
    }

    async fn provide(&self, request: &DefenseRequest<'_>) -> Result<Option<CombatRollOutcome>> {
        let Some(formula) = request
            .store
            .read_field(request.defender, DEFENSE_FORMULA_PATH)
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            return Ok(None);
        };
        let policy = request
            .store
            .read_field(request.defender, DEFENSE_POLICY_PATH)
            .await?
            .as_ref()
            .and_then(Value::as_str)
            .map(RollPolicy::from_key)
            .unwrap_or_default();

        let first = self.dice.roll(&formula).await? as i32;
        let second = self.dice.roll(&formula).await? as i32;
        let outcome = CombatRollOutcome::from_pair(first, second, policy, defense_meta());
        tracing::debug!(
            "Engine defense: {} rolled twice -> ({}, {}) keep {} under {}",
            formula,
            first,
            second,
            outcome.total,
            policy.key()
        );
        Ok(Some(outcome))
    }
}

/// Generic skill check: `1d20` plus the defender's evasion level
pub struct FlatCheckSource {
    dice: Arc<dyn DiceService>,
}

impl FlatCheckSource {
    pub fn new(dice: Arc<dyn DiceService>) -> Self {
        Self { dice }
    }
}

#[async_trait]
impl DefenseSource for FlatCheckSource {
    fn name(&self) -> &'static str {
        "flat-check"
    }

    async fn provide(&self, request: &DefenseRequest<'_>) -> Result<Option<CombatRollOutcome>> {
        let level = ProgressionRepo::new(request.store)
            .entry(request.defender, ProgressTrack::Evasion, EVASION_KEY)
            .await?
            .level;
        let formula = format!("1d20+{}", level);
        let total = self.dice.roll(&formula).await? as i32;
        tracing::debug!("Flat defense check: {} -> {}", formula, total);
        Ok(Some(CombatRollOutcome::new(
            total,
            RollPolicy::Execution,
            defense_meta(),
        )))
    }
}

/// Last resort: ask the operator to resolve the defense by hand
///
/// A dismissed or declined dialog cancels the resolution; a confirmed
/// dialog with a blank total falls back to the neutral default.
pub struct OperatorConfirmSource {
    prompts: Arc<dyn PromptService>,
}

impl OperatorConfirmSource {
    pub fn new(prompts: Arc<dyn PromptService>) -> Self {
        Self { prompts }
    }
}

#[async_trait]
impl DefenseSource for OperatorConfirmSource {
    fn name(&self) -> &'static str {
        "operator"
    }

    async fn provide(&self, request: &DefenseRequest<'_>) -> Result<Option<CombatRollOutcome>> {
        let defender_name = request
            .world
            .actor(request.defender)
            .map(|profile| profile.name.as_str())
            .unwrap_or("the defender");
        let body = format!(
            "No roll engine answered for {}. Attack total is {}. Resolve the defense by hand?",
            defender_name, request.attack.total
        );
        match self.prompts.confirm("Defense roll needed", &body).await {
            Some(true) => {}
            Some(false) | None => return Err(DuskError::UserCancelled),
        }
        let total = match self
            .prompts
            .request_total("Manual defense", "Defense total")
            .await
        {
            PromptAnswer::Entered(total) => total as i32,
            PromptAnswer::Blank => NEUTRAL_DEFENSE_TOTAL,
            PromptAnswer::Dismissed => return Err(DuskError::UserCancelled),
        };
        Ok(Some(CombatRollOutcome::new(
            total,
            RollPolicy::Execution,
            defense_meta(),
        )))
    }
}
