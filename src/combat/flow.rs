//! The defense-flow orchestrator
//!
//! One resolution runs four stages in order: acquire a defense roll,
//! compare competencies and bank progress, resolve impact against
//! block, and apply the wound. Each stage draws its numbers from an
//! ordered source chain; the flow takes the first answer, logs sources
//! that pass or fail, and keeps going.
//!
//! Cancellation is a value, not an error: an operator who declines a
//! dialog ends the resolution with an `Aborted` record. Side effects
//! already committed (banked progress, spent uses) stay committed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use crate::combat::competency::{self, CompetencyInputs};
use crate::combat::constants::IMPACT_FALLBACK_BASE;
use crate::combat::defense::{
    neutral_defense, DefenseRequest, DefenseSource, EngineRollSource, FlatCheckSource,
    OperatorConfirmSource,
};
use crate::combat::mitigation::{
    worn_armor, ArmorComputationBlock, BlockRequest, BlockSource, CategoryFlatBlock,
    ConstantImpact, EstimatorBlock, EstimatorImpact, ImpactBlockResolution, ImpactRequest,
    ImpactSource, PrecomputedBlock, PrecomputedImpact, WeaponFormulaImpact,
};
use crate::combat::outcome::CombatRollOutcome;
use crate::combat::wound::{apply_wound, HitLocation, WoundReport};
use crate::core::{ActorId, DuskError, ItemId, Result, TokenId};
use crate::perception::PerceptionPackage;
use crate::progression::{ProgressAward, ProgressionRepo};
use crate::services::{
    ActorStore, Audience, DamageEstimator, DiceService, MessageSink, PromptService, WoundService,
};
use crate::world::WorldContext;

/// A declared attack, already validated against the perception package
#[derive(Debug, Clone)]
pub struct AttackDeclaration {
    pub attacker: TokenId,
    pub target: TokenId,
    pub outcome: CombatRollOutcome,
    /// Damage formula taking precedence over the weapon item's own
    pub damage_formula: Option<String>,
    pub weapon_item: Option<ItemId>,
    pub precomputed_impact: Option<i32>,
    /// Called shot; drawn by weight when absent
    pub location: Option<HitLocation>,
    pub perception: PerceptionPackage,
}

impl AttackDeclaration {
    pub fn new(
        attacker: TokenId,
        target: TokenId,
        outcome: CombatRollOutcome,
        perception: PerceptionPackage,
    ) -> Self {
        Self {
            attacker,
            target,
            outcome,
            damage_formula: None,
            weapon_item: None,
            precomputed_impact: None,
            location: None,
            perception,
        }
    }

    pub fn with_damage_formula(mut self, formula: impl Into<String>) -> Self {
        self.damage_formula = Some(formula.into());
        self
    }

    pub fn with_weapon_item(mut self, item: ItemId) -> Self {
        self.weapon_item = Some(item);
        self
    }

    pub fn with_precomputed_impact(mut self, impact: i32) -> Self {
        self.precomputed_impact = Some(impact);
        self
    }

    pub fn with_location(mut self, location: HitLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// How a resolution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Operator cancelled mid-flow
    Aborted,
    /// Defense won; nothing happened
    NoEffect,
    /// Hit confirmed but protection absorbed everything
    NoDamage,
    /// Damage went through
    Wounded,
}

/// Full record of one resolution
#[derive(Debug, Clone)]
pub struct ResolutionRecord {
    pub attacker: ActorId,
    pub defender: ActorId,
    pub attack_total: i32,
    pub defense_total: Option<i32>,
    pub outcome: ResolutionOutcome,
    pub awards: Vec<ProgressAward>,
    pub resolution: Option<ImpactBlockResolution>,
    pub wound: Option<WoundReport>,
}

/// Source chains in resolution order
pub struct FlowConfig {
    pub defense_sources: Vec<Box<dyn DefenseSource>>,
    pub impact_sources: Vec<Box<dyn ImpactSource>>,
    pub block_sources: Vec<Box<dyn BlockSource>>,
}

impl FlowConfig {
    /// The standard chains in their standard order
    ///
    /// Defense: engine roll, flat evasion check, operator dialog.
    /// Impact: precomputed, weapon formula, estimator, constant.
    /// Block: precomputed, armor computation, estimator, category flat.
    /// The estimator steps appear only when an estimator is wired in.
    pub fn standard(
        dice: Arc<dyn DiceService>,
        prompts: Arc<dyn PromptService>,
        estimator: Option<Arc<dyn DamageEstimator>>,
    ) -> Self {
        let defense_sources: Vec<Box<dyn DefenseSource>> = vec![
            Box::new(EngineRollSource::new(dice.clone())),
            Box::new(FlatCheckSource::new(dice.clone())),
            Box::new(OperatorConfirmSource::new(prompts)),
        ];

        let mut impact_sources: Vec<Box<dyn ImpactSource>> = vec![
            Box::new(PrecomputedImpact),
            Box::new(WeaponFormulaImpact::new(dice)),
        ];
        let mut block_sources: Vec<Box<dyn BlockSource>> =
            vec![Box::new(PrecomputedBlock), Box::new(ArmorComputationBlock)];
        if let Some(estimator) = estimator {
            impact_sources.push(Box::new(EstimatorImpact::new(estimator.clone())));
            block_sources.push(Box::new(EstimatorBlock::new(estimator)));
        }
        impact_sources.push(Box::new(ConstantImpact));
        block_sources.push(Box::new(CategoryFlatBlock));

        Self {
            defense_sources,
            impact_sources,
            block_sources,
        }
    }
}

/// Runs declared attacks through the four resolution stages
pub struct DefenseFlow {
    config: FlowConfig,
    store: Arc<dyn ActorStore>,
    messages: Arc<dyn MessageSink>,
    wounds: Option<Arc<dyn WoundService>>,
    rng: StdRng,
}

impl DefenseFlow {
    pub fn new(
        config: FlowConfig,
        store: Arc<dyn ActorStore>,
        messages: Arc<dyn MessageSink>,
        seed: u64,
    ) -> Self {
        Self {
            config,
            store,
            messages,
            wounds: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_wound_service(mut self, wounds: Arc<dyn WoundService>) -> Self {
        self.wounds = Some(wounds);
        self
    }

    /// Resolve one declared attack end to end
    ///
    /// `Err` means the resolution could not run at all (unknown tokens,
    /// store failure). Everything the flow can recover from, including
    /// operator cancellation, comes back as an `Ok` record.
    pub async fn resolve(
        &mut self,
        world: &WorldContext,
        declaration: AttackDeclaration,
    ) -> Result<ResolutionRecord> {
        let attacker = world.token_actor(declaration.attacker)?;
        let defender = world.token_actor(declaration.target)?;
        let attacker_name = world.token(declaration.attacker)?.name.clone();
        let defender_name = world.token(declaration.target)?.name.clone();

        tracing::info!(
            "Resolving attack: {} -> {} at {:.1}m, attack total {}",
            attacker_name,
            defender_name,
            declaration.perception.distance_m,
            declaration.outcome.total
        );

        let aborted = |awards: Vec<ProgressAward>, defense_total: Option<i32>| ResolutionRecord {
            attacker,
            defender,
            attack_total: declaration.outcome.total,
            defense_total,
            outcome: ResolutionOutcome::Aborted,
            awards,
            resolution: None,
            wound: None,
        };

        // Stage 1: defense roll
        let defense = match self.acquire_defense(world, defender, &declaration).await {
            Ok(defense) => defense,
            Err(DuskError::UserCancelled) => {
                tracing::debug!("Resolution aborted at the defense stage");
                return Ok(aborted(Vec::new(), None));
            }
            Err(err) => return Err(err),
        };

        // Stage 2: competency comparison and awards
        let attacker_rank = ProgressionRepo::new(self.store.as_ref())
            .entry(
                attacker,
                declaration.outcome.meta.track(),
                &declaration.outcome.meta.key,
            )
            .await?
            .rank;
        let armor = worn_armor(self.store.as_ref(), defender).await?;
        let verdict = competency::evaluate(&CompetencyInputs {
            attacker,
            defender,
            attack: &declaration.outcome,
            defense: &defense,
            attacker_rank,
            defender_armor_key: armor.map(|category| category.key()),
        });

        let repo = ProgressionRepo::new(self.store.as_ref());
        for award in &verdict.awards {
            let entry = repo.apply(award).await?;
            let name = if award.actor == attacker {
                &attacker_name
            } else {
                &defender_name
            };
            self.messages
                .post(
                    &format!(
                        "{} banks progress in {} ({}): rank {}, {} toward the next",
                        name,
                        award.key,
                        award.track.key(),
                        entry.rank,
                        entry.progress
                    ),
                    Audience::GmOnly,
                )
                .await;
        }

        if !verdict.proceed_to_damage {
            self.messages
                .post(
                    &format!(
                        "{} fails to get through {}'s defense.",
                        attacker_name, defender_name
                    ),
                    Audience::Everyone,
                )
                .await;
            return Ok(ResolutionRecord {
                attacker,
                defender,
                attack_total: declaration.outcome.total,
                defense_total: Some(defense.total),
                outcome: ResolutionOutcome::NoEffect,
                awards: verdict.awards,
                resolution: None,
                wound: None,
            });
        }

        // Stage 3: impact against block at the struck location
        let location = declaration
            .location
            .unwrap_or_else(|| HitLocation::draw(&mut self.rng));

        let impact = match self.resolve_impact(attacker, &declaration).await {
            Ok(impact) => impact,
            Err(DuskError::UserCancelled) => {
                tracing::debug!("Resolution aborted at the impact stage");
                return Ok(aborted(verdict.awards, Some(defense.total)));
            }
            Err(err) => return Err(err),
        };
        let block = match self.resolve_block(defender, location).await {
            Ok(block) => block,
            Err(DuskError::UserCancelled) => {
                tracing::debug!("Resolution aborted at the block stage");
                return Ok(aborted(verdict.awards, Some(defense.total)));
            }
            Err(err) => return Err(err),
        };
        let resolution = ImpactBlockResolution { impact, block };
        tracing::info!(
            "Impact {} vs block {} at {} -> net {}",
            impact,
            block,
            location,
            resolution.net_damage()
        );

        if resolution.net_damage() <= 0 {
            self.messages
                .post(
                    &format!(
                        "{}'s blow lands on {} but the protection turns it aside.",
                        attacker_name, defender_name
                    ),
                    Audience::Everyone,
                )
                .await;
            return Ok(ResolutionRecord {
                attacker,
                defender,
                attack_total: declaration.outcome.total,
                defense_total: Some(defense.total),
                outcome: ResolutionOutcome::NoDamage,
                awards: verdict.awards,
                resolution: Some(resolution),
                wound: None,
            });
        }

        // Stage 4: apply the wound
        let report = apply_wound(
            self.store.as_ref(),
            self.wounds.as_deref(),
            defender,
            location,
            resolution.net_damage(),
        )
        .await?;
        self.messages
            .post(
                &format!(
                    "{} takes {} to the {} from {}.",
                    defender_name,
                    report.amount,
                    location,
                    attacker_name
                ),
                Audience::Everyone,
            )
            .await;

        Ok(ResolutionRecord {
            attacker,
            defender,
            attack_total: declaration.outcome.total,
            defense_total: Some(defense.total),
            outcome: ResolutionOutcome::Wounded,
            awards: verdict.awards,
            resolution: Some(resolution),
            wound: Some(report),
        })
    }

    async fn acquire_defense(
        &self,
        world: &WorldContext,
        defender: ActorId,
        declaration: &AttackDeclaration,
    ) -> Result<CombatRollOutcome> {
        let request = DefenseRequest {
            world,
            store: self.store.as_ref(),
            defender,
            attack: &declaration.outcome,
        };
        for source in &self.config.defense_sources {
            match source.provide(&request).await {
                Ok(Some(outcome)) => {
                    tracing::debug!(
                        "Defense source '{}' answered with {}",
                        source.name(),
                        outcome.total
                    );
                    return Ok(outcome);
                }
                Ok(None) => tracing::debug!("Defense source '{}' passed", source.name()),
                Err(DuskError::UserCancelled) => return Err(DuskError::UserCancelled),
                Err(err) => {
                    tracing::warn!("Defense source '{}' failed: {}", source.name(), err)
                }
            }
        }
        tracing::warn!("Defense chain exhausted, using the neutral default");
        Ok(neutral_defense())
    }

    async fn resolve_impact(
        &self,
        attacker: ActorId,
        declaration: &AttackDeclaration,
    ) -> Result<i32> {
        let request = ImpactRequest {
            store: self.store.as_ref(),
            attacker,
            weapon_key: &declaration.outcome.meta.key,
            precomputed: declaration.precomputed_impact,
            damage_formula: declaration.damage_formula.as_deref(),
            weapon_item: declaration.weapon_item,
        };
        for source in &self.config.impact_sources {
            match source.provide(&request).await {
                Ok(Some(impact)) => {
                    tracing::debug!("Impact source '{}' answered with {}", source.name(), impact);
                    return Ok(impact);
                }
                Ok(None) => tracing::debug!("Impact source '{}' passed", source.name()),
                Err(DuskError::UserCancelled) => return Err(DuskError::UserCancelled),
                Err(err) => tracing::warn!("Impact source '{}' failed: {}", source.name(), err),
            }
        }
        tracing::warn!("Impact chain exhausted, using the flat fallback");
        Ok(IMPACT_FALLBACK_BASE)
    }

    async fn resolve_block(&self, defender: ActorId, location: HitLocation) -> Result<i32> {
        let request = BlockRequest {
            store: self.store.as_ref(),
            defender,
            location,
        };
        for source in &self.config.block_sources {
            match source.provide(&request).await {
                Ok(Some(block)) => {
                    tracing::debug!("Block source '{}' answered with {}", source.name(), block);
                    return Ok(block);
                }
                Ok(None) => tracing::debug!("Block source '{}' passed", source.name()),
                Err(DuskError::UserCancelled) => return Err(DuskError::UserCancelled),
                Err(err) => tracing::warn!("Block source '{}' failed: {}", source.name(), err),
            }
        }
        tracing::warn!("Block chain exhausted, assuming no protection");
        Ok(0)
    }
}
