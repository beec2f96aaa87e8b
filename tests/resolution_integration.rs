//! Defense flow integration tests
//!
//! Full resolutions through `DefenseFlow::resolve` with in-memory
//! doubles for every port: persisted awards, mitigation outcomes,
//! operator aborts, and the wound fallback ladder.

use std::sync::Arc;

use duskmantle::combat::{
    AttackDeclaration, CombatRollOutcome, DefenseFlow, FlowConfig, HitLocation, ResolutionOutcome,
    RollMeta, RollPolicy, WoundModel,
};
use duskmantle::core::{ActorId, TokenId};
use duskmantle::environment::{Darkness, EnvironmentDefaults};
use duskmantle::grid::GridScale;
use duskmantle::perception::{
    Concealment, CoverLevel, CoverModifier, PerceptionPackage, VisibilityLevel,
    STANDARD_DETAIL_RANGE_M,
};
use duskmantle::services::{
    Audience, FixedEstimator, InMemoryStore, PromptAnswer, RecordingSink, RecordingWounds,
    ScriptedDice, ScriptedPrompts,
};
use duskmantle::world::{ActorProfile, Scene, SizeCategory, Token, WorldContext};
use glam::DVec2;
use serde_json::json;

struct Duel {
    world: WorldContext,
    attacker_token: TokenId,
    target_token: TokenId,
    attacker: ActorId,
    defender: ActorId,
}

fn duel() -> Duel {
    let mut scene = Scene::new("training ground", GridScale::default());
    let attacker = ActorId::new();
    let defender = ActorId::new();
    let attacker_token = scene.place(Token::new("Bren", DVec2::new(0.0, 0.0)).with_actor(attacker));
    let target_token = scene.place(Token::new("Kesh", DVec2::new(500.0, 0.0)).with_actor(defender));
    let mut world = WorldContext::new(scene, EnvironmentDefaults::default());
    world.register_actor(attacker, ActorProfile::new("Bren", SizeCategory::Medium));
    world.register_actor(defender, ActorProfile::new("Kesh", SizeCategory::Medium));
    Duel {
        world,
        attacker_token,
        target_token,
        attacker,
        defender,
    }
}

fn open_field() -> PerceptionPackage {
    PerceptionPackage {
        distance_m: 5.0,
        cells: 5,
        visibility: VisibilityLevel::DetailsOk,
        detail_range_m: STANDARD_DETAIL_RANGE_M,
        cover: CoverLevel::None,
        concealment: Concealment::None,
        perception_dc_adjust: None,
        cover_attack_modifier: CoverModifier::Flat(0),
        darkness: Darkness::None,
    }
}

async fn field_i64(store: &InMemoryStore, actor: ActorId, path: &str) -> Option<i64> {
    use duskmantle::services::ActorStore;
    store
        .read_field(actor, path)
        .await
        .ok()
        .flatten()
        .and_then(|v| v.as_i64())
}

#[tokio::test]
async fn test_learning_duel_persists_awards_and_wounds() {
    let duel = duel();
    let store = Arc::new(InMemoryStore::new());
    store.insert(
        duel.attacker,
        json!({
            "progression": {"weapons": {"sword": {"level": 2, "rank": 2, "progress": 8}}}
        }),
    );
    store.insert(
        duel.defender,
        json!({
            "combat": {
                "defense_formula": "1d20+1",
                "policy": "learning",
                "armor": {"category": "light"}
            },
            "health": {"value": 20, "zones": {"chest": {"value": 10}}}
        }),
    );

    // Defense pair, then the impact formula
    let dice = Arc::new(ScriptedDice::new(vec![9, 7, 5]));
    let prompts = Arc::new(ScriptedPrompts::new());
    let sink = Arc::new(RecordingSink::new());
    let config = FlowConfig::standard(dice, prompts, None);
    let mut flow = DefenseFlow::new(config, store.clone(), sink.clone(), 11);

    // Learning attack: pair (16, 12) keeps the worse 12, spread 4
    let outcome = CombatRollOutcome::from_pair(
        16,
        12,
        RollPolicy::Learning,
        RollMeta::weapon("sword"),
    );
    let declaration = AttackDeclaration::new(
        duel.attacker_token,
        duel.target_token,
        outcome,
        open_field(),
    )
    .with_damage_formula("1d8")
    .with_location(HitLocation::Chest);

    let record = flow.resolve(&duel.world, declaration).await.unwrap();

    // Attack 12 beats the kept-worse defense 7
    assert_eq!(record.attack_total, 12);
    assert_eq!(record.defense_total, Some(7));
    assert_eq!(record.outcome, ResolutionOutcome::Wounded);

    // Spread 4 clears rank 2, and the armored learning defender banks too
    assert_eq!(record.awards.len(), 2);
    assert_eq!(
        field_i64(&store, duel.attacker, "progression.weapons.sword.progress").await,
        Some(9)
    );
    assert_eq!(
        field_i64(&store, duel.attacker, "progression.weapons.sword.rank").await,
        Some(2)
    );
    assert_eq!(
        field_i64(&store, duel.defender, "progression.armor.light.progress").await,
        Some(1)
    );

    // Impact 5 against light armor's base 2, straight into the chest pool
    let resolution = record.resolution.unwrap();
    assert_eq!(resolution.impact, 5);
    assert_eq!(resolution.block, 2);
    let wound = record.wound.unwrap();
    assert_eq!(wound.model, WoundModel::ZonePool);
    assert_eq!(wound.remaining, Some(7));
    assert_eq!(
        field_i64(&store, duel.defender, "health.zones.chest.value").await,
        Some(7)
    );
    assert_eq!(
        field_i64(&store, duel.defender, "health.value").await,
        Some(20)
    );

    let posts = sink.posts();
    let gm_posts = posts
        .iter()
        .filter(|(_, audience)| *audience == Audience::GmOnly)
        .count();
    assert_eq!(gm_posts, 2);
    assert!(posts
        .iter()
        .any(|(text, _)| text.contains("Kesh takes 3 to the chest from Bren")));
}

#[tokio::test]
async fn test_precomputed_mitigation_turns_the_blow_aside() {
    let duel = duel();
    let store = Arc::new(InMemoryStore::new());
    store.insert(duel.attacker, json!({}));
    store.insert(
        duel.defender,
        json!({
            "combat": {"mitigation": {"chest": 12}},
            "health": {"value": 18}
        }),
    );

    // No defense formula: the flat check rolls once
    let dice = Arc::new(ScriptedDice::new(vec![3]));
    let prompts = Arc::new(ScriptedPrompts::new());
    let sink = Arc::new(RecordingSink::new());
    let config = FlowConfig::standard(dice, prompts, None);
    let mut flow = DefenseFlow::new(config, store.clone(), sink.clone(), 11);

    let outcome = CombatRollOutcome::new(15, RollPolicy::Execution, RollMeta::weapon("maul"));
    let declaration = AttackDeclaration::new(
        duel.attacker_token,
        duel.target_token,
        outcome,
        open_field(),
    )
    .with_precomputed_impact(9)
    .with_location(HitLocation::Chest);

    let record = flow.resolve(&duel.world, declaration).await.unwrap();

    assert_eq!(record.outcome, ResolutionOutcome::NoDamage);
    assert!(record.awards.is_empty());
    let resolution = record.resolution.unwrap();
    assert_eq!(resolution.impact, 9);
    assert_eq!(resolution.block, 12);
    assert_eq!(resolution.net_damage(), 0);
    assert!(record.wound.is_none());
    assert_eq!(
        field_i64(&store, duel.defender, "health.value").await,
        Some(18)
    );
    assert!(sink
        .posts()
        .iter()
        .any(|(text, _)| text.contains("turns it aside")));
}

#[tokio::test]
async fn test_operator_dismissal_aborts_without_touching_the_sheet() {
    let duel = duel();
    let store = Arc::new(InMemoryStore::new());
    store.insert(duel.attacker, json!({}));
    store.insert(duel.defender, json!({"health": {"value": 14}}));

    // No formula, an empty dice script, and a dismissed dialog: every
    // defense source falls through and the operator never answers
    let dice = Arc::new(ScriptedDice::new(Vec::new()));
    let prompts = Arc::new(ScriptedPrompts::new());
    let sink = Arc::new(RecordingSink::new());
    let config = FlowConfig::standard(dice, prompts, None);
    let mut flow = DefenseFlow::new(config, store.clone(), sink.clone(), 11);

    let outcome = CombatRollOutcome::new(13, RollPolicy::Execution, RollMeta::weapon("spear"));
    let declaration = AttackDeclaration::new(
        duel.attacker_token,
        duel.target_token,
        outcome,
        open_field(),
    );

    let record = flow.resolve(&duel.world, declaration).await.unwrap();

    assert_eq!(record.outcome, ResolutionOutcome::Aborted);
    assert_eq!(record.defense_total, None);
    assert!(record.awards.is_empty());
    assert!(record.resolution.is_none());
    assert!(record.wound.is_none());
    assert!(sink.posts().is_empty());
    assert_eq!(
        field_i64(&store, duel.defender, "health.value").await,
        Some(14)
    );
}

#[tokio::test]
async fn test_manual_defense_entry_then_record_only_wound() {
    let duel = duel();
    let store = Arc::new(InMemoryStore::new());
    store.insert(duel.attacker, json!({}));
    // A completely blank defender sheet: no formula, no armor, no pools
    store.insert(duel.defender, json!({}));

    let dice = Arc::new(ScriptedDice::new(Vec::new()));
    let prompts = Arc::new(
        ScriptedPrompts::new()
            .push_confirm(Some(true))
            .push_total(PromptAnswer::Entered(8)),
    );
    let sink = Arc::new(RecordingSink::new());
    let config = FlowConfig::standard(dice, prompts, None);
    let mut flow = DefenseFlow::new(config, store.clone(), sink.clone(), 11);

    let outcome = CombatRollOutcome::new(10, RollPolicy::Execution, RollMeta::weapon("club"));
    let declaration = AttackDeclaration::new(
        duel.attacker_token,
        duel.target_token,
        outcome,
        open_field(),
    )
    .with_location(HitLocation::Legs);

    let record = flow.resolve(&duel.world, declaration).await.unwrap();

    // Operator entered 8; attack 10 carries the tie-free win
    assert_eq!(record.defense_total, Some(8));
    assert_eq!(record.outcome, ResolutionOutcome::Wounded);

    // Impact falls through to the constant 4, block to the bare 0
    let resolution = record.resolution.unwrap();
    assert_eq!(resolution.impact, 4);
    assert_eq!(resolution.block, 0);

    // Nowhere to subtract from: the wound is recorded and nothing else
    let wound = record.wound.unwrap();
    assert_eq!(wound.model, WoundModel::RecordOnly);
    assert_eq!(wound.remaining, None);
    assert_eq!(field_i64(&store, duel.defender, "health.value").await, None);
}

#[tokio::test]
async fn test_missing_zone_falls_back_to_aggregate_pool() {
    let duel = duel();
    let store = Arc::new(InMemoryStore::new());
    store.insert(duel.attacker, json!({}));
    store.insert(
        duel.defender,
        json!({
            "combat": {"defense_formula": "1d20"},
            "health": {"value": 9}
        }),
    );

    // Defense pair (5, 2) kept at 5, then the 2d6 impact
    let dice = Arc::new(ScriptedDice::new(vec![5, 2, 6]));
    let prompts = Arc::new(ScriptedPrompts::new());
    let sink = Arc::new(RecordingSink::new());
    let config = FlowConfig::standard(dice, prompts, None);
    let mut flow = DefenseFlow::new(config, store.clone(), sink.clone(), 11);

    let outcome = CombatRollOutcome::new(14, RollPolicy::Execution, RollMeta::weapon("axe"));
    let declaration = AttackDeclaration::new(
        duel.attacker_token,
        duel.target_token,
        outcome,
        open_field(),
    )
    .with_damage_formula("2d6")
    .with_location(HitLocation::Head);

    let record = flow.resolve(&duel.world, declaration).await.unwrap();

    assert_eq!(record.outcome, ResolutionOutcome::Wounded);
    let wound = record.wound.unwrap();
    assert_eq!(wound.model, WoundModel::AggregatePool);
    assert_eq!(wound.remaining, Some(3));
    assert_eq!(
        field_i64(&store, duel.defender, "health.value").await,
        Some(3)
    );
}

#[tokio::test]
async fn test_wound_subsystem_takes_the_hit_before_the_pools() {
    let duel = duel();
    let store = Arc::new(InMemoryStore::new());
    store.insert(duel.attacker, json!({}));
    store.insert(
        duel.defender,
        json!({
            "combat": {"defense_formula": "1d20"},
            "health": {"value": 16, "zones": {"arms": {"value": 8}}}
        }),
    );

    let dice = Arc::new(ScriptedDice::new(vec![4, 4, 7]));
    let prompts = Arc::new(ScriptedPrompts::new());
    let sink = Arc::new(RecordingSink::new());
    let wounds = Arc::new(RecordingWounds::new());
    let config = FlowConfig::standard(dice, prompts, None);
    let mut flow = DefenseFlow::new(config, store.clone(), sink.clone(), 11)
        .with_wound_service(wounds.clone());

    let outcome = CombatRollOutcome::new(12, RollPolicy::Execution, RollMeta::weapon("saber"));
    let declaration = AttackDeclaration::new(
        duel.attacker_token,
        duel.target_token,
        outcome,
        open_field(),
    )
    .with_damage_formula("1d10")
    .with_location(HitLocation::Arms);

    let record = flow.resolve(&duel.world, declaration).await.unwrap();

    let wound = record.wound.unwrap();
    assert_eq!(wound.model, WoundModel::Subsystem);
    assert_eq!(wounds.applied(), vec![(duel.defender, HitLocation::Arms, 7)]);

    // The pools never hear about it
    assert_eq!(
        field_i64(&store, duel.defender, "health.zones.arms.value").await,
        Some(8)
    );
    assert_eq!(
        field_i64(&store, duel.defender, "health.value").await,
        Some(16)
    );
}

#[tokio::test]
async fn test_estimator_answers_when_sheet_and_formula_are_silent() {
    let duel = duel();
    let store = Arc::new(InMemoryStore::new());
    store.insert(duel.attacker, json!({}));
    store.insert(
        duel.defender,
        json!({
            "combat": {"defense_formula": "1d20"},
            "health": {"value": 20}
        }),
    );

    // No damage formula and no armor: both chains reach the estimator
    let dice = Arc::new(ScriptedDice::new(vec![6, 3]));
    let prompts = Arc::new(ScriptedPrompts::new());
    let sink = Arc::new(RecordingSink::new());
    let estimator = Arc::new(FixedEstimator::new(11, 3));
    let config = FlowConfig::standard(dice, prompts, Some(estimator));
    let mut flow = DefenseFlow::new(config, store.clone(), sink.clone(), 11);

    let outcome = CombatRollOutcome::new(16, RollPolicy::Execution, RollMeta::weapon("flail"));
    let declaration = AttackDeclaration::new(
        duel.attacker_token,
        duel.target_token,
        outcome,
        open_field(),
    )
    .with_location(HitLocation::Chest);

    let record = flow.resolve(&duel.world, declaration).await.unwrap();

    let resolution = record.resolution.unwrap();
    assert_eq!(resolution.impact, 11);
    assert_eq!(resolution.block, 3);
    assert_eq!(record.outcome, ResolutionOutcome::Wounded);
    assert_eq!(
        field_i64(&store, duel.defender, "health.value").await,
        Some(12)
    );
}
