//! Headless Skirmish Runner
//!
//! Stages a two-fighter skirmish and drives it through validation and
//! the defense flow, printing per-round records. Deterministic for a
//! given seed.

use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Runtime;

use async_trait::async_trait;
use duskmantle::combat::{
    validate_attack, AttackDeclaration, CombatRollOutcome, DefenseFlow, FlowConfig, ReachProfile,
    ResolutionOutcome, RollMeta, RollPolicy,
};
use duskmantle::core::{ActorId, ItemId, TokenId};
use duskmantle::environment::{FogIntensity, RainIntensity, SceneEnvironment, Weather};
use duskmantle::grid::GridScale;
use duskmantle::progression::{InventoryRepo, ProgressionRepo, ProgressTrack};
use duskmantle::services::{
    ActorStore, Audience, DiceService, InMemoryStore, MessageSink, ScriptedPrompts, SeededDice,
    WallMapOcclusion,
};
use duskmantle::world::{ActorProfile, Scene, SizeCategory, Token, WorldContext};
use duskmantle::Result;
use glam::DVec2;
use serde_json::json;

/// Headless Skirmish Runner - staged attack resolutions for a seed
#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run a staged skirmish through the resolution pipeline")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of attack rounds to resolve
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Scene weather: clear, rain, fog
    #[arg(long, default_value = "clear")]
    weather: String,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishResult {
    rounds: Vec<RoundResult>,
    defender_health: Option<i64>,
    seed: u64,
}

#[derive(Serialize)]
struct RoundResult {
    round: u32,
    weapon: String,
    outcome: String,
    attack_total: i32,
    defense_total: Option<i32>,
    net_damage: Option<i32>,
    location: Option<String>,
}

/// Message sink printing straight to stdout
struct ConsoleSink;

#[async_trait]
impl MessageSink for ConsoleSink {
    async fn post(&self, content: &str, audience: Audience) {
        match audience {
            Audience::Everyone => println!("  [ALL] {}", content),
            Audience::GmOnly => println!("  [GM]  {}", content),
        }
    }
}

struct Fighters {
    attacker: ActorId,
    defender: ActorId,
    attacker_token: TokenId,
    target_token: TokenId,
    javelin: ItemId,
}

fn parse_weather(name: &str) -> Option<Weather> {
    match name {
        "clear" => None,
        "rain" => Some(Weather::Rain(RainIntensity::Heavy)),
        "fog" => Some(Weather::Fog(FogIntensity::Dense)),
        other => {
            eprintln!("Unknown weather '{}', using clear", other);
            None
        }
    }
}

fn build_world(weather: Option<Weather>) -> (WorldContext, Fighters) {
    // 100px cells, one meter each; fighters start three cells apart
    let mut scene = Scene::new("border crossing", GridScale::default());
    if let Some(weather) = weather {
        scene.environment = Some(SceneEnvironment {
            weather: Some(weather),
            ..Default::default()
        });
    }

    let attacker = ActorId::new();
    let defender = ActorId::new();
    let attacker_token = scene.place(
        Token::new("Bren", DVec2::new(0.0, 0.0))
            .with_actor(attacker)
            .with_silhouette(80.0, 80.0),
    );
    let target_token = scene.place(
        Token::new("Kesh", DVec2::new(300.0, 0.0))
            .with_actor(defender)
            .with_silhouette(80.0, 80.0),
    );

    let mut world = WorldContext::new(scene, Default::default());
    world.register_actor(attacker, ActorProfile::new("Bren", SizeCategory::Medium));
    world.register_actor(defender, ActorProfile::new("Kesh", SizeCategory::Medium));

    let fighters = Fighters {
        attacker,
        defender,
        attacker_token,
        target_token,
        javelin: ItemId::new(),
    };
    (world, fighters)
}

fn seed_sheets(store: &InMemoryStore, fighters: &Fighters) {
    store.insert(
        fighters.attacker,
        json!({
            "combat": {"policy": "learning", "damage_bonus": 1},
            "progression": {"weapons": {"sword": {"level": 1, "rank": 1, "progress": 4}}},
            "inventory": [
                {
                    "id": fighters.javelin.to_string(),
                    "name": "Javelin",
                    "damage_formula": "1d6+1",
                    "uses": 2
                }
            ]
        }),
    );
    store.insert(
        fighters.defender,
        json!({
            "combat": {
                "defense_formula": "1d20+2",
                "policy": "learning",
                "armor": {"category": "medium", "material_bonus": 1}
            },
            "health": {
                "value": 24,
                "zones": {"chest": {"value": 12}, "head": {"value": 6}}
            }
        }),
    );
}

/// Roll an attack the way a hosting application would: the formula
/// twice, kept per the attacker's declared policy
async fn roll_attack(
    dice: &SeededDice,
    store: &InMemoryStore,
    attacker: ActorId,
    weapon_key: &str,
) -> Result<CombatRollOutcome> {
    let policy = store
        .read_field(attacker, "combat.policy")
        .await?
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .map(RollPolicy::from_key)
        .unwrap_or_default();
    let level = ProgressionRepo::new(store)
        .entry(attacker, ProgressTrack::Weapons, weapon_key)
        .await?
        .level;
    let formula = format!("1d20+{}", level);
    let first = dice.roll(&formula).await? as i32;
    let second = dice.roll(&formula).await? as i32;
    Ok(CombatRollOutcome::from_pair(
        first,
        second,
        policy,
        RollMeta::weapon(weapon_key),
    ))
}

async fn run(args: Args, seed: u64) -> Result<SkirmishResult> {
    let (mut world, fighters) = build_world(parse_weather(&args.weather));

    let store = Arc::new(InMemoryStore::new());
    seed_sheets(&store, &fighters);
    let dice = Arc::new(SeededDice::new(seed));
    let prompts = Arc::new(ScriptedPrompts::new());
    let mut occlusion = WallMapOcclusion::new();
    // A ruined wall south of the fighters; it never crosses their line
    occlusion.add_wall(DVec2::new(0.0, 300.0), DVec2::new(600.0, 300.0));

    let config = FlowConfig::standard(dice.clone(), prompts, None);
    let mut flow = DefenseFlow::new(config, store.clone(), Arc::new(ConsoleSink), seed);

    let attacker_name = world.actor_profile(fighters.attacker)?.name.clone();
    let defender_name = world.actor_profile(fighters.defender)?.name.clone();
    println!("{} squares off against {}", attacker_name, defender_name);

    let javelin_reach = ReachProfile::thrown(15.0);
    let sword_reach = ReachProfile::melee(1.0);
    let mut rounds = Vec::new();

    for round in 1..=args.rounds {
        // Round one is thrown; afterwards Bren closes to sword range
        let (weapon_key, reach, item) = if round == 1 {
            ("javelin", &javelin_reach, Some(fighters.javelin))
        } else {
            ("sword", &sword_reach, None)
        };
        if round == 2 {
            if let Some(token) = world.scene.token_mut(fighters.attacker_token) {
                token.position = DVec2::new(200.0, 0.0);
            }
        }
        println!("--- Round {} ({}) ---", round, weapon_key);

        if let Some(item) = item {
            let remaining = InventoryRepo::new(store.as_ref())
                .spend_use(fighters.attacker, item)
                .await?;
            if let Some(remaining) = remaining {
                println!("  {} spends a javelin ({} left)", attacker_name, remaining);
            }
        }

        let package = match validate_attack(
            &world,
            &occlusion,
            fighters.attacker_token,
            fighters.target_token,
            reach,
        ) {
            Ok(package) => package,
            Err(err) => {
                println!("  Attack rejected: {}", err);
                rounds.push(RoundResult {
                    round,
                    weapon: weapon_key.to_string(),
                    outcome: format!("Rejected: {}", err),
                    attack_total: 0,
                    defense_total: None,
                    net_damage: None,
                    location: None,
                });
                continue;
            }
        };
        tracing::info!(
            "Round {}: {:.1}m, visibility {:?}, cover {:?}",
            round,
            package.distance_m,
            package.visibility,
            package.cover
        );

        let outcome = roll_attack(&dice, &store, fighters.attacker, weapon_key).await?;
        let mut declaration = AttackDeclaration::new(
            fighters.attacker_token,
            fighters.target_token,
            outcome,
            package,
        );
        if let Some(item) = item {
            declaration = declaration.with_weapon_item(item);
        }

        let record = flow.resolve(&world, declaration).await?;
        rounds.push(RoundResult {
            round,
            weapon: weapon_key.to_string(),
            outcome: format!("{:?}", record.outcome),
            attack_total: record.attack_total,
            defense_total: record.defense_total,
            net_damage: record.resolution.map(|r| r.net_damage()),
            location: record.wound.map(|w| w.location.to_string()),
        });
        if record.outcome == ResolutionOutcome::Aborted {
            println!("  Resolution aborted, ending the skirmish");
            break;
        }
    }

    // Final sheet state straight off the store
    let sheet = store.load(fighters.defender).await?;
    let defender_health = sheet
        .get("health")
        .and_then(|h| h.get("value"))
        .and_then(serde_json::Value::as_i64);

    Ok(SkirmishResult {
        rounds,
        defender_health,
        seed,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let format = args.format.clone();
    tracing::info!("Starting skirmish with seed {}", seed);

    let rt = Runtime::new()?;
    let result = rt.block_on(run(args, seed))?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!();
            println!("Skirmish Result");
            println!("===============");
            for round in &result.rounds {
                println!(
                    "Round {} [{}]: {} (attack {} vs defense {}, net {}, location {})",
                    round.round,
                    round.weapon,
                    round.outcome,
                    round.attack_total,
                    round
                        .defense_total
                        .map_or("-".to_string(), |t| t.to_string()),
                    round
                        .net_damage
                        .map_or("-".to_string(), |n| n.to_string()),
                    round.location.as_deref().unwrap_or("-"),
                );
            }
            match result.defender_health {
                Some(health) => println!("Defender's remaining health: {}", health),
                None => println!("Defender has no aggregate health pool"),
            }
            println!("Seed: {}", result.seed);
        }
    }
    Ok(())
}
