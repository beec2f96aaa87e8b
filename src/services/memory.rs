//! In-memory collaborator implementations for tests and headless runs
//!
//! These make the crate self-contained: a seeded dice engine, a wall-map
//! occlusion service, a JSON document store, scripted prompts, and a
//! recording message sink. Hosts replace them with real engines.

use std::collections::VecDeque;
use std::sync::{Mutex, RwLock};

use ahash::AHashMap;
use async_trait::async_trait;
use geo::{coord, Intersects, Line};
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::combat::wound::HitLocation;
use crate::core::types::ActorId;

use super::ports::{
    ActorStore, Audience, DamageEstimator, DiceError, DiceService, EstimatorError, MessageSink,
    OcclusionError, OcclusionService, PromptAnswer, PromptService, StoreError, WoundService,
    WoundServiceError,
};

#[derive(Debug, Clone, Copy)]
struct ParsedFormula {
    count: u32,
    sides: u32,
    modifier: i64,
}

/// Parse `NdS±K` formulas, bare `dS`, and plain constants
fn parse_formula(formula: &str) -> Result<ParsedFormula, DiceError> {
    let invalid = |reason: &str| DiceError::InvalidFormula {
        formula: formula.to_string(),
        reason: reason.to_string(),
    };

    let text: String = formula
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if text.is_empty() {
        return Err(invalid("empty formula"));
    }

    let Some(d_pos) = text.find('d') else {
        let modifier = text.parse::<i64>().map_err(|_| invalid("not a number"))?;
        return Ok(ParsedFormula { count: 0, sides: 0, modifier });
    };

    let count = if d_pos == 0 {
        1
    } else {
        text[..d_pos]
            .parse::<u32>()
            .map_err(|_| invalid("bad die count"))?
    };

    let rest = &text[d_pos + 1..];
    let (sides_text, modifier) = match rest.find(|c| c == '+' || c == '-') {
        Some(pos) => {
            let modifier = rest[pos..]
                .parse::<i64>()
                .map_err(|_| invalid("bad modifier"))?;
            (&rest[..pos], modifier)
        }
        None => (rest, 0),
    };

    let sides = sides_text
        .parse::<u32>()
        .map_err(|_| invalid("bad die size"))?;
    if sides == 0 {
        return Err(invalid("zero-sided die"));
    }
    Ok(ParsedFormula { count, sides, modifier })
}

/// Deterministic dice engine over a seeded stream
pub struct SeededDice {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl DiceService for SeededDice {
    async fn roll(&self, formula: &str) -> Result<i64, DiceError> {
        let parsed = parse_formula(formula)?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| DiceError::Unavailable("dice rng lock poisoned".to_string()))?;
        let mut total = parsed.modifier;
        for _ in 0..parsed.count {
            total += rng.gen_range(1..=parsed.sides) as i64;
        }
        Ok(total)
    }
}

/// Dice engine answering from a fixed script, for tests
pub struct ScriptedDice {
    totals: Mutex<VecDeque<i64>>,
}

impl ScriptedDice {
    pub fn new(totals: impl IntoIterator<Item = i64>) -> Self {
        Self {
            totals: Mutex::new(totals.into_iter().collect()),
        }
    }
}

#[async_trait]
impl DiceService for ScriptedDice {
    async fn roll(&self, _formula: &str) -> Result<i64, DiceError> {
        self.totals
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(|| DiceError::Unavailable("dice script exhausted".to_string()))
    }
}

/// Occlusion service backed by a list of wall segments
#[derive(Debug, Clone, Default)]
pub struct WallMapOcclusion {
    walls: Vec<Line<f64>>,
}

impl WallMapOcclusion {
    pub fn new() -> Self {
        Self { walls: Vec::new() }
    }

    pub fn add_wall(&mut self, from: DVec2, to: DVec2) {
        self.walls.push(Line::new(
            coord! { x: from.x, y: from.y },
            coord! { x: to.x, y: to.y },
        ));
    }
}

impl OcclusionService for WallMapOcclusion {
    fn sight_blocked(&self, from: DVec2, to: DVec2) -> Result<bool, OcclusionError> {
        let ray = Line::new(
            coord! { x: from.x, y: from.y },
            coord! { x: to.x, y: to.y },
        );
        Ok(self.walls.iter().any(|wall| wall.intersects(&ray)))
    }
}

/// JSON document store keyed by actor id
///
/// Writes follow last-write-wins, matching the contract callers must
/// already assume of real backends.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sheets: RwLock<AHashMap<ActorId, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sheets: RwLock::new(AHashMap::new()),
        }
    }

    /// Seed a whole sheet, replacing any existing one
    pub fn insert(&self, actor: ActorId, sheet: Value) {
        if let Ok(mut sheets) = self.sheets.write() {
            sheets.insert(actor, sheet);
        }
    }
}

fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn write_path(root: &mut Value, path: &str, value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| StoreError::BadPath(path.to_string()))?;

    let mut current = root;
    for segment in parents {
        let obj = current
            .as_object_mut()
            .ok_or_else(|| StoreError::BadPath(path.to_string()))?;
        current = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    let obj = current
        .as_object_mut()
        .ok_or_else(|| StoreError::BadPath(path.to_string()))?;
    obj.insert(last.to_string(), value);
    Ok(())
}

#[async_trait]
impl ActorStore for InMemoryStore {
    async fn load(&self, actor: ActorId) -> Result<Value, StoreError> {
        let sheets = self.sheets.read().map_err(|_| StoreError::LockPoisoned)?;
        sheets
            .get(&actor)
            .cloned()
            .ok_or(StoreError::MissingActor(actor))
    }

    async fn read_field(&self, actor: ActorId, path: &str) -> Result<Option<Value>, StoreError> {
        let sheets = self.sheets.read().map_err(|_| StoreError::LockPoisoned)?;
        let sheet = sheets.get(&actor).ok_or(StoreError::MissingActor(actor))?;
        Ok(lookup_path(sheet, path).cloned())
    }

    async fn write_fields(
        &self,
        actor: ActorId,
        fields: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        let mut sheets = self.sheets.write().map_err(|_| StoreError::LockPoisoned)?;
        let sheet = sheets.get_mut(&actor).ok_or(StoreError::MissingActor(actor))?;
        for (path, value) in fields {
            write_path(sheet, &path, value)?;
        }
        Ok(())
    }
}

/// Prompt service answering from fixed scripts, for tests
///
/// Exhausted scripts answer as a dismissed dialog.
#[derive(Debug, Default)]
pub struct ScriptedPrompts {
    confirms: Mutex<VecDeque<Option<bool>>>,
    totals: Mutex<VecDeque<PromptAnswer<i64>>>,
}

impl ScriptedPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_confirm(self, answer: Option<bool>) -> Self {
        if let Ok(mut queue) = self.confirms.lock() {
            queue.push_back(answer);
        }
        self
    }

    pub fn push_total(self, answer: PromptAnswer<i64>) -> Self {
        if let Ok(mut queue) = self.totals.lock() {
            queue.push_back(answer);
        }
        self
    }
}

#[async_trait]
impl PromptService for ScriptedPrompts {
    async fn confirm(&self, _title: &str, _body: &str) -> Option<bool> {
        self.confirms
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .flatten()
    }

    async fn request_total(&self, _title: &str, _label: &str) -> PromptAnswer<i64> {
        self.totals
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or(PromptAnswer::Dismissed)
    }
}

/// Message sink that records everything posted
#[derive(Debug, Default)]
pub struct RecordingSink {
    posts: Mutex<Vec<(String, Audience)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<(String, Audience)> {
        self.posts
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn post(&self, content: &str, audience: Audience) {
        if let Ok(mut posts) = self.posts.lock() {
            posts.push((content.to_string(), audience));
        }
    }
}

/// Estimator returning fixed answers, `None` meaning unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedEstimator {
    pub impact: Option<i32>,
    pub block: Option<i32>,
}

impl FixedEstimator {
    pub fn new(impact: i32, block: i32) -> Self {
        Self {
            impact: Some(impact),
            block: Some(block),
        }
    }
}

#[async_trait]
impl DamageEstimator for FixedEstimator {
    async fn estimate_impact(
        &self,
        _attacker: ActorId,
        _weapon_key: &str,
    ) -> Result<i32, EstimatorError> {
        self.impact.ok_or(EstimatorError::Unavailable)
    }

    async fn estimate_block(
        &self,
        _defender: ActorId,
        _location: HitLocation,
    ) -> Result<i32, EstimatorError> {
        self.block.ok_or(EstimatorError::Unavailable)
    }
}

/// Wound subsystem double that records applications
#[derive(Debug, Default)]
pub struct RecordingWounds {
    applied: Mutex<Vec<(ActorId, HitLocation, i32)>>,
    unavailable: bool,
}

impl RecordingWounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// A wound subsystem that always declines
    pub fn offline() -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            unavailable: true,
        }
    }

    pub fn applied(&self) -> Vec<(ActorId, HitLocation, i32)> {
        self.applied
            .lock()
            .map(|applied| applied.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WoundService for RecordingWounds {
    async fn apply(
        &self,
        defender: ActorId,
        location: HitLocation,
        amount: i32,
    ) -> Result<(), WoundServiceError> {
        if self.unavailable {
            return Err(WoundServiceError::Unavailable);
        }
        let mut applied = self
            .applied
            .lock()
            .map_err(|_| WoundServiceError::Failed("lock poisoned".to_string()))?;
        applied.push((defender, location, amount));
        Ok(())
    }
}
