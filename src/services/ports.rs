//! Port traits for the collaborators resolution depends on
//!
//! These are the only seams in the crate. Dice evaluation, persistence,
//! operator dialogs, chat output, damage estimation, and the wound
//! subsystem all live behind them, so a host application can wire in its
//! own engines and tests can script every answer.

use async_trait::async_trait;
use glam::DVec2;
use serde_json::Value;

use crate::combat::wound::HitLocation;
use crate::core::types::ActorId;

#[derive(Debug, thiserror::Error)]
pub enum DiceError {
    #[error("Invalid dice formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },
    #[error("Dice engine unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OcclusionError {
    #[error("Occlusion query failed: {0}")]
    QueryFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Actor not found in store: {0}")]
    MissingActor(ActorId),
    #[error("Field path '{0}' does not address an object")]
    BadPath(String),
    #[error("Store lock poisoned")]
    LockPoisoned,
    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("Estimator unavailable")]
    Unavailable,
    #[error("Estimate failed: {0}")]
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WoundServiceError {
    #[error("Wound subsystem unavailable")]
    Unavailable,
    #[error("Wound application failed: {0}")]
    Failed(String),
}

/// Evaluates dice formulas like `2d6+3`
#[async_trait]
pub trait DiceService: Send + Sync {
    async fn roll(&self, formula: &str) -> Result<i64, DiceError>;
}

/// Answers whether sight is blocked between two scene-pixel points
///
/// Queries stay synchronous; wall lookups are cheap geometry.
pub trait OcclusionService: Send + Sync {
    fn sight_blocked(&self, from: DVec2, to: DVec2) -> Result<bool, OcclusionError>;
}

/// Document store holding actor sheets as JSON
///
/// Access is read-modify-write over whole values at dotted key paths.
/// Writes are not transactional: concurrent writers to the same actor
/// follow last-write-wins. Callers needing stricter guarantees must
/// serialize their own access per actor.
#[async_trait]
pub trait ActorStore: Send + Sync {
    /// Read an actor's whole sheet
    async fn load(&self, actor: ActorId) -> Result<Value, StoreError>;

    /// Read one field by dotted path, `Ok(None)` when absent
    async fn read_field(&self, actor: ActorId, path: &str) -> Result<Option<Value>, StoreError>;

    /// Write fields by dotted path, creating intermediate objects
    async fn write_fields(
        &self,
        actor: ActorId,
        fields: Vec<(String, Value)>,
    ) -> Result<(), StoreError>;
}

/// Outcome of prompting the operator for a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer<T> {
    Entered(T),
    Blank,
    Dismissed,
}

/// Operator-facing dialogs
#[async_trait]
pub trait PromptService: Send + Sync {
    /// Yes/no dialog, `None` when dismissed without answering
    async fn confirm(&self, title: &str, body: &str) -> Option<bool>;

    /// Single numeric entry field
    async fn request_total(&self, title: &str, label: &str) -> PromptAnswer<i64>;
}

/// Who a posted message is visible to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    GmOnly,
}

/// Chat/log output, fire-and-forget
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn post(&self, content: &str, audience: Audience);
}

/// Optional external damage model consulted before flat fallbacks
#[async_trait]
pub trait DamageEstimator: Send + Sync {
    async fn estimate_impact(
        &self,
        attacker: ActorId,
        weapon_key: &str,
    ) -> Result<i32, EstimatorError>;

    async fn estimate_block(
        &self,
        defender: ActorId,
        location: HitLocation,
    ) -> Result<i32, EstimatorError>;
}

/// Optional external wound subsystem, first stop when applying damage
#[async_trait]
pub trait WoundService: Send + Sync {
    async fn apply(
        &self,
        defender: ActorId,
        location: HitLocation,
        amount: i32,
    ) -> Result<(), WoundServiceError>;
}
