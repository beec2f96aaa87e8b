pub mod memory;
pub mod ports;

pub use memory::{
    FixedEstimator, InMemoryStore, RecordingSink, RecordingWounds, ScriptedDice, ScriptedPrompts,
    SeededDice, WallMapOcclusion,
};
pub use ports::{
    ActorStore, Audience, DamageEstimator, DiceError, DiceService, EstimatorError, MessageSink,
    OcclusionError, OcclusionService, PromptAnswer, PromptService, StoreError, WoundService,
    WoundServiceError,
};
