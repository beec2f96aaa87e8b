use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuskError {
    #[error("Actor not found: {0}")]
    ActorNotFound(crate::core::types::ActorId),

    #[error("Token not found: {0}")]
    TokenNotFound(crate::core::types::TokenId),

    #[error("Token {0} has no linked actor")]
    TokenWithoutActor(crate::core::types::TokenId),

    #[error("Target cannot be engaged: total cover")]
    Unreachable,

    #[error("Attacker has no line of sight to the target")]
    NoVision,

    #[error("Target is beyond reach: {distance_m:.1}m > {reach_m:.1}m")]
    OutOfRange { distance_m: f64, reach_m: f64 },

    #[error("Resolution cancelled by the operator")]
    UserCancelled,

    #[error("Item not found in inventory: {0}")]
    MissingItem(crate::core::types::ItemId),

    #[error("Dice service error: {0}")]
    Dice(#[from] crate::services::DiceError),

    #[error("Store error: {0}")]
    Store(#[from] crate::services::StoreError),

    #[error("Estimator error: {0}")]
    Estimator(#[from] crate::services::EstimatorError),

    #[error("Wound subsystem error: {0}")]
    WoundSubsystem(#[from] crate::services::WoundServiceError),

    #[error("Invalid field value at {path}: {reason}")]
    InvalidField { path: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DuskError>;
