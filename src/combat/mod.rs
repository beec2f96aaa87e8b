pub mod competency;
pub mod constants;
pub mod defense;
pub mod flow;
pub mod mitigation;
pub mod outcome;
pub mod reach;
pub mod validator;
pub mod wound;

pub use competency::{CompetencyInputs, CompetencyResult};
pub use flow::{AttackDeclaration, DefenseFlow, FlowConfig, ResolutionOutcome, ResolutionRecord};
pub use mitigation::{ArmorCategory, ImpactBlockResolution};
pub use outcome::{CombatRollOutcome, RollMeta, RollPolicy};
pub use reach::{ReachKind, ReachProfile};
pub use validator::{validate_action, validate_attack};
pub use wound::{HitLocation, WoundModel, WoundReport};
