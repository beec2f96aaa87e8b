//! Scenes, tokens, and the world context threaded through resolution

pub mod context;
pub mod scene;

pub use context::{ActorProfile, SizeCategory, WorldContext};
pub use scene::{Scene, SilhouetteBounds, Token};
