pub mod error;
pub mod types;

pub use error::{DuskError, Result};
pub use types::{ActorId, ItemId, SceneId, TokenId};
