//! World context passed explicitly into every resolution entry point
//!
//! Nothing in the crate reads ambient host state. Callers assemble a
//! `WorldContext` and hand it to the validator or the defense flow.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{DuskError, Result};
use crate::core::types::{ActorId, TokenId};
use crate::environment::{EnvironmentDefaults, EnvironmentState, LightSource};
use crate::world::scene::{Scene, Token};

/// Creature size category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeCategory {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl SizeCategory {
    /// Extra melee reach in cells granted by sheer bulk
    pub fn reach_bonus_cells(&self) -> u32 {
        match self {
            Self::Tiny | Self::Small | Self::Medium => 0,
            Self::Large => 1,
            Self::Huge => 2,
            Self::Gargantuan => 3,
        }
    }
}

impl Default for SizeCategory {
    fn default() -> Self {
        Self::Medium
    }
}

/// The slice of an actor's sheet the spatial layer needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorProfile {
    pub name: String,
    pub size: SizeCategory,
    pub light: Option<LightSource>,
}

impl ActorProfile {
    pub fn new(name: impl Into<String>, size: SizeCategory) -> Self {
        Self { name: name.into(), size, light: None }
    }

    pub fn with_light(mut self, light: LightSource) -> Self {
        self.light = Some(light);
        self
    }
}

/// Everything a resolution needs to know about the world
#[derive(Debug, Clone)]
pub struct WorldContext {
    pub scene: Scene,
    pub defaults: EnvironmentDefaults,
    actors: AHashMap<ActorId, ActorProfile>,
}

impl WorldContext {
    pub fn new(scene: Scene, defaults: EnvironmentDefaults) -> Self {
        Self { scene, defaults, actors: AHashMap::new() }
    }

    pub fn register_actor(&mut self, id: ActorId, profile: ActorProfile) {
        self.actors.insert(id, profile);
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorProfile> {
        self.actors.get(&id)
    }

    /// Registered profile for an actor, an error when unknown
    pub fn actor_profile(&self, id: ActorId) -> Result<&ActorProfile> {
        self.actors.get(&id).ok_or(DuskError::ActorNotFound(id))
    }

    /// Resolved environment for the current scene
    pub fn environment(&self) -> EnvironmentState {
        self.defaults.resolve(self.scene.environment.as_ref())
    }

    pub fn token(&self, id: TokenId) -> Result<&Token> {
        self.scene.token(id).ok_or(DuskError::TokenNotFound(id))
    }

    /// The actor a token stands for, or an error if it has none
    pub fn token_actor(&self, id: TokenId) -> Result<ActorId> {
        self.token(id)?.actor.ok_or(DuskError::TokenWithoutActor(id))
    }

    /// Size of the actor behind a token, medium when unlinked
    pub fn token_size(&self, id: TokenId) -> Result<SizeCategory> {
        let token = self.token(id)?;
        Ok(token
            .actor
            .and_then(|a| self.actors.get(&a))
            .map(|p| p.size)
            .unwrap_or_default())
    }

    /// Light carried by a token, token-level beating actor-level
    pub fn effective_light(&self, token: &Token) -> Option<LightSource> {
        token.light.or_else(|| {
            token
                .actor
                .and_then(|a| self.actors.get(&a))
                .and_then(|p| p.light)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::LightKind;
    use crate::grid::GridScale;
    use glam::DVec2;

    fn empty_world() -> WorldContext {
        WorldContext::new(
            Scene::new("yard", GridScale::default()),
            EnvironmentDefaults::default(),
        )
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let world = empty_world();
        assert!(matches!(
            world.token(TokenId::new()),
            Err(DuskError::TokenNotFound(_))
        ));
    }

    #[test]
    fn test_unregistered_actor_profile_is_an_error() {
        let world = empty_world();
        assert!(matches!(
            world.actor_profile(ActorId::new()),
            Err(DuskError::ActorNotFound(_))
        ));
    }

    #[test]
    fn test_token_without_actor() {
        let mut world = empty_world();
        let id = world.scene.place(Token::new("crate", DVec2::ZERO));
        assert!(matches!(
            world.token_actor(id),
            Err(DuskError::TokenWithoutActor(_))
        ));
    }

    #[test]
    fn test_token_light_beats_actor_light() {
        let mut world = empty_world();
        let actor = ActorId::new();
        world.register_actor(
            actor,
            ActorProfile::new("scout", SizeCategory::Medium)
                .with_light(LightSource::new(LightKind::Candle)),
        );
        let token = Token::new("scout", DVec2::ZERO)
            .with_actor(actor)
            .with_light(LightSource::new(LightKind::Torch));
        let id = world.scene.place(token);
        let token = world.token(id).unwrap();
        assert_eq!(
            world.effective_light(token).map(|l| l.kind),
            Some(LightKind::Torch)
        );
    }

    #[test]
    fn test_actor_light_used_when_token_has_none() {
        let mut world = empty_world();
        let actor = ActorId::new();
        world.register_actor(
            actor,
            ActorProfile::new("scout", SizeCategory::Medium)
                .with_light(LightSource::new(LightKind::OilLamp)),
        );
        let id = world
            .scene
            .place(Token::new("scout", DVec2::ZERO).with_actor(actor));
        let token = world.token(id).unwrap();
        assert_eq!(
            world.effective_light(token).map(|l| l.kind),
            Some(LightKind::OilLamp)
        );
    }

    #[test]
    fn test_unlinked_token_size_defaults_to_medium() {
        let mut world = empty_world();
        let id = world.scene.place(Token::new("barrel", DVec2::ZERO));
        assert_eq!(world.token_size(id).unwrap(), SizeCategory::Medium);
    }
}
