//! Scenes and the tokens placed on them
//!
//! A scene owns its tokens outright. Tokens reference their actor by id
//! and never the other way around, so removing a token can never orphan
//! actor data.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, SceneId, TokenId};
use crate::environment::{LightSource, SceneEnvironment};
use crate::grid::GridScale;

/// Axis-aligned silhouette box of a token, in scene pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteBounds {
    pub center: DVec2,
    pub width_px: f64,
    pub height_px: f64,
}

impl SilhouetteBounds {
    pub fn new(center: DVec2, width_px: f64, height_px: f64) -> Self {
        Self { center, width_px, height_px }
    }

    /// Center plus the four edge midpoints
    pub fn sample_points(&self) -> [DVec2; 5] {
        let hw = self.width_px / 2.0;
        let hh = self.height_px / 2.0;
        [
            self.center,
            DVec2::new(self.center.x - hw, self.center.y),
            DVec2::new(self.center.x + hw, self.center.y),
            DVec2::new(self.center.x, self.center.y - hh),
            DVec2::new(self.center.x, self.center.y + hh),
        ]
    }
}

/// A creature or object placed on a scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    /// Position in scene pixel space
    pub position: DVec2,
    /// Owning actor, if this token represents one
    pub actor: Option<ActorId>,
    pub silhouette: Option<SilhouetteBounds>,
    pub light: Option<LightSource>,
    /// Stealth marker set by the hosting application
    pub hidden: bool,
}

impl Token {
    pub fn new(name: impl Into<String>, position: DVec2) -> Self {
        Self {
            id: TokenId::new(),
            name: name.into(),
            position,
            actor: None,
            silhouette: None,
            light: None,
            hidden: false,
        }
    }

    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_silhouette(mut self, width_px: f64, height_px: f64) -> Self {
        self.silhouette = Some(SilhouetteBounds::new(self.position, width_px, height_px));
        self
    }

    pub fn with_light(mut self, light: LightSource) -> Self {
        self.light = Some(light);
        self
    }
}

/// A playable map with a grid scale and its tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub scale: GridScale,
    pub environment: Option<SceneEnvironment>,
    tokens: Vec<Token>,
}

impl Scene {
    pub fn new(name: impl Into<String>, scale: GridScale) -> Self {
        Self {
            id: SceneId::new(),
            name: name.into(),
            scale,
            environment: None,
            tokens: Vec::new(),
        }
    }

    /// Place a token, returning its id
    pub fn place(&mut self, token: Token) -> TokenId {
        let id = token.id;
        self.tokens.push(token);
        id
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == id)
    }

    pub fn remove(&mut self, id: TokenId) -> Option<Token> {
        let idx = self.tokens.iter().position(|t| t.id == id)?;
        Some(self.tokens.remove(idx))
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
