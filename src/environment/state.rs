//! Effective environment state and the settings/scene merge
//!
//! Operators configure environment defaults once; individual scenes may
//! override any field. Resolution happens per lookup so scene edits take
//! effect immediately.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::Result;

use super::light::{LightKind, LightSource};
use super::weather::{Darkness, Weather};

/// Fully resolved environment for one scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentState {
    pub weather: Weather,
    pub darkness: Darkness,
    /// Per-kind radius replacements, e.g. enchanted torches
    #[serde(default)]
    pub light_overrides: AHashMap<LightKind, f64>,
}

impl EnvironmentState {
    /// Detail-range cap from weather, if the weather imposes one
    pub fn weather_cap_m(&self) -> Option<f64> {
        self.weather.detail_range_cap_m()
    }

    /// Detail-range cap from a carried light source
    ///
    /// No light source means no restriction. Explicit per-source radii
    /// bypass both the override table and the weather throttle.
    pub fn light_cap_m(&self, source: Option<&LightSource>) -> Option<f64> {
        let source = source?;
        if let Some(radius) = source.radius_override {
            return Some(radius);
        }
        let base = self
            .light_overrides
            .get(&source.kind)
            .copied()
            .unwrap_or_else(|| source.kind.base_radius_m());
        match source.kind.cap_under(self.weather.severity()) {
            Some(cap) => Some(base.min(cap)),
            None => Some(base),
        }
    }
}

/// Campaign-level environment defaults, loadable from TOML settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentDefaults {
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub darkness: Darkness,
    #[serde(default)]
    pub light_overrides: AHashMap<LightKind, f64>,
}

impl EnvironmentDefaults {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Merge with a scene's overrides, the scene winning per field
    ///
    /// A scene with no environment record resolves to the defaults.
    pub fn resolve(&self, scene: Option<&SceneEnvironment>) -> EnvironmentState {
        let mut state = EnvironmentState {
            weather: self.weather,
            darkness: self.darkness,
            light_overrides: self.light_overrides.clone(),
        };
        if let Some(scene) = scene {
            if let Some(weather) = scene.weather {
                state.weather = weather;
            }
            if let Some(darkness) = scene.darkness {
                state.darkness = darkness;
            }
            for (kind, radius) in &scene.light_overrides {
                state.light_overrides.insert(*kind, *radius);
            }
        }
        state
    }
}

/// Per-scene environment overrides, every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneEnvironment {
    pub weather: Option<Weather>,
    pub darkness: Option<Darkness>,
    #[serde(default)]
    pub light_overrides: AHashMap<LightKind, f64>,
}
