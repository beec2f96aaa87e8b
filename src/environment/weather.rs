//! Weather and darkness conditions affecting perception
//!
//! Weather caps how far detail can be made out; darkness can blind a
//! scene outright. Values are meters of detail range, not multipliers,
//! so they compose with light radii by taking the minimum.

use serde::{Deserialize, Serialize};

/// Current weather condition with intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    Rain(RainIntensity),
    Snow(SnowIntensity),
    Fog(FogIntensity),
    Smoke(SmokeIntensity),
    Dust(DustIntensity),
    Sand(SandIntensity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RainIntensity {
    Light,
    Heavy,
    Storm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnowIntensity {
    Light,
    Heavy,
    Blizzard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FogIntensity {
    Mist,
    Dense,
    Thick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmokeIntensity {
    Thin,
    Choking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DustIntensity {
    Haze,
    Storm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SandIntensity {
    Blowing,
    Storm,
}

impl Weather {
    /// Detail range cap in meters, `None` when the weather imposes none
    pub fn detail_range_cap_m(&self) -> Option<f64> {
        match self {
            Self::Clear => None,
            Self::Rain(RainIntensity::Light) => Some(24.0),
            Self::Rain(RainIntensity::Heavy) => Some(16.0),
            Self::Rain(RainIntensity::Storm) => Some(8.0),
            Self::Snow(SnowIntensity::Light) => Some(30.0),
            Self::Snow(SnowIntensity::Heavy) => Some(15.0),
            Self::Snow(SnowIntensity::Blizzard) => Some(6.0),
            Self::Fog(FogIntensity::Mist) => Some(30.0),
            Self::Fog(FogIntensity::Dense) => Some(10.0),
            Self::Fog(FogIntensity::Thick) => Some(5.0),
            Self::Smoke(SmokeIntensity::Thin) => Some(12.0),
            Self::Smoke(SmokeIntensity::Choking) => Some(2.0),
            Self::Dust(DustIntensity::Haze) => Some(20.0),
            Self::Dust(DustIntensity::Storm) => Some(6.0),
            Self::Sand(SandIntensity::Blowing) => Some(15.0),
            Self::Sand(SandIntensity::Storm) => Some(4.0),
        }
    }

    /// How harshly this weather throttles carried light sources
    pub fn severity(&self) -> WeatherSeverity {
        match self {
            Self::Clear
            | Self::Rain(RainIntensity::Light)
            | Self::Snow(SnowIntensity::Light)
            | Self::Fog(FogIntensity::Mist)
            | Self::Smoke(SmokeIntensity::Thin)
            | Self::Dust(DustIntensity::Haze)
            | Self::Sand(SandIntensity::Blowing) => WeatherSeverity::Mild,
            Self::Rain(RainIntensity::Heavy)
            | Self::Rain(RainIntensity::Storm)
            | Self::Snow(SnowIntensity::Heavy)
            | Self::Fog(FogIntensity::Dense)
            | Self::Dust(DustIntensity::Storm)
            | Self::Sand(SandIntensity::Storm) => WeatherSeverity::Harsh,
            Self::Snow(SnowIntensity::Blizzard)
            | Self::Fog(FogIntensity::Thick)
            | Self::Smoke(SmokeIntensity::Choking) => WeatherSeverity::Punishing,
        }
    }
}

impl Default for Weather {
    fn default() -> Self {
        Self::Clear
    }
}

/// Light-throttling band derived from weather
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherSeverity {
    Mild,
    Harsh,
    Punishing,
}

/// Ambient darkness of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Darkness {
    None,
    /// Unnatural dimness that swallows light sources
    Elemental,
    Absolute,
}

impl Darkness {
    /// Blinding darkness makes targets imperceptible regardless of geometry
    pub fn is_blinding(&self) -> bool {
        matches!(self, Self::Elemental | Self::Absolute)
    }
}

impl Default for Darkness {
    fn default() -> Self {
        Self::None
    }
}
