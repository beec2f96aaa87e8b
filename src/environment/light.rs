//! Carried light sources and their reach under bad weather

use serde::{Deserialize, Serialize};

use super::weather::WeatherSeverity;

/// Kind of carried light source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    Candle,
    Torch,
    OilLamp,
}

impl LightKind {
    /// Useful detail radius in calm conditions
    pub fn base_radius_m(&self) -> f64 {
        match self {
            Self::Candle => 2.0,
            Self::Torch => 4.0,
            Self::OilLamp => 6.0,
        }
    }

    /// Radius ceiling under the given weather severity
    pub fn cap_under(&self, severity: WeatherSeverity) -> Option<f64> {
        match severity {
            WeatherSeverity::Mild => None,
            WeatherSeverity::Harsh => Some(match self {
                Self::Candle => 1.0,
                Self::Torch => 2.0,
                Self::OilLamp => 3.0,
            }),
            WeatherSeverity::Punishing => Some(match self {
                Self::Candle => 0.5,
                Self::Torch => 1.0,
                Self::OilLamp => 1.5,
            }),
        }
    }
}

/// A light source carried by a token or actor
///
/// An explicit `radius_override` is honored as-is; weather caps only
/// apply to kind-derived radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub kind: LightKind,
    pub radius_override: Option<f64>,
}

impl LightSource {
    pub fn new(kind: LightKind) -> Self {
        Self { kind, radius_override: None }
    }

    pub fn with_radius(kind: LightKind, radius_m: f64) -> Self {
        Self { kind, radius_override: Some(radius_m) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_radii_ordered() {
        assert!(LightKind::Candle.base_radius_m() < LightKind::Torch.base_radius_m());
        assert!(LightKind::Torch.base_radius_m() < LightKind::OilLamp.base_radius_m());
    }

    #[test]
    fn test_mild_weather_leaves_light_alone() {
        assert_eq!(LightKind::Torch.cap_under(WeatherSeverity::Mild), None);
    }

    #[test]
    fn test_harsh_weather_halves_torch() {
        assert_eq!(LightKind::Torch.cap_under(WeatherSeverity::Harsh), Some(2.0));
    }
}
