pub mod light;
pub mod state;
pub mod weather;

pub use light::{LightKind, LightSource};
pub use state::{EnvironmentDefaults, EnvironmentState, SceneEnvironment};
pub use weather::{
    Darkness, DustIntensity, FogIntensity, RainIntensity, SandIntensity, SmokeIntensity,
    SnowIntensity, Weather, WeatherSeverity,
};
