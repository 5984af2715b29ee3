use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Adapter power preference.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    /// Let the platform decide.
    None,
    /// Prefer an integrated GPU.
    LowPower,
    /// Prefer a discrete GPU.
    #[default]
    HighPerformance,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(p: PowerPreference) -> Self {
        match p {
            PowerPreference::None => Self::None,
            PowerPreference::LowPower => Self::LowPower,
            PowerPreference::HighPerformance => Self::HighPerformance,
        }
    }
}

/// Adapter selection.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[schemars(title = "GPU", inline)]
#[serde(default)]
pub struct GpuOptions {
    /// Which adapter class to request.
    #[schemars(title = "Power Preference")]
    pub power_preference: PowerPreference,
    /// Only accept a software (fallback) adapter.
    #[schemars(title = "Force Fallback Adapter")]
    pub force_fallback_adapter: bool,
}
