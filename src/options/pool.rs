use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Texture pool limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Texture Pool", inline)]
#[serde(default)]
pub struct PoolOptions {
    /// Idle textures kept per shape after an evaluation; the rest are
    /// released.
    #[schemars(title = "Max Idle Per Shape", range(min = 0, max = 64))]
    pub max_idle_per_shape: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_idle_per_shape: 4,
        }
    }
}
