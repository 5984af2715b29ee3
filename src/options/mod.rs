//! Engine configuration with TOML file support.
//!
//! Every section uses `#[serde(default)]` so partial TOML files (e.g. only
//! overriding `[pool]`) work correctly.

mod gpu;
mod pool;

use std::path::Path;

pub use gpu::{GpuOptions, PowerPreference};
pub use pool::PoolOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::resource::PixelEncoding;

/// Largest `max_qubits` an options file may request.
pub const QUBIT_LIMIT: u32 = 24;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct EngineOptions {
    /// Texel encoding of amplitude textures.
    #[schemars(title = "Pixel Encoding")]
    pub pixel_encoding: PixelEncoding,
    /// Largest register the executor accepts.
    #[schemars(title = "Max Qubits", range(min = 1, max = 24))]
    pub max_qubits: u32,
    /// Texture pool limits.
    pub pool: PoolOptions,
    /// Adapter selection.
    pub gpu: GpuOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            pixel_encoding: PixelEncoding::Float,
            max_qubits: 16,
            pool: PoolOptions::default(),
            gpu: GpuOptions::default(),
        }
    }
}

impl EngineOptions {
    /// Generate JSON Schema describing the exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(EngineOptions)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`EngineError::Io`] if the file cannot be read,
    /// [`EngineError::OptionsParse`] if it is not valid TOML or
    /// `max_qubits` is outside `1..=QUBIT_LIMIT`.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(EngineError::Io)?;
        let options: Self = toml::from_str(&content)
            .map_err(|e| EngineError::OptionsParse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check ranges the TOML types cannot express.
    ///
    /// # Errors
    ///
    /// [`EngineError::OptionsParse`] naming the offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(1..=QUBIT_LIMIT).contains(&self.max_qubits) {
            return Err(EngineError::OptionsParse(format!(
                "max_qubits = {} is outside 1..={QUBIT_LIMIT}",
                self.max_qubits
            )));
        }
        Ok(())
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`EngineError::OptionsParse`] if serialization fails,
    /// [`EngineError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(EngineError::Io)?;
        }
        std::fs::write(path, content).map_err(EngineError::Io)
    }
}
