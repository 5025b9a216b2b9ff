//! Engine configuration, loadable from YAML.
//!
//! ```yaml
//! dynamic_slot: layer
//! max_iterations: 100000
//! max_depth: 128
//! log_program: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use stencil_core::catalogue::DYNAMIC_SLOT;

use crate::error::ConfigError;
use crate::parser::DEFAULT_MAX_DEPTH;

pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reserved template name overwritten by dynamic content.
    pub dynamic_slot: String,
    /// Total loop iterations allowed in one render.
    pub max_iterations: u64,
    /// Nesting levels allowed in directive code before compilation fails.
    pub max_depth: usize,
    /// Include the program listing when logging a failed render.
    pub log_program: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dynamic_slot: DYNAMIC_SLOT.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_depth: DEFAULT_MAX_DEPTH,
            log_program: true,
        }
    }
}

impl EngineConfig {
    /// Read the YAML config at `path`. Missing keys take their defaults.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
