//! Engine configuration
//!
//! Loaded from TOML. Every section is optional; a missing file or section
//! falls back to the built-in thresholds.
//!
//! ```toml
//! [pushups]
//! enter_threshold = 105.0
//! complete_threshold = 155.0
//! debounce_ms = 700
//! min_valid_angle = 60.0
//! max_valid_angle = 180.0
//!
//! [planks]
//! max_alignment_error = 40.0
//!
//! [simulation]
//! tick_ms = 50
//! ```
//!
//! A rep section that is present must carry its thresholds, debounce and
//! valid range; `min_confidence` and `inclusive_bounds` may be omitted.

use crate::error::ChallengeError;
use crate::reps::CounterConfig;
use crate::source::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default config file name looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "seventyfive.toml";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(flatten)]
    pub counter: CounterConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ChallengeError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ChallengeError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_toml_str(&contents)?;
                debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ChallengeError> {
        self.counter.validate()?;
        if self.simulation.tick_ms <= 0 {
            return Err(ChallengeError::ConfigError(
                "simulation: tick_ms must be positive".to_string(),
            ));
        }
        if self.simulation.cycle_ms <= self.simulation.tick_ms {
            return Err(ChallengeError::ConfigError(
                "simulation: cycle_ms must be longer than tick_ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ChallengeError> {
        toml::to_string_pretty(self).map_err(|e| ChallengeError::ConfigError(e.to_string()))
    }
}
