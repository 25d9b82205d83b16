//! # Application Configuration
//!
//! Optional TOML file passed with `--config`:
//!
//! ```toml
//! [hysteresis]
//! enabled = true
//! alpha = 0.3
//! theta_up = 1.6
//! theta_down = 1.3
//! hold_ms = 1000
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! tick_ms = 100
//! ```
//!
//! Every field has a default, so an empty file (or no file) is valid. Unknown
//! keys are rejected to catch typos. The hysteresis section is validated at
//! load time; the core controller itself never validates.

use linkstate_core::primitives::{
    DEFAULT_ALPHA, DEFAULT_HOLD_MS, DEFAULT_THETA_DOWN, DEFAULT_THETA_UP,
};
use linkstate_core::{HysteresisConfig, LinkStateError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TICK_MS: u64 = 100;

// =============================================================================
// SECTIONS
// =============================================================================

/// `[hysteresis]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HysteresisSection {
    pub enabled: bool,
    pub alpha: f64,
    pub theta_up: f64,
    pub theta_down: f64,
    pub hold_ms: u64,
}

impl Default for HysteresisSection {
    fn default() -> Self {
        Self {
            enabled: true,
            alpha: DEFAULT_ALPHA,
            theta_up: DEFAULT_THETA_UP,
            theta_down: DEFAULT_THETA_DOWN,
            hold_ms: DEFAULT_HOLD_MS,
        }
    }
}

impl HysteresisSection {
    #[must_use]
    pub fn params(&self) -> HysteresisConfig {
        HysteresisConfig {
            alpha: self.alpha,
            theta_up: self.theta_up,
            theta_down: self.theta_down,
            hold_ms: self.hold_ms,
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Interval of the background hysteresis/recompute ticker.
    pub tick_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub hysteresis: HysteresisSection,
    pub server: ServerSection,
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, LinkStateError> {
        let config: Self =
            toml::from_str(text).map_err(|e| LinkStateError::Config(format!("toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, LinkStateError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            LinkStateError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(LinkStateError::Config(format!(
                "'{}' is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            LinkStateError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, LinkStateError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn validate(&self) -> Result<(), LinkStateError> {
        self.hysteresis
            .params()
            .validate()
            .map_err(|e| LinkStateError::Config(e.to_string()))?;
        if self.server.tick_ms == 0 {
            return Err(LinkStateError::Config(
                "server.tick_ms must be at least 1".to_string(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(LinkStateError::Config(
                "server.host must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = AppConfig::from_toml_str("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert!(config.hysteresis.enabled);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = AppConfig::from_toml_str("[hysteresis]\nalpha = 0.5\n").expect("parse");
        assert_eq!(config.hysteresis.alpha, 0.5);
        assert_eq!(config.hysteresis.hold_ms, DEFAULT_HOLD_MS);
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = AppConfig::from_toml_str("[hysteresis]\nalpah = 0.5\n");
        assert!(matches!(result, Err(LinkStateError::Config(_))));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let result = AppConfig::from_toml_str("[hysteresis]\ntheta_up = 1.0\ntheta_down = 2.0\n");
        assert!(matches!(result, Err(LinkStateError::Config(_))));
    }

    #[test]
    fn zero_tick_is_rejected() {
        let result = AppConfig::from_toml_str("[server]\ntick_ms = 0\n");
        assert!(matches!(result, Err(LinkStateError::Config(_))));
    }

    #[test]
    fn params_mirror_section() {
        let section = HysteresisSection {
            hold_ms: 250,
            ..HysteresisSection::default()
        };
        let params = section.params();
        assert_eq!(params.hold_ms, 250);
        assert_eq!(params.alpha, DEFAULT_ALPHA);
    }
}
