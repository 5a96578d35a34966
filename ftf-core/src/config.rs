//! Serializable pipeline configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! [imputer]
//! max_iter = 10
//! tol = 0.001
//! seed = 42
//! order = "ascending"
//! on_non_convergence = "warn"
//!
//! [macd]
//! enabled = true
//! short_window = 12
//! long_window = 26
//! signal_window = 9
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PrepError, PrepResult};
use crate::features::MacdParams;
use crate::prep::ImputerConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub imputer: ImputerConfig,
    pub macd: MacdConfig,
}

/// Whether to append the MACD family, and with which spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub enabled: bool,
    pub short_window: usize,
    pub long_window: usize,
    pub signal_window: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        let params = MacdParams::default();
        Self {
            enabled: true,
            short_window: params.short_window,
            long_window: params.long_window,
            signal_window: params.signal_window,
        }
    }
}

impl MacdConfig {
    pub fn params(&self) -> MacdParams {
        MacdParams {
            short_window: self.short_window,
            long_window: self.long_window,
            signal_window: self.signal_window,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> PrepResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| PrepError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> PrepResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> PrepResult<String> {
        toml::to_string_pretty(self).map_err(|e| PrepError::Config(e.to_string()))
    }

    pub fn validate(&self) -> PrepResult<()> {
        self.imputer.validate()?;
        if self.macd.enabled {
            self.macd.params().validate()?;
        }
        Ok(())
    }

    /// Content hash of the configuration (BLAKE3 over its JSON form).
    ///
    /// Two runs with the same fingerprint prepared their tables identically.
    pub fn fingerprint(&self) -> PrepResult<String> {
        let json = serde_json::to_string(self).map_err(|e| PrepError::Config(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prep::{ConvergencePolicy, ImputationOrder};

    #[test]
    fn empty_document_is_default() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.imputer.max_iter, 10);
        assert_eq!(config.imputer.seed, 42);
        assert!(config.macd.enabled);
        assert_eq!(config.macd.params(), MacdParams::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [imputer]
            order = "random"
            on_non_convergence = "error"

            [macd]
            short_window = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.imputer.order, ImputationOrder::Random);
        assert_eq!(config.imputer.on_non_convergence, ConvergencePolicy::Error);
        assert_eq!(config.imputer.max_iter, 10);
        assert_eq!(config.macd.short_window, 5);
        assert_eq!(config.macd.long_window, 26);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = PipelineConfig::from_toml_str("[macd]\nsignal_window = 0\n").unwrap_err();
        assert!(matches!(err, PrepError::InvalidParameter(_)));

        let err = PipelineConfig::from_toml_str("[imputer]\norder = \"sideways\"\n").unwrap_err();
        assert!(matches!(err, PrepError::Config(_)));
    }

    #[test]
    fn disabled_macd_skips_window_checks() {
        let config = PipelineConfig::from_toml_str("[macd]\nenabled = false\nshort_window = 0\n");
        assert!(config.is_ok());
    }

    #[test]
    fn toml_round_trip() {
        let config = PipelineConfig {
            macd: MacdConfig::disabled(),
            ..PipelineConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = PipelineConfig::default();
        let mut b = PipelineConfig::default();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        b.imputer.seed = 7;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[imputer]\nmax_iter = 3\n").unwrap();
        assert_eq!(PipelineConfig::load(&path).unwrap().imputer.max_iter, 3);
    }
}
