use crate::{
    detectors::ecg::EcgPipelineConfig,
    diagnostics::Severity,
    error::{EcgError, Result},
};
use serde::Deserialize;
use std::{fs, path::Path};

/// Magnitude above which a voltage is outside the recording device's range.
pub const DEFAULT_VOLTAGE_LIMIT: f64 = 300.0;

/// Run-wide settings, loadable from a TOML file. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub voltage_limit: f64,
    pub non_numeric_severity: Severity,
    pub loader: LoaderConfig,
    pub detector: EcgPipelineConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            voltage_limit: DEFAULT_VOLTAGE_LIMIT,
            non_numeric_severity: Severity::Error,
            loader: LoaderConfig::default(),
            detector: EcgPipelineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub delimiter: char,
    pub has_header: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: false,
        }
    }
}

impl LoaderConfig {
    pub(crate) fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii())
            .ok_or_else(|| EcgError::Config {
                path: "<loader>".into(),
                reason: format!("delimiter {:?} is not a single ASCII character", self.delimiter),
            })
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| EcgError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text).map_err(|e| EcgError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !(cfg.voltage_limit.is_finite() && cfg.voltage_limit > 0.0) {
            return Err(EcgError::Config {
                path: path.to_path_buf(),
                reason: format!("voltage_limit must be positive, got {}", cfg.voltage_limit),
            });
        }
        Ok(cfg)
    }
}
