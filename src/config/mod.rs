//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pairing::cost::MAX_BONUS_HALF_POINTS;
use crate::pairing::{SearchLimits, Strategy, Variant, VariantSettings};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pairing engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Search nodes per solver pass
    #[serde(default = "default_max_search_nodes")]
    pub max_search_nodes: u64,

    /// Virtual points for accelerated top seeds
    #[serde(default = "default_acceleration_bonus")]
    pub acceleration_bonus: f64,

    #[serde(default = "default_standard_bias_weight")]
    pub standard_bias_weight: u64,

    #[serde(default = "default_uscf_bias_weight")]
    pub uscf_bias_weight: u64,

    #[serde(default = "default_fide_color_weight")]
    pub fide_color_weight: u64,
}

fn default_max_search_nodes() -> u64 {
    250_000
}

fn default_acceleration_bonus() -> f64 {
    1.0
}

fn default_standard_bias_weight() -> u64 {
    1
}

fn default_uscf_bias_weight() -> u64 {
    3
}

fn default_fide_color_weight() -> u64 {
    2
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_search_nodes: default_max_search_nodes(),
            acceleration_bonus: default_acceleration_bonus(),
            standard_bias_weight: default_standard_bias_weight(),
            uscf_bias_weight: default_uscf_bias_weight(),
            fide_color_weight: default_fide_color_weight(),
        }
    }
}

impl PairingConfig {
    /// Engine settings. The bonus is converted to half points.
    pub fn variant_settings(&self) -> VariantSettings {
        VariantSettings {
            acceleration_bonus: (self.acceleration_bonus * 2.0).round() as i64,
            standard_bias_weight: self.standard_bias_weight,
            uscf_bias_weight: self.uscf_bias_weight,
            fide_color_weight: self.fide_color_weight,
        }
    }

    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_nodes: self.max_search_nodes,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub pairing: PairingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            pairing: PairingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pairing = &self.pairing;

        if pairing.max_search_nodes == 0 {
            return Err(ConfigError::ValidationError(
                "max_search_nodes must be greater than 0".to_string(),
            ));
        }

        let doubled = pairing.acceleration_bonus * 2.0;
        if !doubled.is_finite()
            || doubled.fract() != 0.0
            || doubled < 1.0
            || doubled > MAX_BONUS_HALF_POINTS as f64
        {
            return Err(ConfigError::ValidationError(format!(
                "acceleration_bonus must be a positive multiple of 0.5 no larger than {}, got {}",
                MAX_BONUS_HALF_POINTS as f64 / 2.0,
                pairing.acceleration_bonus
            )));
        }

        let settings = pairing.variant_settings();
        for variant in [Variant::Standard, Variant::Uscf, Variant::Fide] {
            if Strategy::resolve(variant, &settings, &[], None).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "weights for the {} variant break the cost tier ordering",
                    variant
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.pairing.max_search_nodes, 250_000);
        assert_eq!(config.pairing.variant_settings(), VariantSettings::default());
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_budget() {
        let mut config = AppConfig::default();
        config.pairing.max_search_nodes = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_bonus() {
        let mut config = AppConfig::default();
        for bonus in [0.0, -1.0, 0.75, 2.5] {
            config.pairing.acceleration_bonus = bonus;
            assert!(config.validate().is_err(), "bonus {} accepted", bonus);
        }
        config.pairing.acceleration_bonus = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_weights() {
        let mut config = AppConfig::default();
        config.pairing.uscf_bias_weight = 1_000_000;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            data_dir = "/srv/pairings"

            [pairing]
            max_search_nodes = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/pairings"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.pairing.max_search_nodes, 5000);
        assert_eq!(config.pairing.uscf_bias_weight, 3);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(
            config.pairing.acceleration_bonus,
            parsed.pairing.acceleration_bonus
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.log_level, "info");
    }
}
