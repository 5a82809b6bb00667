//! Engine configuration.
//!
//! Every field has a default, so an empty configuration reproduces the
//! built-in behavior: UAE as the baseline region, inclusive calculation,
//! commercial rounding, and the built-in regional rate table.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
#[cfg(feature = "settings")]
use tracing::debug;

#[cfg(feature = "settings")]
use crate::core::EngineError;
use crate::core::{CalculationMethod, Region, RoundingMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Region used when neither the request nor the organization record names one.
    pub baseline_region: Region,
    /// Method used when the request does not name one.
    pub default_calculation_method: CalculationMethod,
    pub rounding: RoundingMode,
    /// Overrides of [`Region::standard_rate`], in percent.
    pub regional_rates: HashMap<Region, Decimal>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_region: Region::Uae,
            default_calculation_method: CalculationMethod::Inclusive,
            rounding: RoundingMode::HalfUp,
            regional_rates: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Default rate for `region`: the configured override, else the built-in table.
    pub fn default_rate(&self, region: Region) -> Decimal {
        self.regional_rates
            .get(&region)
            .copied()
            .unwrap_or_else(|| region.standard_rate())
    }

    pub fn with_regional_rate(mut self, region: Region, rate: Decimal) -> Self {
        self.regional_rates.insert(region, rate);
        self
    }

    pub fn with_baseline_region(mut self, region: Region) -> Self {
        self.baseline_region = region;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    /// Load configuration from an optional `taxrule.toml` (or `.json`/`.yaml`)
    /// file in the working directory, overridden by `TAXRULE__*` environment
    /// variables. A `.env` file is read first when present.
    #[cfg(feature = "settings")]
    pub fn load() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        Self::load_from("taxrule")
    }

    /// Like [`EngineConfig::load`], reading the file named `path` (extension optional).
    #[cfg(feature = "settings")]
    pub fn load_from(path: &str) -> Result<Self, EngineError> {
        use config::{Config, Environment, File};

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("TAXRULE").separator("__"))
            .build()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        debug!(
            baseline_region = %config.baseline_region,
            overrides = config.regional_rates.len(),
            "engine configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_use_builtin_table() {
        let config = EngineConfig::default();
        assert_eq!(config.default_rate(Region::Uae), dec!(5));
        assert_eq!(config.default_rate(Region::SaudiArabia), dec!(15));
        assert_eq!(config.default_rate(Region::Qatar), dec!(0));
    }

    #[test]
    fn override_replaces_one_region() {
        let config = EngineConfig::default().with_regional_rate(Region::Bahrain, dec!(12.5));
        assert_eq!(config.default_rate(Region::Bahrain), dec!(12.5));
        assert_eq!(config.default_rate(Region::Oman), dec!(5));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"rounding": "half_even", "regional_rates": {"KSA": "16"}}"#)
                .unwrap();
        assert_eq!(config.rounding, RoundingMode::HalfEven);
        assert_eq!(config.baseline_region, Region::Uae);
        assert_eq!(config.default_rate(Region::SaudiArabia), dec!(16));
    }

    #[cfg(feature = "settings")]
    #[test]
    fn load_without_file_yields_defaults() {
        let config = EngineConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.baseline_region, Region::Uae);
    }
}
