use serde::Deserialize;

use crate::error::AllocError;
use crate::facility::{FacilityParser, DEFAULT_PREFIXES};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllocConfig {
    pub name: String,
    /// Ledger CSV, relative to the config file.
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub crossdock: CrossdockConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub filter: LoadFilter,
    #[serde(default)]
    pub trends: TrendConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self {
            name: "allocation".into(),
            input: None,
            crossdock: CrossdockConfig::default(),
            validation: ValidationConfig::default(),
            columns: ColumnMapping::default(),
            filter: LoadFilter::default(),
            trends: TrendConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Crossdock + Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossdockConfig {
    /// Crossdock name families; a location matching any of them is a crossdock.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl Default for CrossdockConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
        }
    }
}

/// Opt-in input checks. When disabled the engine trusts its input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Treat an empty pick or drop location as a malformed record.
    #[serde(default)]
    pub require_locations: bool,
}

// ---------------------------------------------------------------------------
// Loader: column mapping + filter
// ---------------------------------------------------------------------------

/// CSV header names for each leg field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub leg_id: String,
    pub order_id: String,
    pub main_leg: String,
    pub revenue: String,
    pub cost: String,
    pub units: String,
    pub pick_location: String,
    pub drop_location: String,
    pub category: String,
    pub status: String,
    pub pick_window: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            leg_id: "warpId".into(),
            order_id: "orderCode".into(),
            main_leg: "mainShipment".into(),
            revenue: "revenueAllocationNumber".into(),
            cost: "costAllocationNumber".into(),
            units: "pieces".into(),
            pick_location: "pickLocationName".into(),
            drop_location: "dropLocationName".into(),
            category: "shipmentType".into(),
            status: "shipmentStatus".into(),
            pick_window: "pickWindowFrom".into(),
        }
    }
}

/// Row filter applied by the loader before the engine sees any leg.
/// An empty `status` disables the status filter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadFilter {
    pub status: Option<String>,
    pub year: Option<i32>,
}

impl Default for LoadFilter {
    fn default() -> Self {
        Self {
            status: Some("Complete".into()),
            year: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trends + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendConfig {
    pub min_quarters: usize,
    pub min_r2: f64,
    pub top: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_quarters: 3,
            min_r2: 0.5,
            top: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl AllocConfig {
    pub fn from_toml(input: &str) -> Result<Self, AllocError> {
        let config: AllocConfig =
            toml::from_str(input).map_err(|e| AllocError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AllocError> {
        if self.crossdock.prefixes.is_empty() {
            return Err(AllocError::ConfigValidation(
                "crossdock.prefixes must list at least one prefix".into(),
            ));
        }
        for prefix in &self.crossdock.prefixes {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(AllocError::ConfigValidation(format!(
                    "crossdock.prefixes entries must be non-empty ASCII alphanumeric, got '{prefix}'"
                )));
            }
        }

        if self.trends.min_quarters < 2 {
            return Err(AllocError::ConfigValidation(format!(
                "trends.min_quarters must be at least 2, got {}",
                self.trends.min_quarters
            )));
        }

        if !(0.0..=1.0).contains(&self.trends.min_r2) {
            return Err(AllocError::ConfigValidation(format!(
                "trends.min_r2 must be within [0, 1], got {}",
                self.trends.min_r2
            )));
        }

        if self.trends.top == 0 {
            return Err(AllocError::ConfigValidation("trends.top must be at least 1".into()));
        }

        Ok(())
    }

    pub fn facility_parser(&self) -> FacilityParser {
        FacilityParser::new(self.crossdock.prefixes.iter().cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
