//! Configuration structures for the star-schema export.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::license::{LicenseTier, TierLicense};
use crate::models::dimensions::NumberFormat;
use crate::models::fact::OBSERVATIONS_LIMIT;
use crate::schema::BuilderOptions;

/// Main configuration for invostar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    /// License configuration.
    pub license: LicenseConfig,

    /// Export configuration.
    pub export: ExportConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// License configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Subscription tier.
    pub tier: LicenseTier,

    /// Lower the tier's record ceiling.
    pub max_records: Option<usize>,
}

impl LicenseConfig {
    /// Build the gate described by this section.
    pub fn gate(&self) -> TierLicense {
        let gate = TierLicense::new(self.tier);
        match self.max_records {
            Some(max) => gate.with_max_records(max),
            None => gate,
        }
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Json,
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the tables are written to.
    pub output_dir: PathBuf,

    /// Output file format.
    pub format: TableFormat,

    /// Render decimals with a comma separator.
    pub decimal_comma: bool,

    /// Maximum characters of observations kept per fact row.
    pub observations_limit: usize,

    /// Validate the schema after export.
    pub validate: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs/bi"),
            format: TableFormat::Csv,
            decimal_comma: true,
            observations_limit: OBSERVATIONS_LIMIT,
            validate: true,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Zone assigned to every seller.
    pub seller_zone: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            seller_zone: "Unspecified".to_string(),
        }
    }
}

impl StarConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Builder options derived from this configuration.
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            observations_limit: self.export.observations_limit,
            seller_zone: self.extraction.seller_zone.clone(),
            number_format: NumberFormat {
                decimal_comma: self.export.decimal_comma,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::LicenseGate;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: StarConfig =
            serde_json::from_str(r#"{ "license": { "tier": "pro" } }"#).unwrap();

        assert_eq!(config.license.tier, LicenseTier::Pro);
        assert_eq!(config.export.observations_limit, OBSERVATIONS_LIMIT);
        assert_eq!(config.export.format, TableFormat::Csv);
        assert_eq!(config.extraction.seller_zone, "Unspecified");
    }

    #[test]
    fn test_license_section_builds_gate() {
        let section = LicenseConfig {
            tier: LicenseTier::Enterprise,
            max_records: Some(25),
        };
        assert_eq!(section.gate().max_records(), Some(25));
    }
}
