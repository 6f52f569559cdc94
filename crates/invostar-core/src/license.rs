//! License gate: caps how many invoices a single export may contain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StarError};

/// Record ceiling for the PRO tier.
pub const PRO_MAX_RECORDS: usize = 2_000;

/// Contract of the component that decides whether an export may run.
pub trait LicenseGate {
    /// Whether the license includes star-schema export at all.
    fn can_export(&self) -> bool;

    /// Maximum invoices per export; `None` means unlimited.
    fn max_records(&self) -> Option<usize>;

    /// Display name used in error messages.
    fn name(&self) -> String;
}

/// Subscription tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl LicenseTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseTier::Free => "FREE",
            LicenseTier::Pro => "PRO",
            LicenseTier::Enterprise => "ENTERPRISE",
        }
    }
}

impl fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseTier {
    type Err = StarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(LicenseTier::Free),
            "pro" | "professional" => Ok(LicenseTier::Pro),
            "enterprise" => Ok(LicenseTier::Enterprise),
            other => Err(StarError::Config(format!("unknown license tier: {}", other))),
        }
    }
}

/// Gate derived from a tier, with an optional lower ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLicense {
    tier: LicenseTier,
    max_override: Option<usize>,
}

impl TierLicense {
    pub fn new(tier: LicenseTier) -> Self {
        Self {
            tier,
            max_override: None,
        }
    }

    /// Use a custom ceiling. It can only tighten the tier's own limit.
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_override = Some(max);
        self
    }

    pub fn tier(&self) -> LicenseTier {
        self.tier
    }

    fn tier_max(&self) -> Option<usize> {
        match self.tier {
            LicenseTier::Free => Some(0),
            LicenseTier::Pro => Some(PRO_MAX_RECORDS),
            LicenseTier::Enterprise => None,
        }
    }
}

impl LicenseGate for TierLicense {
    fn can_export(&self) -> bool {
        self.tier != LicenseTier::Free
    }

    fn max_records(&self) -> Option<usize> {
        match (self.tier_max(), self.max_override) {
            (Some(tier), Some(custom)) => Some(tier.min(custom)),
            (None, custom) => custom,
            (tier, None) => tier,
        }
    }

    fn name(&self) -> String {
        self.tier.to_string()
    }
}

/// Snapshot of the gate reported alongside processing statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSummary {
    pub license: String,
    pub can_export: bool,
    pub max_records: Option<usize>,
}

impl LicenseSummary {
    pub fn of(gate: &dyn LicenseGate) -> Self {
        Self {
            license: gate.name(),
            can_export: gate.can_export(),
            max_records: gate.max_records(),
        }
    }
}

/// Fail fast if `requested` invoices may not be exported under `gate`.
///
/// A gate whose `can_export()` is false yields
/// [`StarError::FeatureUnavailable`]; a batch over `max_records()` yields
/// [`StarError::LicenseLimitExceeded`]. Both messages name the limit and the
/// requested count.
pub fn check_batch(gate: &dyn LicenseGate, requested: usize) -> Result<()> {
    if !gate.can_export() {
        return Err(StarError::FeatureUnavailable {
            tier: gate.name(),
            requested,
        });
    }

    match gate.max_records() {
        Some(max) if requested > max => Err(StarError::LicenseLimitExceeded {
            tier: gate.name(),
            max,
            requested,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_limits() {
        let free = TierLicense::new(LicenseTier::Free);
        let pro = TierLicense::new(LicenseTier::Pro);
        let enterprise = TierLicense::new(LicenseTier::Enterprise);

        assert!(!free.can_export());
        assert_eq!(pro.max_records(), Some(PRO_MAX_RECORDS));
        assert_eq!(enterprise.max_records(), None);
    }

    #[test]
    fn test_override_only_tightens() {
        let pro = TierLicense::new(LicenseTier::Pro).with_max_records(50_000);
        assert_eq!(pro.max_records(), Some(PRO_MAX_RECORDS));

        let pro = TierLicense::new(LicenseTier::Pro).with_max_records(10);
        assert_eq!(pro.max_records(), Some(10));

        let enterprise = TierLicense::new(LicenseTier::Enterprise).with_max_records(10);
        assert_eq!(enterprise.max_records(), Some(10));
    }

    #[test]
    fn test_check_batch_boundary() {
        let gate = TierLicense::new(LicenseTier::Pro).with_max_records(3);

        assert!(check_batch(&gate, 3).is_ok());
        match check_batch(&gate, 4) {
            Err(StarError::LicenseLimitExceeded { max, requested, .. }) => {
                assert_eq!((max, requested), (3, 4));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_free_tier_is_rejected() {
        let gate = TierLicense::new(LicenseTier::Free);
        let err = check_batch(&gate, 5).unwrap_err();
        assert!(matches!(err, StarError::FeatureUnavailable { requested: 5, .. }));

        let message = err.to_string();
        assert!(message.contains("FREE"));
        assert!(message.contains("limit 0"));
        assert!(message.contains("requested 5"));
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("Pro".parse::<LicenseTier>().unwrap(), LicenseTier::Pro);
        assert_eq!(" enterprise ".parse::<LicenseTier>().unwrap(), LicenseTier::Enterprise);
        assert!("gold".parse::<LicenseTier>().is_err());
    }
}
