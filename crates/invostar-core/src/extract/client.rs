//! Client type and tax regime from invoice observations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::{CLIENT_TYPE, TAX_REGIME};
use super::{normalize_text, NOT_SPECIFIED};

/// Attributes derived from an invoice's observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_type: String,
    pub tax_regime: String,
}

impl ClientInfo {
    fn unspecified() -> Self {
        Self {
            client_type: NOT_SPECIFIED.to_string(),
            tax_regime: NOT_SPECIFIED.to_string(),
        }
    }
}

/// Derive client type and tax regime. The two are matched independently.
pub fn extract_client_info(observations: &str) -> ClientInfo {
    if observations.trim().is_empty() {
        return ClientInfo::unspecified();
    }

    let text = normalize_text(observations);
    let info = ClientInfo {
        client_type: CLIENT_TYPE.classify(&text).to_string(),
        tax_regime: TAX_REGIME.classify(&text).to_string(),
    };

    debug!(
        client_type = %info.client_type,
        tax_regime = %info.tax_regime,
        "classified observations"
    );

    info
}

/// Distribution of derived labels over a sample of observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSummary {
    pub total: usize,
    pub empty: usize,
    pub client_types: BTreeMap<String, usize>,
    pub tax_regimes: BTreeMap<String, usize>,
}

/// Classify every non-empty observation and count the labels.
pub fn analyze_observations<S: AsRef<str>>(observations: &[S]) -> ObservationSummary {
    let mut summary = ObservationSummary {
        total: observations.len(),
        ..Default::default()
    };

    for obs in observations {
        let obs = obs.as_ref();
        if obs.trim().is_empty() {
            summary.empty += 1;
            continue;
        }

        let info = extract_client_info(obs);
        *summary.client_types.entry(info.client_type).or_default() += 1;
        *summary.tax_regimes.entry(info.tax_regime).or_default() += 1;
    }

    summary
}
