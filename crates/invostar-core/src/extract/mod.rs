//! Classification of free-text invoice fields.
//!
//! Every operation here runs the text through an ordered [`RuleSet`]: the
//! first label whose pattern matches wins, otherwise the set's fallback label
//! is returned. No match is an ordinary outcome, never an error.

pub mod patterns;
mod category;
mod client;

pub use category::{extract_payment_category, extract_product_category};
pub use client::{analyze_observations, extract_client_info, ClientInfo, ObservationSummary};

use regex::{Regex, RegexBuilder};

/// Label for a field that is empty or carries no recognisable information.
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Fallback for a non-empty payment name that matches no category.
pub const OTHER: &str = "Other";

/// Fallback for product descriptions.
pub const GENERAL: &str = "General";

/// A label and the pattern that selects it.
#[derive(Debug, Clone)]
pub struct Rule {
    pub label: &'static str,
    pattern: Regex,
}

impl Rule {
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Ordered rules evaluated first-match-wins.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    fallback: &'static str,
}

impl RuleSet {
    /// Compile a table of `label -> patterns`. Patterns of one label are
    /// alternatives; labels are tried in table order. Matching ignores case.
    pub fn compile(
        table: &[(&'static str, &[&str])],
        fallback: &'static str,
    ) -> Result<Self, regex::Error> {
        let rules = table
            .iter()
            .map(|(label, patterns)| {
                let alternation = patterns
                    .iter()
                    .map(|p| format!("(?:{})", p))
                    .collect::<Vec<_>>()
                    .join("|");
                let pattern = RegexBuilder::new(&alternation)
                    .case_insensitive(true)
                    .build()?;
                Ok(Rule {
                    label: *label,
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { rules, fallback })
    }

    /// The first matching label, if any.
    pub fn find(&self, text: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.is_match(text))
            .map(|rule| rule.label)
    }

    /// The first matching label, or the fallback.
    pub fn classify(&self, text: &str) -> &'static str {
        self.find(text).unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> &'static str {
        self.fallback
    }

    /// Labels in evaluation order.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.label)
    }
}

/// Lower-case, strip punctuation other than `.` and `-`, and collapse
/// whitespace.
pub fn normalize_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Facade over the three classification operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Client type and tax regime from invoice observations.
    pub fn extract_client_info(&self, observations: &str) -> ClientInfo {
        extract_client_info(observations)
    }

    /// Payment category from a payment method name.
    pub fn extract_payment_category(&self, payment_name: &str) -> &'static str {
        extract_payment_category(payment_name)
    }

    /// Product category from a line item description.
    pub fn extract_product_category(&self, description: &str) -> &'static str {
        extract_product_category(description)
    }
}
