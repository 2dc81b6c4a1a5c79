//! Ancestry group rosters.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::err::ConfigError;

/// Label used for the global slot 0 in exported columns.
pub const TOTAL_LABEL: &str = "total";

/// Known population rosters of gnomAD releases.
#[derive(
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Roster {
    /// gnomAD v2 exomes/genomes.
    GnomadV2,
    /// gnomAD v4 exomes/genomes.
    #[default]
    GnomadV4,
}

impl Roster {
    /// The ordered population names, matching slots `1..=N`.
    pub fn names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Roster::GnomadV2 => &["afr", "amr", "asj", "eas", "fin", "nfe", "oth", "sas"],
            Roster::GnomadV4 => &[
                "afr",
                "amr",
                "asj",
                "eas",
                "fin",
                "mid",
                "nfe",
                "remaining",
                "sas",
            ],
        };
        names.iter().map(|s| s.to_string()).collect()
    }
}

/// Check that the population names are non-empty and distinct.
pub fn validate(populations: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in populations {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyPopulationName);
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicatePopulation(name.clone()));
        }
    }
    Ok(())
}

/// Column labels for all slots, i.e., `"total"` followed by the populations.
pub fn slot_labels(populations: &[String]) -> Vec<String> {
    std::iter::once(TOTAL_LABEL.to_string())
        .chain(populations.iter().cloned())
        .collect()
}
