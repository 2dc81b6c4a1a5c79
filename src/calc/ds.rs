//! Data structures consumed and produced by the calculator.

use serde::{Deserialize, Serialize};

/// Per-slot allele counts and numbers of one qualifying variant.
///
/// Slot 0 holds the global total, slots `1..=N` follow the population roster.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Allele counts, absent if the variant has no frequency data.
    #[serde(rename = "AC", default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<Vec<u32>>,
    /// Allele numbers, indexed like `ac`.
    #[serde(rename = "AN", default, skip_serializing_if = "Option::is_none")]
    pub an: Option<Vec<u32>>,
}

impl Variant {
    /// Construct a variant with frequency data.
    pub fn new(ac: Vec<u32>, an: Vec<u32>) -> Self {
        Self {
            ac: Some(ac),
            an: Some(an),
        }
    }

    /// Return whether the variant carries any allele counts.
    pub fn has_frequencies(&self) -> bool {
        self.ac.as_ref().map(|ac| !ac.is_empty()).unwrap_or(false)
    }
}

/// Summed allele counts and averaged allele numbers for one slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawNumbers {
    /// Sum of `AC` over all variants.
    pub total_ac: u64,
    /// Sum of `AN` divided by the number of variants.
    pub average_an: f64,
}

/// Aggregated statistics for a gene's variant list.
///
/// All vectors have one entry per slot with index 0 being the global total.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub variant_count: usize,
    pub prevalence: Vec<f64>,
    pub prevalence_bayesian: Vec<f64>,
    pub total_allele_frequency: Vec<f64>,
    pub carrier_frequency: Vec<f64>,
    pub carrier_frequency_simplified: Vec<f64>,
    pub carrier_frequency_raw_numbers: Vec<RawNumbers>,
}

impl AggregateResult {
    /// Number of frequency slots, including the global slot.
    pub fn slot_count(&self) -> usize {
        self.total_allele_frequency.len()
    }
}
