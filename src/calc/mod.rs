//! Carrier frequency and genetic prevalence calculation.
//!
//! Given the qualifying variants of a gene, each with allele counts (`AC`) and
//! allele numbers (`AN`) per ancestry slot, we compute per-slot
//!
//! - the total allele frequency `q` (sum over the variants' `AC / AN`),
//! - the prevalence `q^2`,
//! - the Bayesian prevalence `(1 - prod(1 - af))^2`,
//! - the carrier frequency `2 (1 - q) q` and its approximation `2 q`,
//! - the raw numbers (summed `AC`, averaged `AN`).
//!
//! Slot 0 is the global total, slots `1..=N` follow the population roster.

pub mod ds;
pub mod populations;

use crate::err::MalformedVariantError;

use self::ds::{AggregateResult, RawNumbers, Variant};

/// Check that all variants with allele counts fit `num_slots`.
fn validate(variants: &[Variant], num_slots: usize) -> Result<(), MalformedVariantError> {
    for (index, variant) in variants.iter().enumerate() {
        if !variant.has_frequencies() {
            continue;
        }
        let ac = variant.ac.as_deref().unwrap_or_default();
        let an = variant
            .an
            .as_ref()
            .ok_or(MalformedVariantError::MissingAn { index })?;
        if ac.len() != an.len() {
            return Err(MalformedVariantError::LengthMismatch {
                index,
                ac_len: ac.len(),
                an_len: an.len(),
            });
        }
        if ac.len() != num_slots {
            return Err(MalformedVariantError::SlotCountMismatch {
                index,
                len: ac.len(),
                expected: num_slots,
            });
        }
    }
    Ok(())
}

/// Compute the aggregate statistics for `variants`.
///
/// Only the length of `populations` is used.  Variants without `AC` values
/// do not contribute to the sums but are counted in `variant_count` and in the
/// denominator of `average_an`.
///
/// # Errors
///
/// Returns a `MalformedVariantError` if a variant's `AC`/`AN` lengths are
/// inconsistent with each other or with `populations.len() + 1`.  In this
/// case, no result is computed at all.
pub fn calculate(
    variants: &[Variant],
    populations: &[String],
) -> Result<AggregateResult, MalformedVariantError> {
    let num_slots = populations.len() + 1;
    validate(variants, num_slots)?;

    if variants.is_empty() {
        tracing::warn!("no variants given, all statistics will be zero");
    }

    let mut total_allele_frequency = vec![0f64; num_slots];
    let mut product_term = vec![1f64; num_slots];
    let mut total_ac = vec![0u64; num_slots];
    let mut total_an = vec![0u64; num_slots];

    for variant in variants {
        if !variant.has_frequencies() {
            continue;
        }
        let ac = variant.ac.as_deref().unwrap_or_default();
        let an = variant.an.as_deref().unwrap_or_default();
        for (i, (&ac, &an)) in ac.iter().zip(an.iter()).enumerate() {
            let af = if an == 0 {
                0f64
            } else {
                ac as f64 / an as f64
            };
            total_allele_frequency[i] += af;
            product_term[i] *= 1f64 - af;
            total_ac[i] += ac as u64;
            total_an[i] += an as u64;
        }
    }

    let variant_count = variants.len();
    let carrier_frequency_raw_numbers = total_ac
        .iter()
        .zip(total_an.iter())
        .map(|(&total_ac, &total_an)| RawNumbers {
            total_ac,
            average_an: if variant_count > 0 {
                total_an as f64 / variant_count as f64
            } else {
                0f64
            },
        })
        .collect();

    Ok(AggregateResult {
        variant_count,
        prevalence: total_allele_frequency.iter().map(|q| q.powi(2)).collect(),
        prevalence_bayesian: product_term.iter().map(|p| (1f64 - p).powi(2)).collect(),
        carrier_frequency: total_allele_frequency
            .iter()
            .map(|q| 2f64 * (1f64 - q) * q)
            .collect(),
        carrier_frequency_simplified: total_allele_frequency.iter().map(|q| 2f64 * q).collect(),
        total_allele_frequency,
        carrier_frequency_raw_numbers,
    })
}
