//! Dashboard list computation and export.
//!
//! The `dashboard calculate` sub command computes the variant calculations for
//! each gene and `dashboard export` flattens them into one column per
//! statistic and ancestry group.

pub mod calculate;
pub mod export;

use std::io::BufRead;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{calc::ds::Variant, common::io::open_read_maybe_gz};

/// The qualifying variants of one gene, as prepared by the extraction step.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneVariants {
    /// Gene identifier, e.g., HGNC or ENSEMBL ID.
    pub gene_id: String,
    /// Gene symbol, if known.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Variants used for the main calculation.
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Variants used for the de novo calculation, if any.
    #[serde(default)]
    pub de_novo_variants: Option<Vec<Variant>>,
}

/// One gene's dashboard entry as stored by the web server.
///
/// The calculation fields hold the JSON serialization of
/// `calc::ds::AggregateResult`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRecord {
    pub gene_id: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub variant_calculations: String,
    #[serde(default)]
    pub de_novo_variant_calculations: Option<String>,
}

/// Read all records from the JSON Lines files at `paths`.
///
/// Empty lines are skipped.
pub fn read_jsonl<T>(paths: &[String]) -> Result<Vec<T>, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut result = Vec::new();
    for path in paths {
        tracing::debug!("reading {:?}", path);
        let reader = open_read_maybe_gz(path)
            .map_err(|e| anyhow::anyhow!("could not open file {} for reading: {}", path, e))?;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                anyhow::anyhow!("could not parse {}:{}: {}", path, lineno + 1, e)
            })?;
            result.push(record);
        }
    }
    Ok(result)
}
