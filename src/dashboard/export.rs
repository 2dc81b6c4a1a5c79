//! Implementation of `dashboard export` sub command.

use itertools::Itertools;
use thousands::Separable;

use crate::{
    calc::{ds::AggregateResult, populations::slot_labels},
    common::{self, io::open_write_maybe_gz},
    conf,
};

use super::{read_jsonl, DashboardRecord};

/// Per-slot statistics in column order.
const STATISTICS: &[&str] = &[
    "total_allele_frequency",
    "carrier_frequency",
    "carrier_frequency_simplified",
    "prevalence",
    "prevalence_bayesian",
];

/// Prefix of the de novo columns.
const DE_NOVO_PREFIX: &str = "de_novo_";

/// Column delimiter of the output file.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Command line arguments for `dashboard export` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "export dashboard lists as table", long_about = None)]
pub struct Args {
    /// Path to input JSON Lines file(s) with dashboard records, `@file` reads a list.
    #[arg(long, required = true)]
    pub path_input: Vec<String>,
    /// Path to output CSV/TSV file.
    #[arg(long)]
    pub path_output: String,
    /// Optional path to TOML configuration file.
    #[arg(long)]
    pub path_config: Option<String>,
    /// Population roster selection, must match the one used for calculation.
    #[command(flatten)]
    pub populations: conf::PopulationArgs,
    /// Number of decimal places, overrides the configuration file.
    #[arg(long)]
    pub decimals: Option<usize>,
    /// Column delimiter.
    #[arg(long, value_enum, default_value_t = Delimiter::default())]
    pub delimiter: Delimiter,
    /// Also write the de novo calculation columns.
    #[arg(long, default_value_t = false)]
    pub include_de_novo: bool,
}

/// Column names for the calculation of one kind, prefixed with `prefix`.
fn calculation_header(prefix: &str, labels: &[String]) -> Vec<String> {
    let mut result = vec![format!("{}variant_count", prefix)];
    for statistic in STATISTICS {
        result.extend(
            labels
                .iter()
                .map(|label| format!("{}{}_{}", prefix, statistic, label)),
        );
    }
    for raw in ["total_ac", "average_an"] {
        result.extend(
            labels
                .iter()
                .map(|label| format!("{}{}_{}", prefix, raw, label)),
        );
    }
    result
}

/// Full header of the output table.
pub fn header(populations: &[String], include_de_novo: bool) -> Vec<String> {
    let labels = slot_labels(populations);
    let mut result = vec!["gene_id".to_string(), "symbol".to_string()];
    result.extend(calculation_header("", &labels));
    if include_de_novo {
        result.extend(calculation_header(DE_NOVO_PREFIX, &labels));
    }
    result
}

/// Per-slot statistics of `result` in the order of `STATISTICS`.
fn statistics(result: &AggregateResult) -> [&[f64]; 5] {
    [
        result.total_allele_frequency.as_slice(),
        result.carrier_frequency.as_slice(),
        result.carrier_frequency_simplified.as_slice(),
        result.prevalence.as_slice(),
        result.prevalence_bayesian.as_slice(),
    ]
}

/// Format the cells of one calculation, rounding floats to `decimals` places.
fn calculation_cells(
    result: &AggregateResult,
    num_slots: usize,
    decimals: usize,
) -> Result<Vec<String>, anyhow::Error> {
    if result.slot_count() != num_slots {
        anyhow::bail!(
            "found {} slots, expected {}",
            result.slot_count(),
            num_slots
        );
    }
    let stats = statistics(result);
    if let Some(len) = stats
        .iter()
        .map(|values| values.len())
        .chain(std::iter::once(result.carrier_frequency_raw_numbers.len()))
        .find(|len| *len != num_slots)
    {
        anyhow::bail!("inconsistent slot counts: {} and {}", len, num_slots);
    }

    let mut cells = vec![result.variant_count.to_string()];
    for values in stats {
        cells.extend(values.iter().map(|x| format!("{:.*}", decimals, x)));
    }
    cells.extend(
        result
            .carrier_frequency_raw_numbers
            .iter()
            .map(|raw| raw.total_ac.to_string()),
    );
    cells.extend(
        result
            .carrier_frequency_raw_numbers
            .iter()
            .map(|raw| format!("{:.*}", decimals, raw.average_an)),
    );
    Ok(cells)
}

/// Flatten one dashboard record into a table row.
pub fn row(
    record: &DashboardRecord,
    populations: &[String],
    decimals: usize,
    include_de_novo: bool,
) -> Result<Vec<String>, anyhow::Error> {
    let num_slots = populations.len() + 1;
    let parse = |s: &str, kind: &str| -> Result<Vec<String>, anyhow::Error> {
        let result: AggregateResult = serde_json::from_str(s).map_err(|e| {
            anyhow::anyhow!("invalid {} of gene {}: {}", kind, &record.gene_id, e)
        })?;
        calculation_cells(&result, num_slots, decimals)
            .map_err(|e| anyhow::anyhow!("invalid {} of gene {}: {}", kind, &record.gene_id, e))
    };

    let mut cells = vec![
        record.gene_id.clone(),
        record.symbol.clone().unwrap_or_default(),
    ];
    cells.extend(parse(&record.variant_calculations, "variant calculations")?);
    if include_de_novo {
        match record.de_novo_variant_calculations.as_deref() {
            Some(s) => cells.extend(parse(s, "de novo variant calculations")?),
            None => cells.extend(std::iter::repeat(String::new()).take(
                calculation_header(DE_NOVO_PREFIX, &slot_labels(populations)).len(),
            )),
        }
    }
    Ok(cells)
}

/// Main entry point for `dashboard export` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("genie-worker version {}", common::worker_version());
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let config = conf::Top::load_or_default(args.path_config.as_deref())?;
    let populations = conf::resolve_populations(&args.populations, &config)?;
    let decimals = args.decimals.unwrap_or(config.export.decimals);
    tracing::info!(
        "populations = {}, decimals = {}",
        populations.iter().join(","),
        decimals
    );

    let path_input = common::expand_input_paths(&args.path_input)?;
    let records: Vec<DashboardRecord> = read_jsonl(&path_input)?;
    tracing::info!("writing {} records...", records.len().separate_with_commas());

    let writer = open_write_maybe_gz(&args.path_output).map_err(|e| {
        anyhow::anyhow!("could not open {} for writing: {}", &args.path_output, e)
    })?;
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(args.delimiter.as_byte())
        .from_writer(writer);
    csv_writer.write_record(header(&populations, args.include_de_novo))?;
    for record in &records {
        csv_writer.write_record(row(
            record,
            &populations,
            decimals,
            args.include_de_novo,
        )?)?;
    }
    csv_writer.flush()?;

    tracing::info!(
        "All of `dashboard export` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
