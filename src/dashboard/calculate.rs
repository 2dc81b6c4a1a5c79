//! Implementation of `dashboard calculate` sub command.

use std::{
    io::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::{Duration, Instant},
};

use rayon::prelude::*;
use thousands::Separable;

use crate::{
    calc,
    common::{self, io::open_write_maybe_gz},
    conf,
};

use super::{read_jsonl, DashboardRecord, GeneVariants};

/// Command line arguments for `dashboard calculate` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "compute dashboard list calculations", long_about = None)]
pub struct Args {
    /// Path to input JSON Lines file(s) with per-gene variants, `@file` reads a list.
    #[arg(long, required = true)]
    pub path_input: Vec<String>,
    /// Path to output JSON Lines file.
    #[arg(long)]
    pub path_output: String,
    /// Optional path to TOML configuration file.
    #[arg(long)]
    pub path_config: Option<String>,
    /// Population roster selection.
    #[command(flatten)]
    pub populations: conf::PopulationArgs,
    /// Set the number of threads to use, defaults to number of cores.
    #[arg(long)]
    pub num_threads: Option<usize>,
    /// Fail if any gene could not be processed instead of skipping it.
    #[arg(long, default_value_t = false)]
    pub fail_on_error: bool,
}

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Number of genes written to the output.
    pub processed: usize,
    /// Number of genes skipped because of malformed data.
    pub skipped: usize,
}

/// Interval between progress log lines.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Progress counter shared by the worker threads.
struct Progress {
    done: AtomicUsize,
    total: usize,
    prev: Mutex<Instant>,
    interval: Duration,
}

impl Progress {
    fn new(total: usize, interval: Duration) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            prev: Mutex::new(Instant::now()),
            interval,
        }
    }

    /// Count one finished gene and log if `interval` has passed since the last log line.
    fn tick(&self, gene_id: &str) -> usize {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut prev) = self.prev.try_lock() {
            if prev.elapsed() >= self.interval {
                tracing::info!(
                    "processed {} of {} genes, at {}",
                    done.separate_with_commas(),
                    self.total.separate_with_commas(),
                    gene_id
                );
                *prev = Instant::now();
            }
        }
        done
    }
}

/// Compute the dashboard record of a single gene.
pub fn process_gene(
    gene: &GeneVariants,
    populations: &[String],
) -> Result<DashboardRecord, anyhow::Error> {
    let variant_calculations = calc::calculate(&gene.variants, populations)
        .map_err(|e| anyhow::anyhow!("variants of gene {}: {}", &gene.gene_id, e))?;
    let de_novo_variant_calculations = gene
        .de_novo_variants
        .as_ref()
        .map(|variants| {
            calc::calculate(variants, populations)
                .map_err(|e| anyhow::anyhow!("de novo variants of gene {}: {}", &gene.gene_id, e))
        })
        .transpose()?;

    Ok(DashboardRecord {
        gene_id: gene.gene_id.clone(),
        symbol: gene.symbol.clone(),
        variant_calculations: serde_json::to_string(&variant_calculations)?,
        de_novo_variant_calculations: de_novo_variant_calculations
            .map(|result| serde_json::to_string(&result))
            .transpose()?,
    })
}

/// Process all `genes` in parallel and write the results to `writer`.
///
/// Genes that fail are logged and skipped, the output keeps the input order.
pub fn calculate_all<W: Write>(
    genes: &[GeneVariants],
    populations: &[String],
    writer: &mut W,
) -> Result<Summary, anyhow::Error> {
    let progress = Progress::new(genes.len(), PROGRESS_INTERVAL);
    let results = genes
        .par_iter()
        .map(|gene| {
            let result = process_gene(gene, populations);
            progress.tick(&gene.gene_id);
            result
        })
        .collect::<Vec<_>>();

    let mut summary = Summary::default();
    for (gene, result) in genes.iter().zip(results) {
        match result {
            Ok(record) => {
                serde_json::to_writer(&mut *writer, &record)?;
                writer.write_all(b"\n")?;
                summary.processed += 1;
            }
            Err(e) => {
                tracing::warn!("skipping gene {}: {}", &gene.gene_id, e);
                summary.skipped += 1;
            }
        }
    }
    writer.flush()?;

    Ok(summary)
}

/// Main entry point for `dashboard calculate` sub command.
pub fn run(args_common: &common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("genie-worker version {}", common::worker_version());
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    if let Some(num_threads) = args.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| anyhow::anyhow!("building global Rayon thread pool failed: {}", e))?;
    }

    let config = conf::Top::load_or_default(args.path_config.as_deref())?;
    let populations = conf::resolve_populations(&args.populations, &config)?;
    tracing::info!("populations = {:?}", &populations);

    tracing::info!("Reading input files...");
    let path_input = common::expand_input_paths(&args.path_input)?;
    let genes: Vec<GeneVariants> = read_jsonl(&path_input)?;
    tracing::info!("... read {} genes", genes.len().separate_with_commas());
    common::trace_rss_now();

    tracing::info!("Computing calculations...");
    let before_calculation = Instant::now();
    let mut writer = open_write_maybe_gz(&args.path_output).map_err(|e| {
        anyhow::anyhow!("could not open {} for writing: {}", &args.path_output, e)
    })?;
    let summary = calculate_all(&genes, &populations, &mut writer)?;
    drop(writer);
    tracing::info!(
        "... processed {} genes, skipped {} genes in {:?}",
        summary.processed.separate_with_commas(),
        summary.skipped.separate_with_commas(),
        before_calculation.elapsed()
    );

    if args.fail_on_error && summary.skipped > 0 {
        anyhow::bail!(
            "{} genes could not be processed",
            summary.skipped.separate_with_commas()
        );
    }

    tracing::info!(
        "All of `dashboard calculate` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use clap_verbosity_flag::Verbosity;
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;
    use temp_testdir::TempDir;

    use super::*;
    use crate::calc::ds::{AggregateResult, Variant};

    fn populations() -> Vec<String> {
        vec!["afr".into(), "nfe".into()]
    }

    fn args(tmp_dir: &TempDir, fail_on_error: bool) -> Args {
        Args {
            path_input: vec!["tests/dashboard/genes.jsonl".into()],
            path_output: tmp_dir.join("out.jsonl").to_string_lossy().to_string(),
            path_config: None,
            populations: conf::PopulationArgs {
                roster: None,
                populations: Some(populations()),
            },
            num_threads: None,
            fail_on_error,
        }
    }

    #[test]
    fn process_gene_with_de_novo() -> Result<(), anyhow::Error> {
        let gene = GeneVariants {
            gene_id: "HGNC:1".into(),
            symbol: Some("ABC1".into()),
            variants: vec![Variant::new(vec![4, 2, 2], vec![10, 5, 5])],
            de_novo_variants: Some(vec![]),
        };

        let record = process_gene(&gene, &populations())?;

        assert_eq!(record.gene_id, "HGNC:1");
        let main: AggregateResult = serde_json::from_str(&record.variant_calculations)?;
        assert_eq!(main.variant_count, 1);
        assert_eq!(main.carrier_frequency_raw_numbers[0].total_ac, 4);
        let de_novo: AggregateResult = serde_json::from_str(
            record
                .de_novo_variant_calculations
                .as_deref()
                .ok_or(anyhow::anyhow!("missing de novo calculations"))?,
        )?;
        assert_eq!(de_novo.variant_count, 0);
        assert_eq!(de_novo.slot_count(), 3);

        Ok(())
    }

    #[test]
    fn process_gene_malformed_de_novo() {
        let gene = GeneVariants {
            gene_id: "HGNC:2".into(),
            symbol: None,
            variants: vec![],
            de_novo_variants: Some(vec![Variant::new(vec![1], vec![2])]),
        };

        let err = process_gene(&gene, &populations()).unwrap_err().to_string();
        assert!(err.contains("de novo variants of gene HGNC:2"), "{}", err);
    }

    #[test]
    fn calculate_all_skips_malformed() -> Result<(), anyhow::Error> {
        let genes: Vec<GeneVariants> = read_jsonl(&["tests/dashboard/genes.jsonl".to_string()])?;
        let mut buf = Vec::new();

        let summary = calculate_all(&genes, &populations(), &mut buf)?;

        assert_eq!(
            summary,
            Summary {
                processed: 3,
                skipped: 1
            }
        );
        let records = String::from_utf8(buf)?
            .lines()
            .map(|line| serde_json::from_str::<DashboardRecord>(line))
            .collect::<Result<Vec<_>, _>>()?;
        let ids = records.iter().map(|r| r.gene_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["HGNC:1884", "HGNC:9999", "HGNC:1100"]);

        let cftr: AggregateResult = serde_json::from_str(&records[0].variant_calculations)?;
        assert_eq!(cftr.variant_count, 3);
        assert_eq!(cftr.carrier_frequency_raw_numbers[0].total_ac, 5);
        assert!(approx_eq!(
            f64,
            cftr.carrier_frequency_raw_numbers[0].average_an,
            20.0 / 3.0,
            ulps = 2
        ));
        assert_eq!(records[1].de_novo_variant_calculations, None);

        Ok(())
    }

    #[test]
    fn run_smoke() -> Result<(), anyhow::Error> {
        let tmp_dir = TempDir::default();
        let common_args = common::Args {
            verbose: Verbosity::new(0, 0),
        };

        run(&common_args, &args(&tmp_dir, false))?;

        let output = std::fs::read_to_string(tmp_dir.join("out.jsonl"))?;
        assert_eq!(output.lines().count(), 3);

        Ok(())
    }

    #[test]
    #[tracing_test::traced_test]
    fn run_logs_version() {
        let tmp_dir = TempDir::default();
        let common_args = common::Args {
            verbose: Verbosity::new(0, 0),
        };

        run(&common_args, &args(&tmp_dir, false)).unwrap();

        assert!(logs_contain("genie-worker version x.y.z"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn progress_counts_and_logs() {
        let progress = Progress::new(2, Duration::ZERO);

        assert_eq!(progress.tick("HGNC:1"), 1);
        assert_eq!(progress.tick("HGNC:2"), 2);

        assert!(logs_contain("processed 1 of 2 genes, at HGNC:1"));
        assert!(logs_contain("processed 2 of 2 genes, at HGNC:2"));
    }

    #[test]
    fn progress_respects_interval() {
        let progress = Progress::new(3, Duration::from_secs(3600));

        for gene_id in ["A", "B", "C"] {
            progress.tick(gene_id);
        }

        assert_eq!(progress.done.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn run_fail_on_error() {
        let tmp_dir = TempDir::default();
        let common_args = common::Args {
            verbose: Verbosity::new(0, 0),
        };

        assert!(run(&common_args, &args(&tmp_dir, true)).is_err());
    }
}
