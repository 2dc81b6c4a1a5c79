//! GeniE worker main executable

pub mod calc;
pub mod common;
pub mod conf;
pub mod dashboard;
pub mod err;

use clap::{Args, Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "GeniE dashboard list heavy lifting",
    long_about = "This tool computes carrier frequencies and genetic prevalences for GeniE"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Dashboard list related commands.
    Dashboard(Dashboard),
}

/// Parsing of "dashboard *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Dashboard {
    /// The sub command to run
    #[command(subcommand)]
    command: DashboardCommands,
}

/// Enum supporting the parsing of "dashboard *" sub commands.
#[derive(Debug, Subcommand)]
enum DashboardCommands {
    Calculate(dashboard::calculate::Args),
    Export(dashboard::export::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    tracing::subscriber::set_global_default(collector)?;

    let term = Term::stderr();
    match &cli.command {
        Commands::Dashboard(dashboard) => match &dashboard.command {
            DashboardCommands::Calculate(args) => {
                dashboard::calculate::run(&cli.common, args)?;
            }
            DashboardCommands::Export(args) => {
                dashboard::export::run(&cli.common, args)?;
            }
        },
    }
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        super::Cli::command().debug_assert();
    }

    #[test]
    fn parse_calculate() -> Result<(), anyhow::Error> {
        let cli = <super::Cli as clap::Parser>::try_parse_from([
            "genie-worker",
            "dashboard",
            "calculate",
            "--path-input",
            "genes.jsonl",
            "--path-output",
            "out.jsonl",
            "--populations",
            "afr,nfe",
        ])?;

        match cli.command {
            super::Commands::Dashboard(super::Dashboard {
                command: super::DashboardCommands::Calculate(args),
            }) => {
                assert_eq!(args.populations.populations, Some(vec!["afr".into(), "nfe".into()]));
                assert_eq!(args.populations.roster, None);
            }
            _ => anyhow::bail!("unexpected command"),
        }

        Ok(())
    }
}
