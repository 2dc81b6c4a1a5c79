//! Code for supporting the worker configuration file.

use std::{path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    calc::populations::{self, Roster},
    err::ConfigError,
};

/// Default number of decimal places in exported files.
pub const DEFAULT_DECIMALS: usize = 6;

/// Export related configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Export {
    /// Number of decimal places to round floating point values to.
    pub decimals: usize,
}

impl Default for Export {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// Top-level configuration, read from TOML.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Top {
    /// Name of a known population roster.
    pub roster: Option<String>,
    /// Explicit population roster, takes precedence over `roster`.
    pub populations: Option<Vec<String>>,
    /// Export settings.
    pub export: Export,
}

impl Top {
    /// Load configuration from the TOML file at `path`.
    pub fn load<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        tracing::debug!("loading configuration from {:?}", path.as_ref());
        let toml_str = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("could not read config file {:?}: {}", path.as_ref(), e)
        })?;
        toml::from_str(&toml_str)
            .map_err(|e| anyhow::anyhow!("could not parse config file {:?}: {}", path.as_ref(), e))
    }

    /// Load configuration from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, anyhow::Error> {
        match path {
            Some(path) => Self::load(shellexpand::tilde(path).into_owned()),
            None => Ok(Self::default()),
        }
    }
}

/// Population roster selection from the command line.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PopulationArgs {
    /// Known population roster to use.
    #[arg(long, value_enum)]
    pub roster: Option<Roster>,
    /// Comma-separated list of population names, overrides `--roster`.
    #[arg(long, value_delimiter = ',')]
    pub populations: Option<Vec<String>>,
}

/// Resolve the population roster from the command line and configuration.
///
/// Explicit population lists win over roster names and the command line wins
/// over the configuration file.  Falls back to `Roster::default()`.
pub fn resolve_populations(args: &PopulationArgs, conf: &Top) -> Result<Vec<String>, ConfigError> {
    let result = if let Some(populations) = &args.populations {
        populations.clone()
    } else if let Some(populations) = &conf.populations {
        populations.clone()
    } else if let Some(roster) = args.roster {
        roster.names()
    } else if let Some(roster) = &conf.roster {
        Roster::from_str(roster)
            .map_err(|_| ConfigError::UnknownRoster(roster.clone()))?
            .names()
    } else {
        Roster::default().names()
    };
    populations::validate(&result)?;
    Ok(result)
}
