//! Common functionality.

use byte_unit::{Byte, UnitType};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    match rss {
        Ok(rss) => tracing::debug!(
            "RSS now: {:.2}",
            Byte::from_u64(rss).get_appropriate_unit(UnitType::Binary)
        ),
        Err(e) => tracing::debug!("could not determine RSS: {}", e),
    }
}

/// Return the version of the `genie-worker` crate and `x.y.z` in tests.
pub fn worker_version() -> &'static str {
    if cfg!(test) {
        "x.y.z"
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Expand the list of input paths.
///
/// Arguments starting with `@` name a file with one path per line, empty lines
/// are skipped.  A leading `~` is expanded to the home directory.
pub fn expand_input_paths(paths: &[String]) -> Result<Vec<String>, anyhow::Error> {
    let mut result = Vec::new();
    for path in paths {
        if let Some(path) = path.strip_prefix('@') {
            let path = shellexpand::tilde(path);
            for line in io::read_lines(&*path)
                .map_err(|e| anyhow::anyhow!("could not read path list {}: {}", &path, e))?
            {
                let line = line?;
                let line = line.trim();
                if !line.is_empty() {
                    result.push(shellexpand::tilde(line).into_owned());
                }
            }
        } else {
            result.push(shellexpand::tilde(path).into_owned());
        }
    }
    Ok(result)
}
