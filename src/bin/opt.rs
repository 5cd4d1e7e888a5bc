use std::path::PathBuf;

use clap::Parser;
use jetflow::{cluster::JetAlgorithm, config::Config};
use thiserror::Error;

#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Settings file in YAML format.
    ///
    /// Settings that are not given keep their default values.
    #[clap(short, long, value_parser)]
    pub(crate) config: Option<PathBuf>,

    /// Output directory.
    ///
    /// Each page is written to a numbered SVG file in this directory.
    #[clap(long, short, value_parser, default_value = "result")]
    pub(crate) outdir: PathBuf,

    /// Comma-separated list of event files with minimum-bias events
    /// to overlay as pileup.
    #[clap(long, short, value_parser, value_delimiter = ',')]
    pub(crate) pileup: Vec<PathBuf>,

    /// Maximum number of hard-scatter events.
    #[clap(short, long)]
    pub(crate) events: Option<usize>,

    /// Comma-separated list of jet algorithms, replacing the selection
    /// from the settings file.
    ///
    /// Possible values are 'anti-kt', 'kt', and 'Cambridge-Aachen'.
    #[clap(short, long, value_delimiter = ',')]
    pub(crate) algorithms: Vec<JetAlgorithm>,

    /// Mean number of pileup interactions per event. '0' disables pileup.
    #[clap(long)]
    pub(crate) mu: Option<f64>,

    /// Random number generator seed for pileup sampling.
    #[clap(long)]
    pub(crate) seed: Option<u64>,

    /// Verbosity level
    #[clap(
        short,
        long,
        default_value = "Info",
        help = "Verbosity level.
Possible values with increasing amount of output are
'off', 'error', 'warn', 'info', 'debug', 'trace'.\n"
    )]
    pub(crate) loglevel: String,

    /// Hard-scatter event files.
    #[clap(name = "INFILES", value_parser, required = true)]
    pub(crate) infiles: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub(crate) enum ValidationError {
    #[error("Pileup with μ = {0} requested, but no pileup event files given")]
    NoPileupFiles(f64),
}

impl Opt {
    /// Apply the command line settings on top of the given ones
    pub(crate) fn merge_into(&self, config: &mut Config) {
        if let Some(events) = self.events {
            config.events = Some(events);
        }
        if !self.algorithms.is_empty() {
            config.algorithms = self.algorithms.iter().copied().collect();
        }
        if let Some(mu) = self.mu {
            config.pileup_mu = mu;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }

    pub(crate) fn validate(&self, config: &Config) -> Result<(), ValidationError> {
        if config.pileup_mu > 0. && self.pileup.is_empty() {
            return Err(ValidationError::NoPileupFiles(config.pileup_mu));
        }
        Ok(())
    }
}
