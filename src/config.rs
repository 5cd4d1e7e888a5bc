use std::path::Path;

use log::debug;
use particle_id::ParticleID;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cluster::{JetAlgorithm, JetConfiguration, JetDefinition, RecombinationScheme},
    compose::RESONANCE_STATUS,
    event::Classifier,
    raster::{AxisError, Raster},
};

/// Which jet algorithms to run
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Algorithms {
    pub anti_kt: bool,
    pub kt: bool,
    pub cambridge_aachen: bool,
}

impl Default for Algorithms {
    fn default() -> Self {
        Self {
            anti_kt: true,
            kt: true,
            cambridge_aachen: false,
        }
    }
}

impl Algorithms {
    /// The selected algorithms in the order kt, anti-kt, Cambridge/Aachen
    ///
    /// This is the alphabetical order of the historical plot labels, so
    /// pages come out in the same order as in older event displays.
    pub fn selected(&self) -> Vec<JetAlgorithm> {
        [
            (self.kt, JetAlgorithm::Kt),
            (self.anti_kt, JetAlgorithm::AntiKt),
            (self.cambridge_aachen, JetAlgorithm::CambridgeAachen),
        ]
        .into_iter()
        .filter_map(|(on, algo)| on.then_some(algo))
        .collect()
    }
}

impl FromIterator<JetAlgorithm> for Algorithms {
    /// Select exactly the given algorithms
    fn from_iter<I: IntoIterator<Item = JetAlgorithm>>(iter: I) -> Self {
        let mut res = Self {
            anti_kt: false,
            kt: false,
            cambridge_aachen: false,
        };
        for algorithm in iter {
            match algorithm {
                JetAlgorithm::AntiKt => res.anti_kt = true,
                JetAlgorithm::Kt => res.kt = true,
                JetAlgorithm::CambridgeAachen => res.cambridge_aachen = true,
            }
        }
        res
    }
}

/// Number of raster bins
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Grid {
    pub y_bins: usize,
    pub phi_bins: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            y_bins: 200,
            phi_bins: 157,
        }
    }
}

/// Selection of the resonances shown on each page
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Resonances {
    /// Absolute value of the generator status code
    pub status: i32,
    /// PDG IDs of particles counted as resonances
    pub ids: Vec<i32>,
}

impl Default for Resonances {
    fn default() -> Self {
        Self {
            status: RESONANCE_STATUS,
            ids: vec![6, 23, 24, 25],
        }
    }
}

/// Colour given as red, green, blue components
pub type Rgb = [u8; 3];

/// Marker colours
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Style {
    pub hard_scatter: Rgb,
    pub positive: Rgb,
    pub negative: Rgb,
    pub neutral: Rgb,
    pub pileup: Rgb,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            hard_scatter: [0, 0, 0],
            positive: [200, 0, 0],
            negative: [0, 0, 200],
            neutral: [0, 100, 0],
            pileup: [128, 128, 128],
        }
    }
}

/// Settings for the event display
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Maximum number of hard-scatter events
    pub events: Option<usize>,
    /// Minimum jet transverse momentum
    pub jet_pt_min: f64,
    /// Minimum transverse momentum for drawing particles
    pub hadron_pt_min: f64,
    /// Maximum absolute rapidity
    pub y_max: f64,
    /// Mean number of pileup interactions
    pub pileup_mu: f64,
    /// Jet radius
    pub radius: f64,
    pub algorithms: Algorithms,
    pub recombination: RecombinationScheme,
    pub grid: Grid,
    pub resonances: Resonances,
    /// Random number generator seed
    pub seed: u64,
    /// Process description shown on each page
    pub process: String,
    pub style: Style,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            events: None,
            jet_pt_min: 25.,
            hadron_pt_min: 1.,
            y_max: 4.,
            pileup_mu: 60.,
            radius: 0.4,
            algorithms: Default::default(),
            recombination: Default::default(),
            grid: Default::default(),
            resonances: Default::default(),
            seed: 0,
            process: "pp → WH → qq̄bb̄, √s = 13.6 TeV".to_owned(),
            style: Default::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("Jet radius has to be positive, is {0}")]
    Radius(f64),
    #[error("Mean number of pileup interactions has to be finite and non-negative, is {0}")]
    PileupMu(f64),
    #[error("Rapidity range has to be positive, is {0}")]
    RapidityRange(f64),
    #[error("Invalid raster: {0}")]
    Grid(#[from] AxisError),
    #[error("Transverse momentum threshold {0} has to be non-negative, is {1}")]
    Threshold(&'static str, f64),
    #[error("No jet algorithm selected")]
    NoAlgorithm,
}

impl Config {
    /// Read and validate settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {:?}", path.as_ref());
        let file = std::fs::File::open(path)?;
        let config: Self = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        use ConfigError::*;
        if !(self.radius > 0.) {
            return Err(Radius(self.radius));
        }
        if !(self.pileup_mu >= 0. && self.pileup_mu.is_finite()) {
            return Err(PileupMu(self.pileup_mu));
        }
        if !(self.y_max > 0.) {
            return Err(RapidityRange(self.y_max));
        }
        if !(self.jet_pt_min >= 0.) {
            return Err(Threshold("jet_pt_min", self.jet_pt_min));
        }
        if !(self.hadron_pt_min >= 0.) {
            return Err(Threshold("hadron_pt_min", self.hadron_pt_min));
        }
        if self.algorithms.selected().is_empty() {
            return Err(NoAlgorithm);
        }
        self.raster()?;
        Ok(())
    }

    /// The active jet configurations in the order kt, anti-kt, Cambridge/Aachen
    pub fn jet_configurations(&self) -> Vec<JetConfiguration> {
        self.algorithms
            .selected()
            .into_iter()
            .map(|algorithm| {
                JetConfiguration::new(JetDefinition {
                    algorithm,
                    radius: self.radius,
                    min_pt: self.jet_pt_min,
                    recombination: self.recombination,
                })
            })
            .collect()
    }

    /// Empty energy-flow raster
    pub fn raster(&self) -> Result<Raster, AxisError> {
        Raster::with_bins(self.grid.y_bins, self.grid.phi_bins, self.y_max)
    }

    /// Particle classification with the configured resonances
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.resonances.ids.iter().map(|&id| ParticleID::new(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        let raster = config.raster().unwrap();
        assert_eq!(raster.nbins(), 200 * 157);
        let labels: Vec<_> = config
            .jet_configurations()
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(labels, ["kt jets, R = 0.4", "Anti-kt jets, R = 0.4"]);
    }

    #[test]
    fn from_yaml() {
        let yaml = "
pileup_mu: 0
radius: 0.6
algorithms:
  cambridge_aachen: true
recombination: Pt
grid:
  y_bins: 20
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.pileup_mu, 0.);
        assert_eq!(config.jet_pt_min, 25.);
        assert_eq!(config.grid, Grid { y_bins: 20, phi_bins: 157 });
        let jet_configs = config.jet_configurations();
        let algos: Vec<_> = jet_configs.iter().map(|c| c.jet_def.algorithm).collect();
        assert_eq!(
            algos,
            [
                JetAlgorithm::Kt,
                JetAlgorithm::AntiKt,
                JetAlgorithm::CambridgeAachen
            ]
        );
        assert_eq!(jet_configs[2].label, "Cambridge-Aachen jets, R = 0.6");
        assert!(jet_configs
            .iter()
            .all(|c| c.jet_def.recombination == RecombinationScheme::Pt));

        assert!(serde_yaml::from_str::<Config>("radius_typo: 1").is_err());
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"events: 3\nseed: 17\n").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.events, Some(3));
        assert_eq!(config.seed, 17);

        std::io::Write::write_all(&mut file, b"radius: -1\n").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Radius(_))
        ));
    }

    #[test]
    fn invalid() {
        let check = |f: fn(&mut Config)| {
            let mut config = Config::default();
            f(&mut config);
            config.validate()
        };
        assert!(matches!(check(|c| c.radius = 0.), Err(ConfigError::Radius(_))));
        assert!(matches!(
            check(|c| c.pileup_mu = -1.),
            Err(ConfigError::PileupMu(_))
        ));
        assert!(matches!(
            check(|c| c.pileup_mu = f64::INFINITY),
            Err(ConfigError::PileupMu(_))
        ));
        assert!(matches!(
            check(|c| c.y_max = 0.),
            Err(ConfigError::RapidityRange(_))
        ));
        assert!(matches!(
            check(|c| c.grid.phi_bins = 0),
            Err(ConfigError::Grid(AxisError::NoBins))
        ));
        assert!(matches!(
            check(|c| c.jet_pt_min = -1.),
            Err(ConfigError::Threshold("jet_pt_min", _))
        ));
        assert!(matches!(
            check(|c| c.algorithms = Algorithms {
                anti_kt: false,
                kt: false,
                cambridge_aachen: false
            }),
            Err(ConfigError::NoAlgorithm)
        ));
        assert!(check(|c| c.pileup_mu = 0.).is_ok());
    }

    #[test]
    fn algorithm_selection() {
        let algorithms: Algorithms = ["C/A", "anti-kt", "C/A"]
            .into_iter()
            .map(|s| s.parse::<JetAlgorithm>())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            algorithms.selected(),
            [JetAlgorithm::AntiKt, JetAlgorithm::CambridgeAachen]
        );
        // the order of selection does not matter
        let algorithms: Algorithms = [
            JetAlgorithm::CambridgeAachen,
            JetAlgorithm::AntiKt,
            JetAlgorithm::Kt,
        ]
        .into_iter()
        .collect();
        assert_eq!(
            algorithms.selected(),
            [
                JetAlgorithm::Kt,
                JetAlgorithm::AntiKt,
                JetAlgorithm::CambridgeAachen
            ]
        );
        let none: Algorithms = std::iter::empty().collect();
        assert!(none.selected().is_empty());
    }

    #[test]
    fn classifier() {
        use crate::event::Status;
        let classifier = Config::default().classifier();
        for id in [6, -24, 23, 25] {
            assert_eq!(
                classifier.classify(ParticleID::new(id), -62),
                Status::Resonance
            );
        }
        assert_eq!(
            classifier.classify(ParticleID::new(5), -62),
            Status::Intermediate
        );
        assert_eq!(classifier.classify(ParticleID::new(24), 1), Status::Final);
    }
}
