use std::fmt::Display;

use derive_builder::Builder;
use log::{debug, info};
use rand::Rng;
use rand_distr::{Distribution, Poisson, PoissonError};
use thiserror::Error;

use crate::{
    event::{Event, Particle},
    four_vector::FourVector,
    ghost::GhostGrid,
};

/// Absolute generator status code of the resonances we are interested in
pub const RESONANCE_STATUS: i32 = 62;

/// Number of resonances required in each hard-scatter event
pub const NUM_RESONANCES: usize = 2;

/// Origin of a clustering input
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Position in [WorkingEvent::hard_scatter]
    HardScatter(usize),
    /// Position in [WorkingEvent::pileup]
    Pileup(usize),
    /// Ghost for the raster bin with the given rapidity and azimuth indices
    Ghost { bin: (usize, usize) },
}

/// Clustering input
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub p: FourVector,
    pub kind: InputKind,
}

impl Input {
    pub fn is_ghost(&self) -> bool {
        matches!(self.kind, InputKind::Ghost { .. })
    }
}

/// A resonance together with its immediate decay products
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resonance {
    pub particle: Particle,
    pub daughters: Option<[Particle; 2]>,
}

/// Hard scatter event overlaid with pileup and ghosts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkingEvent {
    /// ID of the hard-scatter event
    pub id: i32,
    /// Final-state particles from the hard scattering
    pub hard_scatter: Vec<Particle>,
    /// Final-state particles from all pileup interactions
    pub pileup: Vec<Particle>,
    pub resonances: Vec<Resonance>,
    /// Input for jet clustering
    pub inputs: Vec<Input>,
    /// Number of sampled pileup interactions
    pub pileup_requested: usize,
    /// Number of pileup interactions actually overlaid
    pub pileup_accepted: usize,
}

impl WorkingEvent {
    /// Momenta of all clustering inputs
    pub fn momenta(&self) -> Vec<FourVector> {
        self.inputs.iter().map(|i| i.p).collect()
    }
}

/// Why no working event was composed
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("Failed to obtain hard-scatter event: {0}")]
    HardScatterFailed(String),
    #[error("Found {0} resonances instead of two")]
    ResonanceCount(usize),
}

/// Outcome of composing one working event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Composition {
    Composed(WorkingEvent),
    Skipped(SkipReason),
    /// The hard-scatter source has no more events
    Exhausted,
}

/// Draws the number of pileup interactions per event
#[derive(Copy, Clone, Debug, Default)]
pub struct PileupSampler {
    dist: Option<Poisson<f64>>,
}

impl PileupSampler {
    /// Poisson distribution with mean `mu`
    ///
    /// For `mu` = 0 no pileup is ever added.
    pub fn new(mu: f64) -> Result<Self, PoissonError> {
        let dist = if mu == 0. {
            None
        } else {
            Some(Poisson::new(mu)?)
        };
        Ok(Self { dist })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self.dist {
            Some(dist) => dist.sample(rng) as usize,
            None => 0,
        }
    }
}

/// Combines hard-scatter events, pileup, and ghosts into clustering input
#[derive(Builder, Clone, Debug)]
pub struct Composer {
    ghosts: GhostGrid,
    #[builder(default)]
    pileup: PileupSampler,
    #[builder(default = "RESONANCE_STATUS")]
    resonance_status: i32,
}

impl Composer {
    /// Compose the next working event
    ///
    /// Takes one event from `hard_scatter`. Unusable pileup events are
    /// skipped; the numbers of requested and overlaid pileup interactions
    /// are recorded in the result.
    pub fn compose<H, P, E1, E2, R>(
        &self,
        hard_scatter: &mut H,
        pileup: &mut P,
        rng: &mut R,
    ) -> Composition
    where
        H: Iterator<Item = Result<Event, E1>>,
        P: Iterator<Item = Result<Event, E2>>,
        E1: Display,
        E2: Display,
        R: Rng + ?Sized,
    {
        let event = match hard_scatter.next() {
            Some(Ok(event)) => event,
            Some(Err(err)) => {
                return Composition::Skipped(SkipReason::HardScatterFailed(
                    err.to_string(),
                ))
            }
            None => return Composition::Exhausted,
        };

        let mut res = WorkingEvent {
            id: event.id(),
            ..Default::default()
        };
        for particle in event.particles() {
            if particle.is_resonance()
                && particle.status_code.abs() == self.resonance_status
            {
                let daughters = event
                    .daughters(particle)
                    .map(|[d1, d2]| [d1.clone(), d2.clone()]);
                res.resonances.push(Resonance {
                    particle: particle.clone(),
                    daughters,
                });
            }
            if particle.is_final() {
                res.inputs.push(Input {
                    p: particle.p,
                    kind: InputKind::HardScatter(res.hard_scatter.len()),
                });
                res.hard_scatter.push(particle.clone());
            }
        }
        if res.resonances.len() != NUM_RESONANCES {
            return Composition::Skipped(SkipReason::ResonanceCount(
                res.resonances.len(),
            ));
        }

        res.inputs.reserve(self.ghosts.len());
        res.inputs.extend(self.ghosts.iter().map(|g| Input {
            p: g.p,
            kind: InputKind::Ghost { bin: g.bin },
        }));

        let npileup = self.pileup.sample(rng);
        info!("Overlaying particles from {npileup} pileup interactions");
        res.pileup_requested = npileup;
        for _ in 0..npileup {
            match pileup.next() {
                Some(Ok(event)) => {
                    for particle in event.into_particles() {
                        if !particle.is_final() {
                            continue;
                        }
                        res.inputs.push(Input {
                            p: particle.p,
                            kind: InputKind::Pileup(res.pileup.len()),
                        });
                        res.pileup.push(particle);
                    }
                    res.pileup_accepted += 1;
                }
                Some(Err(err)) => debug!("Skipping pileup event: {err}"),
                None => debug!("No pileup event available"),
            }
        }
        if res.pileup_accepted != res.pileup_requested {
            debug!(
                "Overlaid {} out of {} pileup interactions",
                res.pileup_accepted, res.pileup_requested
            );
        }
        Composition::Composed(res)
    }
}
