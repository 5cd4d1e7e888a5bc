//! The event display loop
//!
//! For each hard-scatter event, [EventDisplay::run] performs the
//! following steps:
//!
//! 1. Compose a working event from the hard scattering, a Poisson-distributed
//!    number of pileup interactions, and a ghost grid with one ghost per
//!    raster bin. Events without exactly two resonances of interest are
//!    skipped.
//! 2. Cluster the working event with each configured jet algorithm.
//! 3. Fill the transverse momentum of each jet into the raster bins of its
//!    ghost constituents.
//! 4. Draw one page per jet algorithm.
use std::fmt::Display;

use log::{debug, info};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use thiserror::Error;

use crate::{
    cluster::{cluster, JetConfiguration},
    compose::{
        Composer, ComposerBuilder, ComposerBuilderError, Composition, PileupSampler,
    },
    config::{Config, ConfigError},
    event::Event,
    ghost::GhostGrid,
    raster::{fill_energy_flow, Raster},
    render::Page,
    traits::RenderPage,
};

/// Interval between progress messages
pub const PROGRESS_INTERVAL: usize = 100;

/// Construct an [EventDisplay]
#[derive(Clone, Debug)]
pub struct EventDisplayBuilder<H, P, R> {
    /// Source of hard-scatter events
    pub hard_scatter: H,
    /// Source of pileup events
    pub pileup: P,
    /// Page output
    pub renderer: R,
    pub config: Config,
}

impl<H, P, R> EventDisplayBuilder<H, P, R> {
    /// Validate the settings and set up the event display
    pub fn build(self) -> Result<EventDisplay<H, P, R>, BuildError> {
        self.config.validate()?;
        let raster = self.config.raster().map_err(ConfigError::from)?;
        let mu = self.config.pileup_mu;
        let pileup_sampler =
            PileupSampler::new(mu).map_err(|_| ConfigError::PileupMu(mu))?;
        let composer = ComposerBuilder::default()
            .ghosts(GhostGrid::new(&raster))
            .pileup(pileup_sampler)
            .resonance_status(self.config.resonances.status)
            .build()?;
        let jet_configs = self.config.jet_configurations();
        let rng = Xoshiro256Plus::seed_from_u64(self.config.seed);
        Ok(EventDisplay {
            hard_scatter: self.hard_scatter,
            pileup: self.pileup,
            renderer: self.renderer,
            composer,
            jet_configs,
            raster,
            rng,
            config: self.config,
        })
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Failed to set up event composition: {0}")]
    ComposerError(#[from] ComposerBuilderError),
}

/// Statistics of an event display run
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Summary {
    /// Number of hard-scatter events requested
    pub events: usize,
    /// Number of skipped hard-scatter events
    pub skipped: usize,
    /// Number of working events that were drawn
    pub composed: usize,
    /// Number of output pages
    pub pages: usize,
    /// Number of sampled pileup interactions
    pub pileup_requested: usize,
    /// Number of pileup interactions actually overlaid
    pub pileup_accepted: usize,
}

#[derive(Debug, Error)]
pub enum DisplayError<E> {
    #[error("Failed to render page: {0}")]
    Render(E),
}

/// Draws energy-flow event displays
#[derive(Clone, Debug)]
pub struct EventDisplay<H, P, R> {
    hard_scatter: H,
    pileup: P,
    renderer: R,
    composer: Composer,
    jet_configs: Vec<JetConfiguration>,
    raster: Raster,
    rng: Xoshiro256Plus,
    config: Config,
}

impl<H, P, R, E1, E2> EventDisplay<H, P, R>
where
    H: Iterator<Item = Result<Event, E1>>,
    P: Iterator<Item = Result<Event, E2>>,
    R: RenderPage,
    E1: Display,
    E2: Display,
{
    /// Draw event displays until either the configured number of events is
    /// reached or the hard-scatter source is exhausted
    pub fn run(&mut self) -> Result<Summary, DisplayError<R::Error>> {
        use DisplayError::*;

        let mut summary = Summary::default();
        loop {
            if Some(summary.events) == self.config.events {
                break;
            }
            if summary.events % PROGRESS_INTERVAL == 0 {
                info!("Working on event {}", summary.events);
            }
            let composition = self.composer.compose(
                &mut self.hard_scatter,
                &mut self.pileup,
                &mut self.rng,
            );
            let event = match composition {
                Composition::Composed(event) => event,
                Composition::Skipped(reason) => {
                    debug!("Skipping event {}: {reason}", summary.events);
                    summary.events += 1;
                    summary.skipped += 1;
                    continue;
                }
                Composition::Exhausted => {
                    info!("No more hard-scatter events");
                    break;
                }
            };
            summary.events += 1;
            summary.composed += 1;
            summary.pileup_requested += event.pileup_requested;
            summary.pileup_accepted += event.pileup_accepted;

            let momenta = event.momenta();
            for jet_config in &self.jet_configs {
                let jets = cluster(&momenta, &jet_config.jet_def);
                debug!("{}: {} jets", jet_config.label, jets.len());
                fill_energy_flow(&mut self.raster, &jets, &event.inputs);
                let page = Page {
                    number: summary.pages,
                    event: &event,
                    jet_config,
                    jets: &jets,
                    raster: &self.raster,
                    z_range: self.raster.z_range(jet_config.jet_def.min_pt),
                    legend: summary.pages == 0,
                };
                self.renderer.render(&page).map_err(Render)?;
                summary.pages += 1;
            }
        }
        self.renderer.finish().map_err(Render)?;
        info!(
            "Produced {} pages from {} out of {} events",
            summary.pages, summary.composed, summary.events
        );
        if summary.pileup_accepted != summary.pileup_requested {
            info!(
                "Overlaid {} out of {} pileup interactions",
                summary.pileup_accepted, summary.pileup_requested
            );
        }
        Ok(summary)
    }
}

impl<H, P, R> EventDisplay<H, P, R> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Release the event sources and the renderer
    pub fn into_parts(self) -> (H, P, R) {
        (self.hard_scatter, self.pileup, self.renderer)
    }
}
