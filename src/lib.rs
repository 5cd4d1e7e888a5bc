//! `jetflow` draws energy-flow event displays comparing jet clustering
//! algorithms.
//!
//! A hard-scatter event is overlaid with a Poisson-distributed number of
//! pileup events and a dense grid of "ghost" particles with negligible
//! momentum. The combined event is clustered with several jet algorithms.
//! Since every ghost ends up in exactly one jet, the ghosts assigned to
//! a jet trace out the area it covers in the rapidity-azimuth plane. For
//! each algorithm we fill a raster with the transverse momentum of the jet
//! covering each bin and draw one page per event and algorithm.
//!
//! # How to use
//!
//! The `jetflow` binary reads HepMC2 event files. For use as a library,
//! set up an [EventDisplay](display::EventDisplay) with
//! [EventDisplayBuilder](display::EventDisplayBuilder).
//!
//! ## Most relevant modules
//!
//! - [prelude] exports a list of the most relevant classes and objects
//! - [display] contains the main class and lists the steps that are performed
//! - [compose] merges hard-scatter, pileup, and ghost particles
//! - [cluster] for jet clustering
//! - [raster] for the energy-flow histogram
//! - [render] for drawing pages
//!

/// Jet clustering
pub mod cluster;
/// Event composition
pub mod compose;
/// Settings
pub mod config;
pub mod display;
/// Scattering event class
pub mod event;
/// Thin wrapper around [std::fs::File]
pub mod file;
/// Four-vector class
pub mod four_vector;
/// Ghost particles
pub mod ghost;
/// HepMC2 interface
pub mod hepmc2;
/// Most important exports
pub mod prelude;
/// Energy-flow histogram
pub mod raster;
/// Event readers
pub mod reader;
/// Page output
pub mod render;
/// Common traits
pub mod traits;

use lazy_static::lazy_static;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
lazy_static! {
    pub static ref VERSION_MAJOR: u32 =
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap();
    pub static ref VERSION_MINOR: u32 =
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
    pub static ref VERSION_PATCH: u32 =
        env!("CARGO_PKG_VERSION_PATCH").parse().unwrap();
}
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
