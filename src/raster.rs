use std::f64::consts::PI;

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cluster::Jet,
    compose::{Input, InputKind},
};

/// Uniform binning of a one-dimensional range
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct Axis {
    nbins: usize,
    min: f64,
    max: f64,
}

#[derive(Debug, Copy, Clone, Error, PartialEq)]
pub enum AxisError {
    #[error("Axis needs at least one bin")]
    NoBins,
    #[error("Empty axis range [{0}, {1})")]
    EmptyRange(f64, f64),
}

impl Axis {
    pub fn new(nbins: usize, min: f64, max: f64) -> Result<Self, AxisError> {
        if nbins == 0 {
            return Err(AxisError::NoBins);
        }
        if !(min < max) {
            return Err(AxisError::EmptyRange(min, max));
        }
        Ok(Self { nbins, min, max })
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.nbins as f64
    }

    /// Lower edge of bin `i`
    pub fn bin_low_edge(&self, i: usize) -> f64 {
        self.min + i as f64 * self.bin_width()
    }

    pub fn bin_center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.bin_width()
    }

    /// Index of the bin containing `x`
    ///
    /// Bins include their lower edge but not their upper edge.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.min && x < self.max) {
            return None;
        }
        let bin = ((x - self.min) / self.bin_width()) as usize;
        // guard against rounding just below the upper edge
        Some(bin.min(self.nbins - 1))
    }
}

/// Display range of the colour scale
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct ZRange {
    pub min: f64,
    pub max: f64,
}

/// Two-dimensional rapidity-azimuth histogram of jet transverse momenta
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    y: Axis,
    phi: Axis,
    content: Vec<f64>,
}

impl Raster {
    pub fn new(y: Axis, phi: Axis) -> Self {
        Self {
            y,
            phi,
            content: vec![0.; y.nbins() * phi.nbins()],
        }
    }

    /// Rapidity range [-y_max, y_max), full azimuthal range [-π, π)
    pub fn with_bins(ny: usize, nphi: usize, y_max: f64) -> Result<Self, AxisError> {
        let y = Axis::new(ny, -y_max, y_max)?;
        let phi = Axis::new(nphi, -PI, PI)?;
        Ok(Self::new(y, phi))
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    pub fn phi_axis(&self) -> &Axis {
        &self.phi
    }

    pub fn nbins(&self) -> usize {
        self.content.len()
    }

    fn idx(&self, iy: usize, iphi: usize) -> usize {
        debug_assert!(iy < self.y.nbins() && iphi < self.phi.nbins());
        iy * self.phi.nbins() + iphi
    }

    /// Set all bins to zero
    pub fn reset(&mut self) {
        self.content.iter_mut().for_each(|c| *c = 0.);
    }

    pub fn get(&self, iy: usize, iphi: usize) -> f64 {
        self.content[self.idx(iy, iphi)]
    }

    pub fn set(&mut self, iy: usize, iphi: usize, value: f64) {
        let idx = self.idx(iy, iphi);
        self.content[idx] = value;
    }

    /// Add `weight` to the bin with the given indices
    pub fn add(&mut self, iy: usize, iphi: usize, weight: f64) {
        let idx = self.idx(iy, iphi);
        self.content[idx] += weight;
    }

    /// Add `weight` to the bin containing the point (`y`, `phi`)
    ///
    /// Returns `false` if the point lies outside the histogram.
    pub fn fill(&mut self, y: f64, phi: f64, weight: f64) -> bool {
        match (self.y.find_bin(y), self.phi.find_bin(phi)) {
            (Some(iy), Some(iphi)) => {
                self.add(iy, iphi, weight);
                true
            }
            _ => false,
        }
    }

    /// Largest bin content, zero for an empty histogram
    pub fn max(&self) -> f64 {
        self.content.iter().copied().fold(0., f64::max)
    }

    /// Iterate over all bins with non-zero content
    ///
    /// Items are `((iy, iphi), content)`.
    pub fn nonzero(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        let nphi = self.phi.nbins();
        self.content
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.)
            .map(move |(idx, c)| ((idx / nphi, idx % nphi), *c))
    }

    /// Colour scale range for drawing
    ///
    /// Spans from a quarter of the jet transverse momentum threshold up to
    /// four times the largest bin content.
    pub fn z_range(&self, threshold: f64) -> ZRange {
        ZRange {
            min: threshold / 4.,
            max: 4. * self.max(),
        }
    }
}

/// Fill the energy flow of the given jets into a raster
///
/// The raster is reset first. Each bin whose ghost is a constituent of one
/// of the `jets` is set to the transverse momentum of that jet. The jet
/// constituents refer to positions in `inputs`.
pub fn fill_energy_flow(raster: &mut Raster, jets: &[Jet], inputs: &[Input]) {
    raster.reset();
    for jet in jets {
        let pt = jet.pt().raw();
        let mut nghosts = 0;
        for &c in &jet.constituents {
            if let InputKind::Ghost { bin: (iy, iphi) } = inputs[c].kind {
                raster.set(iy, iphi, pt);
                nghosts += 1;
            }
        }
        trace!("Jet with pt = {pt} covers {nghosts} bins");
    }
}
