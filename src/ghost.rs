use itertools::iproduct;

use crate::{four_vector::FourVector, raster::Raster};

/// Transverse momentum of ghost particles
pub const GHOST_PT: f64 = 1e-100;

/// Upper bound on the transverse momentum of ghosts
///
/// Every physical particle is far harder than this.
pub const GHOST_PT_MAX: f64 = 1e-50;

/// A particle with negligible momentum marking a raster bin
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ghost {
    /// Rapidity and azimuth bin indices
    pub bin: (usize, usize),
    pub p: FourVector,
}

/// One massless ghost at the centre of each raster bin
#[derive(Clone, Debug, PartialEq)]
pub struct GhostGrid {
    ghosts: Vec<Ghost>,
}

impl GhostGrid {
    /// Ghosts for the bins of the given raster
    pub fn new(raster: &Raster) -> Self {
        let (y_axis, phi_axis) = (raster.y_axis(), raster.phi_axis());
        let ghosts = iproduct!(0..y_axis.nbins(), 0..phi_axis.nbins())
            .map(|(iy, iphi)| {
                let y = y_axis.bin_center(iy);
                let phi = phi_axis.bin_center(iphi);
                Ghost {
                    bin: (iy, iphi),
                    p: FourVector::from_pt_y_phi_m(GHOST_PT, y, phi, 0.),
                }
            })
            .collect();
        Self { ghosts }
    }

    pub fn len(&self) -> usize {
        self.ghosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ghosts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ghost> {
        self.ghosts.iter()
    }
}

impl<'a> IntoIterator for &'a GhostGrid {
    type Item = &'a Ghost;
    type IntoIter = std::slice::Iter<'a, Ghost>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
