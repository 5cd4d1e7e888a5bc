use std::f64::consts::PI;

use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};

/// Rapidity assigned to momenta along the beam axis
pub const MAX_RAP: f64 = 1e5;

/// A basic four-vector
///
/// The zero component is the energy/time component. The remainder are
/// the spatial components
#[derive(
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Clone,
    Copy,
    Default,
)]
pub struct FourVector {
    pt2: N64,
    p: [N64; 4],
}

impl FourVector {
    /// Construct a new four-vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a four-vector from transverse momentum, rapidity,
    /// azimuthal angle, and mass
    pub fn from_pt_y_phi_m(pt: f64, y: f64, phi: f64, m: f64) -> Self {
        let mt = (pt * pt + m * m).sqrt();
        [
            n64(mt * y.cosh()),
            n64(pt * phi.cos()),
            n64(pt * phi.sin()),
            n64(mt * y.sinh()),
        ]
        .into()
    }

    /// The energy
    pub fn e(&self) -> N64 {
        self.p[0]
    }

    pub fn px(&self) -> N64 {
        self.p[1]
    }

    pub fn py(&self) -> N64 {
        self.p[2]
    }

    pub fn pz(&self) -> N64 {
        self.p[3]
    }

    /// The spatial norm \sqrt{\sum v_i^2} with i = 1,2,3
    pub fn spatial_norm(&self) -> N64 {
        self.spatial_norm_sq().sqrt()
    }

    /// The square \sum v_i^2 with i = 1,2,3 of the spatial norm
    pub fn spatial_norm_sq(&self) -> N64 {
        self.p.iter().skip(1).map(|e| *e * *e).sum()
    }

    /// The scalar transverse momentum
    pub fn pt(&self) -> N64 {
        self.pt2.sqrt()
    }

    /// The square of the transverse momentum
    pub fn pt2(&self) -> N64 {
        self.pt2
    }

    /// The rapidity
    ///
    /// Massless momenta along the beam axis get a rapidity of
    /// ±([MAX_RAP] + |pz|).
    pub fn rap(&self) -> N64 {
        let pz = self.pz();
        if self.pt2 == 0. && self.e() == pz.abs() {
            let max_rap = n64(MAX_RAP) + pz.abs();
            return if pz >= 0. { max_rap } else { -max_rap };
        }
        let m2 = std::cmp::max(self.m_sq(), n64(0.));
        let e_plus_pz = self.e() + pz.abs();
        let rap = (n64(0.5) * ((self.pt2 + m2) / (e_plus_pz * e_plus_pz)).ln()).raw();
        if pz > 0. {
            n64(-rap)
        } else {
            n64(rap)
        }
    }

    /// The azimuthal angle in the range (-π, π]
    pub fn phi(&self) -> N64 {
        self.py().atan2(self.px())
    }

    const fn len() -> usize {
        4
    }

    fn update_pt2(&mut self) {
        self.pt2 = self.p[1] * self.p[1] + self.p[2] * self.p[2];
    }

    /// The invariant mass \sqrt{v_0^2 - \sum v_i^2} with i = 1,2,3
    ///
    /// For spacelike vectors this is the square root of the absolute value.
    pub fn m(&self) -> N64 {
        self.m_sq().abs().sqrt()
    }

    /// The invariant mass square v_0^2 - \sum v_i^2 with i = 1,2,3
    pub fn m_sq(&self) -> N64 {
        self.p[0] * self.p[0] - self.spatial_norm_sq()
    }

    /// Azimuthal distance in the range [0, π]
    pub fn delta_phi(&self, other: &FourVector) -> N64 {
        n64(delta_phi(self.phi().raw(), other.phi().raw()))
    }

    /// Squared distance in the rapidity-azimuth plane
    pub fn delta_r2(&self, other: &FourVector) -> N64 {
        let dy = self.rap() - other.rap();
        let dphi = self.delta_phi(other);
        dy * dy + dphi * dphi
    }
}

/// Distance between two azimuthal angles, taking periodicity into account
pub(crate) fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let dphi = (phi1 - phi2).abs() % (2. * PI);
    if dphi > PI {
        2. * PI - dphi
    } else {
        dphi
    }
}

impl std::convert::From<[N64; 4]> for FourVector {
    fn from(p: [N64; 4]) -> FourVector {
        let mut res = FourVector {
            p,
            pt2: std::default::Default::default(),
        };
        res.update_pt2();
        res
    }
}

impl std::convert::From<[f64; 4]> for FourVector {
    fn from(p: [f64; 4]) -> FourVector {
        p.map(n64).into()
    }
}

impl std::ops::Index<usize> for FourVector {
    type Output = N64;

    fn index(&self, i: usize) -> &Self::Output {
        &self.p[i]
    }
}

impl std::ops::AddAssign for FourVector {
    fn add_assign(&mut self, rhs: FourVector) {
        for i in 0..Self::len() {
            self.p[i] += rhs[i]
        }
        self.update_pt2();
    }
}

impl std::ops::SubAssign for FourVector {
    fn sub_assign(&mut self, rhs: FourVector) {
        for i in 0..Self::len() {
            self.p[i] -= rhs[i]
        }
        self.update_pt2();
    }
}

impl std::ops::Add for FourVector {
    type Output = Self;

    fn add(mut self, rhs: FourVector) -> Self::Output {
        self += rhs;
        self
    }
}

impl std::ops::Sub for FourVector {
    type Output = Self;

    fn sub(mut self, rhs: FourVector) -> Self::Output {
        self -= rhs;
        self
    }
}
