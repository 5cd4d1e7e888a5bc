use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    f64::consts::PI,
    str::FromStr,
};

use log::trace;
use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::four_vector::{delta_phi, FourVector};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown jet algorithm '{0}', expected one of 'anti-kt', 'kt', 'Cambridge-Aachen'")]
pub struct UnknownJetAlgorithm(String);

impl FromStr for JetAlgorithm {
    type Err = UnknownJetAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | '/' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalised.as_str() {
            "antikt" | "akt" => Ok(Self::AntiKt),
            "kt" => Ok(Self::Kt),
            "cambridgeaachen" | "ca" => Ok(Self::CambridgeAachen),
            _ => Err(UnknownJetAlgorithm(s.to_owned())),
        }
    }
}

/// Jet clustering algorithms
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum JetAlgorithm {
    /// The [anti-kt](https://arxiv.org/abs/0802.1189) algorithm
    AntiKt,
    /// The [Cambridge](https://arxiv.org/abs/hep-ph/9707323)/[Aachen](https://arxiv.org/abs/hep-ph/9907280) algorithm
    CambridgeAachen,
    /// The [kt](https://arxiv.org/abs/hep-ph/9305266) algorithm
    Kt,
}

impl JetAlgorithm {
    /// Name for display
    pub fn name(&self) -> &'static str {
        match self {
            Self::AntiKt => "Anti-kt",
            Self::CambridgeAachen => "Cambridge-Aachen",
            Self::Kt => "kt",
        }
    }

    /// Weight of a pseudojet in the distance measure,
    /// i.e. its squared transverse momentum raised to the power
    /// 1 (kt), 0 (Cambridge/Aachen), or -1 (anti-kt)
    fn weight(&self, pt2: f64) -> f64 {
        match self {
            Self::AntiKt => 1. / pt2.max(f64::MIN_POSITIVE),
            Self::CambridgeAachen => 1.,
            Self::Kt => pt2,
        }
    }
}

/// How to combine the momenta of two pseudojets
#[derive(Deserialize, Serialize, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum RecombinationScheme {
    /// Sum of four-momenta
    #[default]
    E,
    /// Massless, with transverse momentum the scalar sum and rapidity and
    /// azimuth the transverse-momentum-weighted averages
    Pt,
}

impl RecombinationScheme {
    fn combine(&self, p1: &FourVector, p2: &FourVector) -> FourVector {
        match self {
            Self::E => *p1 + *p2,
            Self::Pt => {
                let (pt1, pt2) = (p1.pt().raw(), p2.pt().raw());
                let pt = pt1 + pt2;
                if pt == 0. {
                    return *p1 + *p2;
                }
                let y = (pt1 * p1.rap().raw() + pt2 * p2.rap().raw()) / pt;
                let phi1 = p1.phi().raw();
                let mut phi2 = p2.phi().raw();
                if phi2 - phi1 > PI {
                    phi2 -= 2. * PI;
                } else if phi1 - phi2 > PI {
                    phi2 += 2. * PI;
                }
                let phi = (pt1 * phi1 + pt2 * phi2) / pt;
                FourVector::from_pt_y_phi_m(pt, y, phi, 0.)
            }
        }
    }
}

/// Definition of a jet
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq)]
pub struct JetDefinition {
    /// Jet algorithm
    pub algorithm: JetAlgorithm,
    /// Jet radius parameter
    pub radius: f64,
    /// Minimum jet transverse momentum
    pub min_pt: f64,
    /// Recombination scheme
    #[serde(default)]
    pub recombination: RecombinationScheme,
}

/// A jet definition together with a label for display
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct JetConfiguration {
    pub label: String,
    pub jet_def: JetDefinition,
}

impl JetConfiguration {
    /// Configuration with the default label "<algorithm> jets, R = <radius>"
    pub fn new(jet_def: JetDefinition) -> Self {
        let label = format!("{} jets, R = {}", jet_def.algorithm.name(), jet_def.radius);
        Self { label, jet_def }
    }
}

/// A clustered jet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jet {
    pub p: FourVector,
    /// Positions of the jet constituents in the clustering input
    pub constituents: Vec<usize>,
}

impl Jet {
    pub fn pt(&self) -> N64 {
        self.p.pt()
    }
}

// pseudojet during clustering
#[derive(Clone, Debug)]
struct PseudoJet {
    p: FourVector,
    rap: f64,
    phi: f64,
    weight: f64,
    tile: usize,
    active: bool,
    constituents: Vec<usize>,
    // nearest neighbour among the active pseudojets in the surrounding
    // tiles and squared distance
    nn: Option<usize>,
    nn_dist: f64,
}

impl PseudoJet {
    fn new(
        p: FourVector,
        constituents: Vec<usize>,
        algorithm: JetAlgorithm,
        tiling: &Tiling,
    ) -> Self {
        let rap = p.rap().raw();
        let phi = p.phi().raw();
        Self {
            rap,
            phi,
            weight: algorithm.weight(p.pt2().raw()),
            tile: tiling.tile(rap, phi),
            active: true,
            p,
            constituents,
            nn: None,
            nn_dist: f64::MAX,
        }
    }

    fn delta_r2(&self, other: &PseudoJet) -> f64 {
        let dy = self.rap - other.rap;
        let dphi = delta_phi(self.phi, other.phi);
        dy * dy + dphi * dphi
    }

    // clustering distance, in units of R^{-2}
    //
    // This is the minimum of the distance to the beam and the distance to
    // the nearest neighbour. Since the weight of the nearest neighbour
    // can be larger, it may overestimate the true pair distance. However,
    // for the pair with the globally smallest distance the estimate from
    // the member with the smaller weight is always exact.
    fn dist(&self, r2: f64) -> f64 {
        self.weight * self.nn_dist.min(r2)
    }
}

/// Pseudojets beyond this absolute rapidity share the outermost tiles
const TILING_MAX_RAP: f64 = 10.;
/// Maximum number of tiles along each axis
const MAX_TILES: usize = 256;

// Partition of the rapidity-azimuth plane into tiles that are at least as
// wide as the jet radius in both directions. Two pseudojets closer than
// the radius are always in the same or in adjacent tiles.
#[derive(Clone, Debug)]
struct Tiling {
    rap_min: f64,
    rap_width: f64,
    n_rap: usize,
    phi_width: f64,
    n_phi: usize,
    // for each tile the distinct tiles in its neighbourhood, itself included
    neighbours: Vec<Vec<usize>>,
}

impl Tiling {
    fn new(inputs: &[FourVector], radius: f64) -> Self {
        let (rap_min, rap_max) = inputs
            .iter()
            .map(|p| p.rap().raw().clamp(-TILING_MAX_RAP, TILING_MAX_RAP))
            .fold((TILING_MAX_RAP, -TILING_MAX_RAP), |(min, max), rap| {
                (min.min(rap), max.max(rap))
            });
        let rap_span = (rap_max - rap_min).max(0.);
        let rap_width = radius.max(rap_span / MAX_TILES as f64);
        let n_rap = (rap_span / rap_width) as usize + 1;
        let n_phi = ((2. * PI / radius) as usize).clamp(1, MAX_TILES);
        let phi_width = 2. * PI / n_phi as f64;

        let mut neighbours = Vec::with_capacity(n_rap * n_phi);
        for irap in 0..n_rap {
            for iphi in 0..n_phi {
                let raps = irap.saturating_sub(1)..=(irap + 1).min(n_rap - 1);
                let mut tiles: Vec<_> = raps
                    .flat_map(|nrap| {
                        [iphi + n_phi - 1, iphi, iphi + 1]
                            .map(|nphi| nrap * n_phi + nphi % n_phi)
                    })
                    .collect();
                tiles.sort_unstable();
                tiles.dedup();
                neighbours.push(tiles);
            }
        }
        Self {
            rap_min,
            rap_width,
            n_rap,
            phi_width,
            n_phi,
            neighbours,
        }
    }

    fn ntiles(&self) -> usize {
        self.neighbours.len()
    }

    fn tile(&self, rap: f64, phi: f64) -> usize {
        let irap = if rap <= self.rap_min {
            0
        } else {
            (((rap - self.rap_min) / self.rap_width) as usize).min(self.n_rap - 1)
        };
        let phi = (phi + PI).rem_euclid(2. * PI);
        let iphi = ((phi / self.phi_width) as usize).min(self.n_phi - 1);
        irap * self.n_phi + iphi
    }

    /// The tile itself and all adjacent tiles
    fn neighbourhood(&self, tile: usize) -> &[usize] {
        &self.neighbours[tile]
    }
}

// find the nearest neighbour of the pseudojet at `slot` in the surrounding tiles
fn update_nn(jets: &mut [PseudoJet], tiles: &[Vec<usize>], tiling: &Tiling, slot: usize) {
    let mut nn = None;
    let mut nn_dist = f64::MAX;
    for &tile in tiling.neighbourhood(jets[slot].tile) {
        for &other in &tiles[tile] {
            if other == slot {
                continue;
            }
            let dist = jets[slot].delta_r2(&jets[other]);
            if dist < nn_dist {
                nn_dist = dist;
                nn = Some(other);
            }
        }
    }
    jets[slot].nn = nn;
    jets[slot].nn_dist = nn_dist;
}

fn deactivate(jets: &mut [PseudoJet], tiles: &mut [Vec<usize>], slot: usize) {
    jets[slot].active = false;
    let members = &mut tiles[jets[slot].tile];
    if let Some(pos) = members.iter().position(|&s| s == slot) {
        members.swap_remove(pos);
    }
}

/// Cluster `inputs` into inclusive jets
///
/// This is a sequential recombination in the spirit of FastJet's tiled
/// strategy: nearest neighbours are only searched among the adjacent
/// tiles of size R × R in the rapidity-azimuth plane, and candidate
/// distances are kept in a priority queue.
///
/// Every input ends up in exactly one jet before the transverse momentum
/// cut. Only jets with transverse momentum above `jet_def.min_pt` are
/// returned, sorted by descending transverse momentum.
pub fn cluster(inputs: &[FourVector], jet_def: &JetDefinition) -> Vec<Jet> {
    if inputs.is_empty() {
        return Vec::new();
    }
    let algorithm = jet_def.algorithm;
    let recombination = jet_def.recombination;
    let r2 = jet_def.radius * jet_def.radius;
    let tiling = Tiling::new(inputs, jet_def.radius);
    trace!(
        "Clustering {} inputs on {} tiles",
        inputs.len(),
        tiling.ntiles()
    );

    let mut jets: Vec<_> = inputs
        .iter()
        .enumerate()
        .map(|(n, p)| PseudoJet::new(*p, vec![n], algorithm, &tiling))
        .collect();
    let mut tiles = vec![Vec::new(); tiling.ntiles()];
    for (slot, jet) in jets.iter().enumerate() {
        tiles[jet.tile].push(slot);
    }
    // entries are only valid while they match the current pseudojet distance
    let mut queue = BinaryHeap::with_capacity(jets.len());
    for slot in 0..jets.len() {
        update_nn(&mut jets, &tiles, &tiling, slot);
        queue.push(Reverse((n64(jets[slot].dist(r2)), slot)));
    }

    let mut res = Vec::new();
    while let Some(Reverse((dist, slot))) = queue.pop() {
        if !jets[slot].active || jets[slot].dist(r2) != dist.raw() {
            continue;
        }
        let partner = jets[slot].nn.filter(|_| jets[slot].nn_dist < r2);
        match partner {
            Some(partner) => {
                let p = recombination.combine(&jets[slot].p, &jets[partner].p);
                let mut constituents = std::mem::take(&mut jets[slot].constituents);
                let mut other = std::mem::take(&mut jets[partner].constituents);
                if other.len() > constituents.len() {
                    std::mem::swap(&mut constituents, &mut other);
                }
                constituents.append(&mut other);
                deactivate(&mut jets, &mut tiles, slot);
                deactivate(&mut jets, &mut tiles, partner);

                let merged = jets.len();
                jets.push(PseudoJet::new(p, constituents, algorithm, &tiling));
                tiles[jets[merged].tile].push(merged);
                update_nn(&mut jets, &tiles, &tiling, merged);
                queue.push(Reverse((n64(jets[merged].dist(r2)), merged)));

                let mut affected: Vec<usize> = [slot, partner, merged]
                    .iter()
                    .flat_map(|&s| tiling.neighbourhood(jets[s].tile).iter().copied())
                    .collect();
                affected.sort_unstable();
                affected.dedup();
                for tile in affected {
                    for &other in &tiles[tile] {
                        if other == merged {
                            continue;
                        }
                        let nn = jets[other].nn;
                        if nn == Some(slot) || nn == Some(partner) {
                            update_nn(&mut jets, &tiles, &tiling, other);
                        } else {
                            let dist = jets[other].delta_r2(&jets[merged]);
                            if dist >= jets[other].nn_dist {
                                continue;
                            }
                            jets[other].nn = Some(merged);
                            jets[other].nn_dist = dist;
                        }
                        queue.push(Reverse((n64(jets[other].dist(r2)), other)));
                    }
                }
            }
            None => {
                deactivate(&mut jets, &mut tiles, slot);
                let tile = jets[slot].tile;
                for &tile in tiling.neighbourhood(tile) {
                    for &other in &tiles[tile] {
                        if jets[other].nn == Some(slot) {
                            update_nn(&mut jets, &tiles, &tiling, other);
                            queue.push(Reverse((n64(jets[other].dist(r2)), other)));
                        }
                    }
                }
                let jet = &mut jets[slot];
                if jet.p.pt() > jet_def.min_pt {
                    let mut constituents = std::mem::take(&mut jet.constituents);
                    constituents.sort_unstable();
                    res.push(Jet {
                        p: jet.p,
                        constituents,
                    });
                }
            }
        }
    }
    res.sort_by(|a, b| b.pt().cmp(&a.pt()));
    res
}
