use std::{collections::HashMap, f64::consts::PI};

use jetflow::{
    cluster::{cluster, JetAlgorithm, JetDefinition, RecombinationScheme},
    four_vector::FourVector,
};
use jetty::{
    anti_kt_f, cambridge_aachen_f, kt_f, Cluster, ClusterHistory, ClusterStep, PseudoJet,
};
use noisy_float::prelude::*;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

// from narrow jets to a single azimuthal tile
const RADII: [f64; 3] = [0.4, 1.5, 3.5];
const MIN_PT: f64 = 5.;

fn random_particles(rng: &mut impl Rng, n: usize) -> Vec<FourVector> {
    (0..n)
        .map(|_| {
            let pt = rng.gen_range(0.5..60.);
            let y = rng.gen_range(-2.5..2.5);
            let phi = rng.gen_range(0.0..2. * PI);
            FourVector::from_pt_y_phi_m(pt, y, phi, 0.)
        })
        .collect()
}

fn jetty_jets(
    particles: &[FourVector],
    algorithm: JetAlgorithm,
    radius: f64,
) -> Vec<[f64; 4]> {
    let partons: Vec<PseudoJet> = particles
        .iter()
        .map(|p| PseudoJet::from([p[0], p[1], p[2], p[3]]))
        .collect();
    let minpt2 = n64(MIN_PT * MIN_PT);
    let cut = |jet: PseudoJet| jet.pt2() > minpt2;
    let jets = match algorithm {
        JetAlgorithm::AntiKt => partons.cluster_if(anti_kt_f(radius), cut),
        JetAlgorithm::Kt => partons.cluster_if(kt_f(radius), cut),
        JetAlgorithm::CambridgeAachen => {
            partons.cluster_if(cambridge_aachen_f(radius), cut)
        }
    };
    sorted(
        jets.into_iter()
            .map(|j| [j.e(), j.px(), j.py(), j.pz()].map(|c| c.raw()))
            .collect(),
    )
}

fn our_jets(
    particles: &[FourVector],
    algorithm: JetAlgorithm,
    radius: f64,
) -> Vec<[f64; 4]> {
    let jet_def = JetDefinition {
        algorithm,
        radius,
        min_pt: MIN_PT,
        recombination: RecombinationScheme::E,
    };
    let jets = cluster(particles, &jet_def);
    let nconstituents: usize = jets.iter().map(|j| j.constituents.len()).sum();
    assert!(nconstituents <= particles.len());
    sorted(
        jets.into_iter()
            .map(|j| [j.p[0], j.p[1], j.p[2], j.p[3]].map(|c| c.raw()))
            .collect(),
    )
}

fn sorted(mut jets: Vec<[f64; 4]>) -> Vec<[f64; 4]> {
    let pt2 = |p: &[f64; 4]| p[1] * p[1] + p[2] * p[2];
    jets.sort_by(|a, b| pt2(b).total_cmp(&pt2(a)));
    jets
}

fn compare(algorithm: JetAlgorithm, radius: f64, seed: u64) {
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let particles = random_particles(&mut rng, 150);
    let expected = jetty_jets(&particles, algorithm, radius);
    let jets = our_jets(&particles, algorithm, radius);
    assert!(!expected.is_empty());
    assert_eq!(
        jets.len(),
        expected.len(),
        "{algorithm:?}, R = {radius}, seed {seed}"
    );
    // match by momentum, jets with similar pt may come in either order
    for jet in &jets {
        let closest = expected
            .iter()
            .map(|exp| {
                jet.iter()
                    .zip(exp.iter())
                    .map(|(c, e)| (c - e).abs())
                    .fold(0., f64::max)
            })
            .fold(f64::MAX, f64::min);
        assert!(
            closest < 1e-8 * (1. + jet[0]),
            "{algorithm:?}, R = {radius}, seed {seed}: no match for {jet:?}"
        );
    }
}

#[test]
fn anti_kt() {
    for (radius, seed) in itertools::iproduct!(RADII, 0..5) {
        compare(JetAlgorithm::AntiKt, radius, seed);
    }
}

#[test]
fn kt() {
    for (radius, seed) in itertools::iproduct!(RADII, 0..5) {
        compare(JetAlgorithm::Kt, radius, seed);
    }
}

#[test]
fn cambridge_aachen() {
    for (radius, seed) in itertools::iproduct!(RADII, 0..5) {
        compare(JetAlgorithm::CambridgeAachen, radius, seed);
    }
}

// constituents of the jets above the threshold, from the cluster history
fn jetty_constituents(particles: &[FourVector], radius: f64) -> Vec<Vec<usize>> {
    let partons: Vec<PseudoJet> = particles
        .iter()
        .map(|p| PseudoJet::from([p[0], p[1], p[2], p[3]]))
        .collect();
    let mut constituents: HashMap<PseudoJet, Vec<usize>> = partons
        .iter()
        .enumerate()
        .map(|(n, p)| (*p, vec![n]))
        .collect();
    assert_eq!(constituents.len(), partons.len());
    let minpt2 = n64(MIN_PT * MIN_PT);
    let mut jets = Vec::new();
    for step in ClusterHistory::new(partons, anti_kt_f(radius)) {
        match step {
            ClusterStep::Combine([p1, p2]) => {
                let mut merged = constituents.remove(&p1).unwrap();
                merged.append(&mut constituents.remove(&p2).unwrap());
                constituents.insert(p1 + p2, merged);
            }
            ClusterStep::Jet(jet) => {
                let mut jet_constituents = constituents.remove(&jet).unwrap();
                if jet.pt2() > minpt2 {
                    jet_constituents.sort_unstable();
                    jets.push(jet_constituents);
                }
            }
        }
    }
    assert!(constituents.is_empty());
    jets.sort();
    jets
}

#[test]
fn anti_kt_constituents() {
    for (radius, seed) in itertools::iproduct!(RADII, 0..3) {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let particles = random_particles(&mut rng, 150);
        let expected = jetty_constituents(&particles, radius);
        let jet_def = JetDefinition {
            algorithm: JetAlgorithm::AntiKt,
            radius,
            min_pt: MIN_PT,
            recombination: RecombinationScheme::E,
        };
        let mut constituents: Vec<_> = cluster(&particles, &jet_def)
            .into_iter()
            .map(|jet| jet.constituents)
            .collect();
        constituents.sort();
        assert!(!expected.is_empty());
        assert_eq!(constituents, expected, "R = {radius}, seed {seed}");
    }
}
