use crate::four_vector::FourVector;

use particle_id::ParticleID;
use serde::{Deserialize, Serialize};
use strum::Display;

/// HepMC status code of final-state particles
pub const FINAL_STATUS: i32 = 1;

/// Sign of the electric charge
#[derive(
    Deserialize, Serialize, Display, Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[strum(serialize_all = "lowercase")]
pub enum Charge {
    Positive,
    Negative,
    Neutral,
}

impl Charge {
    /// The charge sign of the particle with the given ID
    pub fn of(id: ParticleID) -> Self {
        match three_charge(id) {
            q if q > 0 => Self::Positive,
            q if q < 0 => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

/// Role of a particle in the event record
#[derive(
    Deserialize, Serialize, Display, Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    /// Stable end product
    Final,
    /// Short-lived particle tracked for physics interpretation
    Resonance,
    /// Anything else, e.g. beams, partons, decayed hadrons
    Intermediate,
}

/// Decides which particles are final-state particles and which are resonances
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Classifier {
    resonances: Vec<ParticleID>,
}

impl Classifier {
    /// Treat particles with the given IDs (or their antiparticles) as resonances
    pub fn new(resonances: impl IntoIterator<Item = ParticleID>) -> Self {
        Self {
            resonances: resonances.into_iter().map(|id| id.abs()).collect(),
        }
    }

    /// Classify a particle by its ID and generator status code
    pub fn classify(&self, id: ParticleID, status: i32) -> Status {
        if status == FINAL_STATUS {
            Status::Final
        } else if self.resonances.contains(&id.abs()) {
            Status::Resonance
        } else {
            Status::Intermediate
        }
    }
}

/// A particle in an event record
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Particle {
    pub id: ParticleID,
    pub p: FourVector,
    /// Generator status code
    pub status_code: i32,
    pub status: Status,
    pub charge: Charge,
    /// Position of the first and last daughter in the event record
    pub daughters: Option<[usize; 2]>,
}

impl Particle {
    pub fn new(id: ParticleID, p: FourVector, status_code: i32, status: Status) -> Self {
        Self {
            id,
            p,
            status_code,
            status,
            charge: Charge::of(id),
            daughters: None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.status == Status::Final
    }

    pub fn is_resonance(&self) -> bool {
        self.status == Status::Resonance
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventBuilder {
    id: i32,
    particles: Vec<Particle>,
}

impl EventBuilder {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            particles: Vec::new(),
        }
    }

    pub fn with_capacity(id: i32, cap: usize) -> Self {
        Self {
            id,
            particles: Vec::with_capacity(cap),
        }
    }

    /// Add a particle, returning its position in the event record
    pub fn add_particle(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    /// Set the first and last daughter of the particle at position `idx`
    pub fn set_daughters(&mut self, idx: usize, daughters: [usize; 2]) -> &mut Self {
        self.particles[idx].daughters = Some(daughters);
        self
    }

    pub fn build(self) -> Event {
        Event {
            id: self.id,
            particles: self.particles,
        }
    }
}

impl From<EventBuilder> for Event {
    fn from(b: EventBuilder) -> Self {
        b.build()
    }
}

/// Scattering event
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Event {
    id: i32,
    particles: Vec<Particle>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.as_slice()
    }

    pub fn final_state(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.is_final())
    }

    /// First and last daughter of the given particle
    pub fn daughters(&self, particle: &Particle) -> Option<[&Particle; 2]> {
        let [first, last] = particle.daughters?;
        Some([self.particles.get(first)?, self.particles.get(last)?])
    }

    pub fn into_particles(self) -> Vec<Particle> {
        self.particles
    }
}

// three times the charge of quarks d, u, s, c, b, t
const QUARK_THREE_CHARGE: [i32; 6] = [-1, 2, -1, 2, -1, 2];

fn quark_three_charge(q: i32) -> i32 {
    match q {
        1..=6 => QUARK_THREE_CHARGE[(q - 1) as usize],
        _ => 0,
    }
}

/// Three times the electric charge of a particle, following the PDG
/// numbering scheme
///
/// Nuclei and other exotic states are treated as neutral.
pub fn three_charge(id: ParticleID) -> i32 {
    let pid = id.id();
    let apid = pid.abs();
    let charge = match apid {
        1..=6 => quark_three_charge(apid),
        11 | 13 | 15 | 17 => -3,
        24 | 37 => 3,
        0..=99 => 0,
        // nuclei and beyond
        _ if apid >= 1_000_000_000 => 0,
        _ => {
            let code = apid % 10_000;
            let nq1 = code / 1000;
            let nq2 = (code / 100) % 10;
            let nq3 = (code / 10) % 10;
            if nq1 == 0 {
                // meson
                let q = quark_three_charge(nq2) - quark_three_charge(nq3);
                // the heavier quark is the antiquark for down-type flavours
                if nq2 == 3 || nq2 == 5 {
                    -q
                } else {
                    q
                }
            } else if nq3 == 0 {
                // diquark
                quark_three_charge(nq1) + quark_three_charge(nq2)
            } else {
                // baryon
                quark_three_charge(nq1)
                    + quark_three_charge(nq2)
                    + quark_three_charge(nq3)
            }
        }
    };
    if pid < 0 {
        -charge
    } else {
        charge
    }
}
