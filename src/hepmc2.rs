use std::collections::HashMap;
use std::io::{BufRead, BufReader, Seek};

use audec::auto_decompress;
use log::{trace, warn};
use particle_id::ParticleID;

use crate::{
    event::{Classifier, Event, EventBuilder, Particle},
    file::File,
    four_vector::FourVector,
    reader::{EventReadError, RewindError},
    traits::{Rewind, TryClone},
};

/// Reader for a single (potentially compressed) HepMC2 event file
///
/// After a malformed record the reader is exhausted: the underlying
/// parser cannot skip past the offending line, so reading on would only
/// repeat the same error.
pub struct FileReader {
    reader: hepmc2::Reader<Box<dyn BufRead>>,
    source: File,
    classifier: Classifier,
    failed: bool,
}

impl FileReader {
    /// Construct a reader for the given (potentially compressed) HepMC2 event file
    pub fn new(source: File, classifier: Classifier) -> Result<Self, std::io::Error> {
        let cloned_source = source.try_clone()?;
        Ok(FileReader {
            source,
            reader: hepmc2::Reader::new(auto_decompress(BufReader::new(
                cloned_source,
            ))),
            classifier,
            failed: false,
        })
    }
}

impl Rewind for FileReader {
    type Error = RewindError;

    fn rewind(&mut self) -> Result<(), Self::Error> {
        use RewindError::*;
        trace!("Rewinding {:?}", self.source.path());
        self.source.rewind()?;
        let cloned_source = self.source.try_clone().map_err(CloneError)?;
        self.reader =
            hepmc2::Reader::new(auto_decompress(BufReader::new(cloned_source)));
        self.failed = false;
        Ok(())
    }
}

impl Iterator for FileReader {
    type Item = Result<Event, EventReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next()? {
            Ok(ev) => Some(Ok(convert(ev, &self.classifier))),
            Err(err) => {
                warn!("Stop reading {:?}: {err}", self.source.path());
                self.failed = true;
                Some(Err(err.into()))
            }
        }
    }
}

/// Convert a HepMC2 event record into the internal format
///
/// Particles are taken over in the order of their production vertices.
/// The daughters of a particle are the first and last outgoing particle
/// of its end vertex.
pub fn convert(event: hepmc2::Event, classifier: &Classifier) -> Event {
    let efact = if event.energy_unit == hepmc2::event::EnergyUnit::MEV {
        1e-3
    } else {
        1.
    };
    let nparticles = event.vertices.iter().map(|vx| vx.particles_out.len()).sum();
    let mut res = EventBuilder::with_capacity(event.number as i32, nparticles);
    let mut outgoing_by_vx = HashMap::with_capacity(event.vertices.len());
    let mut end_vertices = Vec::with_capacity(nparticles);
    for vx in event.vertices {
        let first = end_vertices.len();
        for out in vx.particles_out {
            let id = ParticleID::new(out.id);
            let p = FourVector::from(out.p.0.map(|p| efact * p));
            let status = classifier.classify(id, out.status);
            let idx = res.add_particle(Particle::new(id, p, out.status, status));
            debug_assert_eq!(idx, end_vertices.len());
            end_vertices.push(out.end_vtx);
        }
        if end_vertices.len() > first {
            outgoing_by_vx.insert(vx.barcode, [first, end_vertices.len() - 1]);
        }
    }
    for (idx, end_vtx) in end_vertices.into_iter().enumerate() {
        if end_vtx == 0 {
            continue;
        }
        if let Some(daughters) = outgoing_by_vx.get(&end_vtx) {
            res.set_daughters(idx, *daughters);
        } else {
            trace!("No outgoing particles at end vertex {end_vtx} of particle {idx}");
        }
    }
    res.build()
}
