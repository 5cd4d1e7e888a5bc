use std::path::Path;

use hepmc2::event::{EnergyUnit, FourVector, Particle, Vertex};
use jetflow::{
    event::{Charge, Status},
    prelude::*,
    reader::{make_reader, EventReadError},
};
use particle_id::ParticleID;

fn particle(id: i32, p: [f64; 4], status: i32, end_vtx: i32) -> Particle {
    Particle {
        id,
        p: FourVector(p),
        status,
        end_vtx,
        ..Default::default()
    }
}

// Higgs decaying into a bottom quark pair, one of which hadronises into a B+
fn higgs_event(number: i32) -> hepmc2::Event {
    let vertices = vec![
        Vertex {
            barcode: -1,
            particles_out: vec![particle(25, [150e3, 0., 0., 90e3], 62, -2)],
            ..Default::default()
        },
        Vertex {
            barcode: -2,
            particles_out: vec![
                particle(5, [75e3, 60e3, 0., 45e3], 23, -3),
                particle(-5, [75e3, -60e3, 0., 45e3], 23, 0),
            ],
            ..Default::default()
        },
        Vertex {
            barcode: -3,
            particles_out: vec![
                particle(521, [70e3, 56e3, 0., 42e3], 1, 0),
                particle(22, [5e3, 4e3, 0., 3e3], 1, 0),
            ],
            ..Default::default()
        },
    ];
    hepmc2::Event {
        number,
        weights: vec![1.],
        vertices,
        energy_unit: EnergyUnit::MEV,
        ..Default::default()
    }
}

fn events_to_string(numbers: &[i32]) -> String {
    let mut buf = Vec::new();
    let mut writer = hepmc2::Writer::try_from(&mut buf).unwrap();
    for &number in numbers {
        writer.write(&higgs_event(number)).unwrap();
    }
    writer.finish().unwrap();
    String::from_utf8(buf).unwrap()
}

fn write_events(path: &Path, numbers: &[i32]) {
    std::fs::write(path, events_to_string(numbers)).unwrap();
}

// events where the record of the last one starts with a line the parser rejects
fn write_corrupt_events(path: &Path, numbers: &[i32]) {
    let events = events_to_string(numbers);
    let last_event = events.rfind("\nE ").unwrap() + 1;
    let (good, bad) = events.split_at(last_event);
    std::fs::write(path, format!("{good}X garbage\n{bad}")).unwrap();
}

struct Discard;

impl RenderPage for Discard {
    type Error = std::convert::Infallible;

    fn render(&mut self, _page: &Page<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn ids<I>(reader: I) -> Vec<i32>
where
    I: Iterator<Item = Result<Event, EventReadError>>,
{
    reader.map(|ev| ev.unwrap().id()).collect()
}

#[test]
fn read_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.hepmc");
    write_events(&path, &[1, 2]);

    let classifier = Classifier::new([ParticleID::new(25)]);
    let mut reader = make_reader(&path, classifier).unwrap();
    let ev = reader.next().unwrap().unwrap();
    assert_eq!(ev.id(), 1);
    let particles = ev.particles();
    assert_eq!(particles.len(), 5);

    let higgs = &particles[0];
    assert_eq!(higgs.status, Status::Resonance);
    assert_eq!(higgs.status_code, 62);
    assert!((higgs.p.e().raw() - 150.).abs() < 1e-9);
    let [b, bbar] = ev.daughters(higgs).unwrap();
    assert_eq!(b.id, ParticleID::new(5));
    assert_eq!(bbar.id, ParticleID::new(-5));
    assert_eq!(bbar.charge, Charge::Positive);
    assert_eq!(b.status, Status::Intermediate);

    let final_state: Vec<_> = ev.final_state().collect();
    assert_eq!(final_state.len(), 2);
    assert_eq!(final_state[0].id, ParticleID::new(521));
    assert_eq!(final_state[0].charge, Charge::Positive);
    assert_eq!(final_state[1].charge, Charge::Neutral);

    assert_eq!(ids(&mut reader), [2]);
    reader.rewind().unwrap();
    assert_eq!(ids(reader), [1, 2]);
}

#[test]
fn combined_and_cycled() {
    let dir = tempfile::tempdir().unwrap();
    let files = [dir.path().join("a.hepmc"), dir.path().join("b.hepmc")];
    write_events(&files[0], &[1, 2]);
    write_events(&files[1], &[3]);

    let classifier = Classifier::new([ParticleID::new(25)]);
    let reader = CombinedReader::from_files(&files, &classifier).unwrap();
    assert_eq!(ids(reader), [1, 2, 3]);

    let reader = CombinedReader::from_files(&files, &classifier).unwrap();
    assert_eq!(ids(Cycle::new(reader).take(7)), [1, 2, 3, 1, 2, 3, 1]);
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Classifier::new(Vec::new());
    assert!(make_reader(dir.path().join("missing.hepmc"), classifier).is_err());
}

#[test]
fn corrupt_file_ends_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.hepmc");
    write_corrupt_events(&path, &[1, 2, 3]);

    let classifier = Classifier::new([ParticleID::new(25)]);
    let mut reader = make_reader(&path, classifier).unwrap();
    for _ in 0..2 {
        let results: Vec<_> = (&mut reader).take(100).collect();
        assert!(results.len() < 100);
        assert_eq!(results[0].as_ref().unwrap().id(), 1);
        assert!(results.last().unwrap().is_err());
        assert!(reader.next().is_none());
        reader.rewind().unwrap();
    }

    // an endless pileup source still yields the good events
    let reader = make_reader(&path, Classifier::new(Vec::new())).unwrap();
    let ids: Vec<_> = Cycle::new(reader)
        .take(20)
        .filter_map(|ev| ev.ok().map(|ev| ev.id()))
        .collect();
    assert!(ids.len() > 1);
    assert!(ids.iter().all(|&id| id < 3));
}

#[test]
fn corrupt_file_ends_display() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.hepmc");
    write_corrupt_events(&path, &[1, 2, 3]);

    let config = Config {
        pileup_mu: 0.,
        grid: jetflow::config::Grid {
            y_bins: 8,
            phi_bins: 8,
        },
        ..Default::default()
    };
    let hard_scatter = make_reader(&path, config.classifier()).unwrap();
    let mut display = EventDisplayBuilder {
        hard_scatter,
        pileup: std::iter::empty::<Result<Event, EventReadError>>(),
        renderer: Discard,
        config,
    }
    .build()
    .unwrap();
    let summary = display.run().unwrap();
    assert!(summary.events < 10);
    assert_eq!(summary.skipped, summary.events);
    assert_eq!(summary.pages, 0);
}
