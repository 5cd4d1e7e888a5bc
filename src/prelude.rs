pub use crate::{
    cluster::{cluster, Jet, JetAlgorithm, JetConfiguration, JetDefinition, RecombinationScheme},
    compose::{Composer, ComposerBuilder, Composition, PileupSampler, WorkingEvent},
    config::Config,
    display::{EventDisplay, EventDisplayBuilder, Summary},
    event::{Classifier, Event, EventBuilder, Particle},
    ghost::GhostGrid,
    raster::{fill_energy_flow, Raster, ZRange},
    reader::{CombinedReader, Cycle},
    render::{Page, SvgDocument},
    traits::{RenderPage, Rewind},
};
