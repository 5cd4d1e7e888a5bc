use std::path::{Path, PathBuf};

use hepmc2::reader::LineParseError;
use log::debug;
use thiserror::Error;

use crate::{event::{Classifier, Event}, file::File, traits::Rewind};

/// Returns an event reader for the HepMC2 file at `path`
pub fn make_reader<P: AsRef<Path>>(
    path: P,
    classifier: Classifier,
) -> Result<crate::hepmc2::FileReader, CreateError> {
    use crate::hepmc2::FileReader as HepMCReader;
    use CreateError::*;
    let path = path.as_ref();
    debug!("Read {path:?} as HepMC file");
    let file = File::open(path).map_err(|err| OpenError(path.to_owned(), err))?;
    let reader = HepMCReader::new(file, classifier)
        .map_err(|err| CloneError(path.to_owned(), err))?;
    Ok(reader)
}

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("Failed to open {0:?}: {1}")]
    OpenError(PathBuf, std::io::Error),
    #[error("Failed to clone file handle for {0:?}: {1}")]
    CloneError(PathBuf, std::io::Error),
}

#[derive(Debug, Error)]
pub enum RewindError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Source clone error: {0}")]
    CloneError(std::io::Error),
}

#[derive(Debug, Error)]
pub enum EventReadError {
    #[error("Error reading HepMC record: {0}")]
    HepMCError(#[from] LineParseError),
    #[error("Failed to rewind event source: {0}")]
    RewindError(#[from] RewindError),
}

/// Read events from several sources, one after the other
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CombinedReader<R> {
    readers: Vec<R>,
    current: usize,
}

impl<R> CombinedReader<R> {
    pub fn new(readers: Vec<R>) -> Self {
        Self { readers, current: 0 }
    }
}

impl<R: Rewind> Rewind for CombinedReader<R> {
    type Error = <R as Rewind>::Error;

    fn rewind(&mut self) -> Result<(), Self::Error> {
        if self.readers.is_empty() {
            return Ok(());
        }
        for reader in &mut self.readers[..=self.current] {
            reader.rewind()?;
        }
        self.current = 0;
        Ok(())
    }
}

impl<R: Iterator> Iterator for CombinedReader<R> {
    type Item = <R as Iterator>::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.readers.get_mut(self.current)?.next();
        if next.is_some() {
            return next;
        }
        if self.current + 1 >= self.readers.len() {
            return None;
        }
        self.current += 1;
        self.next()
    }
}

impl CombinedReader<crate::hepmc2::FileReader> {
    /// Construct a new reader reading from the files with the given names
    pub fn from_files<I, P>(
        files: I,
        classifier: &Classifier,
    ) -> Result<Self, CreateError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let readers: Result<_, _> = files
            .into_iter()
            .map(|f| make_reader(f, classifier.clone()))
            .collect();
        Ok(Self::new(readers?))
    }
}

/// Endless event source
///
/// Once the underlying reader is exhausted, it is rewound and reading
/// starts over. Yields `None` only if there are no events at all.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Cycle<R> {
    reader: R,
}

impl<R> Cycle<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R, E> Iterator for Cycle<R>
where
    R: Iterator<Item = Result<Event, E>> + Rewind,
    E: From<<R as Rewind>::Error>,
{
    type Item = Result<Event, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(next) = self.reader.next() {
            return Some(next);
        }
        debug!("Event source exhausted, starting over");
        if let Err(err) = self.reader.rewind() {
            return Some(Err(err.into()));
        }
        self.reader.next()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    // in-memory source with a fixed list of event ids
    struct Events {
        ids: Vec<i32>,
        pos: usize,
    }

    impl Events {
        fn new(ids: Vec<i32>) -> Self {
            Self { ids, pos: 0 }
        }
    }

    impl Iterator for Events {
        type Item = Result<Event, Infallible>;

        fn next(&mut self) -> Option<Self::Item> {
            let id = *self.ids.get(self.pos)?;
            self.pos += 1;
            Some(Ok(crate::event::EventBuilder::new(id).build()))
        }
    }

    impl Rewind for Events {
        type Error = Infallible;

        fn rewind(&mut self) -> Result<(), Self::Error> {
            self.pos = 0;
            Ok(())
        }
    }

    fn ids<I: Iterator<Item = Result<Event, Infallible>>>(it: I) -> Vec<i32> {
        it.map(|ev| match ev {
            Ok(ev) => ev.id(),
            Err(err) => match err {},
        })
        .collect()
    }

    #[test]
    fn combined() {
        let mut reader = CombinedReader::new(vec![
            Events::new(vec![1, 2]),
            Events::new(vec![]),
            Events::new(vec![3]),
        ]);
        assert_eq!(ids(&mut reader), [1, 2, 3]);
        reader.rewind().unwrap();
        assert_eq!(ids(reader), [1, 2, 3]);

        let mut empty = CombinedReader::<Events>::new(vec![]);
        assert!(empty.next().is_none());
        assert!(empty.rewind().is_ok());
    }

    #[test]
    fn cycle() {
        let reader = Cycle::new(Events::new(vec![1, 2, 3]));
        assert_eq!(ids(reader.take(7)), [1, 2, 3, 1, 2, 3, 1]);

        let mut empty = Cycle::new(Events::new(vec![]));
        assert!(empty.next().is_none());
    }
}
