use std::io::{Read, Result, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::traits::TryClone;

/// An open event file that remembers its path
///
/// Event readers need an independent handle for decompression that
/// can be recreated after seeking back to the start, which is what
/// [TryClone] provides.
#[derive(Debug)]
pub struct File {
    inner: std::fs::File,
    path: PathBuf,
}

impl TryClone for File {
    type Error = std::io::Error;

    fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.try_clone()?,
            path: self.path.clone(),
        })
    }
}

impl File {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<File> {
        let path = path.as_ref();
        let inner = std::fs::File::open(path)?;
        Ok(Self {
            inner,
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.inner.seek(pos)
    }
}
