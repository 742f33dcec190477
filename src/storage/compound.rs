//! Compound File Binary container backed by the `cfb` crate.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use tracing::{debug, info};

use super::{Container, StoragePath};
use crate::error::{MsgError, Result};

/// A compound file being written.
pub struct CompoundFile<F: Read + Write + Seek> {
    inner: cfb::CompoundFile<F>,
}

impl CompoundFile<File> {
    /// Create (or truncate) a compound file on disk.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = cfb::create(path).map_err(|e| MsgError::io(path, e))?;
        debug!(path = %path.display(), "Created compound file");
        Ok(Self { inner })
    }
}

impl<F: Read + Write + Seek> CompoundFile<F> {
    /// Start a new compound file inside any seekable byte sink.
    pub fn new(inner: F) -> Result<Self> {
        let inner = cfb::CompoundFile::create(inner).map_err(|e| MsgError::storage("/", e))?;
        Ok(Self { inner })
    }

    /// Give back the underlying sink (after [`Container::commit`]).
    pub fn into_inner(self) -> F {
        self.inner.into_inner()
    }
}

impl<F: Read + Write + Seek> Container for CompoundFile<F> {
    fn create_storage(&mut self, parent: &StoragePath, name: &str) -> Result<StoragePath> {
        let path = parent.child(name);
        self.inner
            .create_storage(path.to_string())
            .map_err(|e| MsgError::storage(&path, e))?;
        Ok(path)
    }

    fn write_stream(&mut self, storage: &StoragePath, name: &str, data: &[u8]) -> Result<()> {
        let stream_path = storage.stream_path(name);
        let mut stream = self
            .inner
            .create_stream(&stream_path)
            .map_err(|e| MsgError::storage(&stream_path, e))?;
        stream
            .write_all(data)
            .and_then(|_| stream.flush())
            .map_err(|e| MsgError::storage(&stream_path, e))?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| MsgError::storage("/", e))?;
        info!("Compound file committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_and_read_back_with_cfb() {
        let mut file = CompoundFile::new(Cursor::new(Vec::new())).unwrap();
        let root = StoragePath::root();
        let att = file
            .create_storage(&root, "__attach_version1.0_#00000000")
            .unwrap();
        file.write_stream(&att, "__properties_version1.0", &[0u8; 8])
            .unwrap();
        file.write_stream(&root, "top", b"hello").unwrap();
        file.commit().unwrap();

        let bytes = file.into_inner().into_inner();
        let mut reader = cfb::CompoundFile::open(Cursor::new(bytes)).unwrap();
        assert!(reader.is_storage("/__attach_version1.0_#00000000"));

        let mut data = Vec::new();
        reader
            .open_stream("/top")
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data, b"hello");

        let entry = reader
            .entry("/__attach_version1.0_#00000000/__properties_version1.0")
            .unwrap();
        assert_eq!(entry.len(), 8);
    }

    #[test]
    fn test_missing_parent_is_storage_error() {
        let mut file = CompoundFile::new(Cursor::new(Vec::new())).unwrap();
        let ghost = StoragePath::root().child("ghost");
        assert!(matches!(
            file.create_storage(&ghost, "x"),
            Err(MsgError::Storage { .. })
        ));
    }
}
