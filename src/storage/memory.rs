//! In-memory container that records the storage tree.

use std::collections::BTreeMap;
use std::io;

use tracing::trace;

use super::{Container, StoragePath};
use crate::error::{MsgError, Result};

/// Keeps every storage and stream in memory, in creation order.
///
/// Used by tests and by callers that want to inspect a build before
/// writing it anywhere.
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    storages: Vec<StoragePath>,
    streams: BTreeMap<StoragePath, Vec<(String, Vec<u8>)>>,
    commits: usize,
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContainer {
    pub fn new() -> Self {
        let root = StoragePath::root();
        let mut streams = BTreeMap::new();
        streams.insert(root.clone(), Vec::new());
        Self {
            storages: vec![root],
            streams,
            commits: 0,
        }
    }

    /// Every storage (root first) in creation order.
    pub fn storages(&self) -> &[StoragePath] {
        &self.storages
    }

    /// Names of the direct children of `parent`, in creation order.
    pub fn children(&self, parent: &StoragePath) -> Vec<&str> {
        self.storages
            .iter()
            .filter(|s| s.parent().as_ref() == Some(parent))
            .filter_map(|s| s.name())
            .collect()
    }

    pub fn stream(&self, storage: &StoragePath, name: &str) -> Option<&[u8]> {
        self.streams
            .get(storage)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Streams of `storage` as `(name, data)`, in creation order.
    pub fn streams_in<'a>(
        &'a self,
        storage: &StoragePath,
    ) -> impl Iterator<Item = (&'a str, &'a [u8])> + 'a {
        self.streams
            .get(storage)
            .into_iter()
            .flatten()
            .map(|(n, d)| (n.as_str(), d.as_slice()))
    }

    /// Number of successful commits.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl Container for MemoryContainer {
    fn create_storage(&mut self, parent: &StoragePath, name: &str) -> Result<StoragePath> {
        if !self.streams.contains_key(parent) {
            return Err(MsgError::storage(
                parent,
                io::Error::new(io::ErrorKind::NotFound, "parent storage does not exist"),
            ));
        }
        let path = parent.child(name);
        if self.streams.contains_key(&path) {
            return Err(MsgError::storage(
                &path,
                io::Error::new(io::ErrorKind::AlreadyExists, "storage already exists"),
            ));
        }
        trace!(path = %path, "Creating storage");
        self.streams.insert(path.clone(), Vec::new());
        self.storages.push(path.clone());
        Ok(path)
    }

    fn write_stream(&mut self, storage: &StoragePath, name: &str, data: &[u8]) -> Result<()> {
        let streams = self.streams.get_mut(storage).ok_or_else(|| {
            MsgError::storage(
                storage,
                io::Error::new(io::ErrorKind::NotFound, "storage does not exist"),
            )
        })?;
        match streams.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data.to_vec(),
            None => streams.push((name.to_string(), data.to_vec())),
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
