//! Compound-file storage seam and the `.msg` naming convention.
//!
//! The writer only needs three primitives from a container: create a child
//! storage, create (or overwrite) a stream, and commit. [`Container`] is that
//! seam; [`MemoryContainer`] records the tree in memory and
//! [`CompoundFile`] writes a real compound file.

pub mod compound;
pub mod memory;

use std::fmt;

use crate::error::Result;
use crate::property::PropertyTag;

pub use compound::CompoundFile;
pub use memory::MemoryContainer;

/// Fixed property table of every storage.
pub const PROPERTIES_STREAM: &str = "__properties_version1.0";

/// Prefix of attachment storages.
pub const ATTACHMENT_PREFIX: &str = "__attach_version1.0_#";

/// Prefix of recipient storages.
pub const RECIPIENT_PREFIX: &str = "__recip_version1.0_#";

/// Named-property mapping storage under the message root.
pub const NAMEID_STORAGE: &str = "__nameid_version1.0";

/// Streams the named-property storage must contain (GUID, entry and string tables).
pub const NAMEID_STREAMS: [&str; 3] = [
    "__substg1.0_00020102",
    "__substg1.0_00030102",
    "__substg1.0_00040102",
];

/// Render a storage slot name: `<prefix><index as 8 upper-case hex digits>`.
///
/// # Examples
/// - `slot_name(ATTACHMENT_PREFIX, 0)` → `"__attach_version1.0_#00000000"`
/// - `slot_name(RECIPIENT_PREFIX, 255)` → `"__recip_version1.0_#000000FF"`
pub fn slot_name(prefix: &str, index: u32) -> String {
    format!("{prefix}{index:08X}")
}

/// Name of the stream holding a variable-width value: `__substg1.0_IIIITTTT`.
pub fn value_stream_name(tag: &PropertyTag) -> String {
    format!("__substg1.0_{:08X}", tag.value())
}

/// Absolute path of a storage inside a container. The root has no segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoragePath {
    segments: Vec<String>,
}

impl StoragePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Slash-separated path of a stream inside this storage.
    pub fn stream_path(&self, stream: &str) -> String {
        format!("{}/{stream}", self.to_string().trim_end_matches('/'))
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

/// The container primitives the writer consumes.
pub trait Container {
    /// Create a named child storage under `parent` and return its path.
    fn create_storage(&mut self, parent: &StoragePath, name: &str) -> Result<StoragePath>;

    /// Create or overwrite the stream `name` in `storage`.
    fn write_stream(&mut self, storage: &StoragePath, name: &str, data: &[u8]) -> Result<()>;

    /// Persist everything written so far.
    fn commit(&mut self) -> Result<()>;
}
