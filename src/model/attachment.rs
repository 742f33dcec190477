//! Attachments and the validated attachment collection.
//!
//! Attachment content is NOT read when the attachment is added.
//! The byte source is owned by the attachment and read exactly once,
//! when the message is written.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{MsgError, Result};

/// How the attachment's data is stored (`PR_ATTACH_METHOD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachKind {
    #[default]
    ByValue,
    ByReference,
    ByRefResolve,
    ByRefOnly,
    EmbeddedMessage,
    Ole,
}

impl AttachKind {
    /// The on-disk attach method value.
    pub const fn method(self) -> i32 {
        match self {
            AttachKind::ByValue => 1,
            AttachKind::ByReference => 2,
            AttachKind::ByRefResolve => 3,
            AttachKind::ByRefOnly => 4,
            AttachKind::EmbeddedMessage => 5,
            AttachKind::Ole => 6,
        }
    }
}

/// A file attached to a message.
///
/// Immutable once built; construct through [`AttachmentBuilder`] or
/// [`Attachments::add`].
pub struct Attachment {
    source: Box<dyn Read>,
    file_name: String,
    kind: AttachKind,
    is_inline: bool,
    content_id: Option<String>,
    mime_type: Option<String>,
    creation_time: Option<DateTime<Utc>>,
    last_modification_time: Option<DateTime<Utc>>,
}

impl Attachment {
    /// Base name of the attached file (no directory part).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Extension of the file name without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.file_name)
    }

    pub fn kind(&self) -> AttachKind {
        self.kind
    }

    pub fn is_inline(&self) -> bool {
        self.is_inline
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.creation_time
    }

    pub fn last_modification_time(&self) -> Option<DateTime<Utc>> {
        self.last_modification_time
    }

    /// Read the whole payload, consuming the byte source.
    pub fn read_data(mut self) -> Result<(AttachmentMeta, Vec<u8>)> {
        let mut data = Vec::new();
        self.source
            .read_to_end(&mut data)
            .map_err(|e| MsgError::AttachmentRead {
                name: self.file_name.clone(),
                source: e,
            })?;
        debug!(name = %self.file_name, bytes = data.len(), "Read attachment data");
        let meta = AttachmentMeta {
            file_name: self.file_name,
            kind: self.kind,
            is_inline: self.is_inline,
            content_id: self.content_id,
            mime_type: self.mime_type,
            creation_time: self.creation_time,
            last_modification_time: self.last_modification_time,
        };
        Ok((meta, data))
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("kind", &self.kind)
            .field("is_inline", &self.is_inline)
            .field("content_id", &self.content_id)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Attachment fields left after the byte source has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentMeta {
    pub file_name: String,
    pub kind: AttachKind,
    pub is_inline: bool,
    pub content_id: Option<String>,
    pub mime_type: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub last_modification_time: Option<DateTime<Utc>>,
}

impl AttachmentMeta {
    /// Extension of the file name without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.file_name)
    }
}

/// Validating constructor for [`Attachment`].
pub struct AttachmentBuilder {
    source: Option<Box<dyn Read>>,
    file_name: String,
    is_inline: bool,
    content_id: Option<String>,
    mime_type: Option<String>,
    creation_time: Option<DateTime<Utc>>,
    last_modification_time: Option<DateTime<Utc>>,
}

impl AttachmentBuilder {
    /// Start an attachment. `file_name` may be a full path; only the base name is kept.
    pub fn new(file_name: &str) -> Self {
        Self {
            source: None,
            file_name: file_name.to_string(),
            is_inline: false,
            content_id: None,
            mime_type: None,
            creation_time: None,
            last_modification_time: None,
        }
    }

    /// Take ownership of a byte source.
    pub fn reader(mut self, source: impl Read + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Use an in-memory payload.
    pub fn bytes(self, data: impl Into<Vec<u8>>) -> Self {
        self.reader(std::io::Cursor::new(data.into()))
    }

    /// Mark as inline, referenced from the body by `content_id`.
    pub fn inline(mut self, content_id: Option<&str>) -> Self {
        self.is_inline = true;
        self.content_id = content_id.map(str::to_string);
        self
    }

    /// Set the content id without marking the attachment inline.
    pub fn content_id(mut self, content_id: &str) -> Self {
        self.content_id = Some(content_id.to_string());
        self
    }

    pub fn mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    pub fn creation_time(mut self, t: DateTime<Utc>) -> Self {
        self.creation_time = Some(t);
        self
    }

    pub fn last_modification_time(mut self, t: DateTime<Utc>) -> Self {
        self.last_modification_time = Some(t);
        self
    }

    /// Validate and produce the attachment.
    pub fn build(self) -> Result<Attachment> {
        let file_name = base_name(&self.file_name).to_string();
        if file_name.trim().is_empty() {
            return Err(MsgError::InvalidFileName(self.file_name));
        }
        let content_id = self.content_id.filter(|c| !c.trim().is_empty());
        if self.is_inline && content_id.is_none() {
            return Err(MsgError::MissingContentId(file_name));
        }
        let source = self
            .source
            .ok_or_else(|| MsgError::MissingSource(file_name.clone()))?;
        Ok(Attachment {
            source,
            file_name,
            kind: AttachKind::ByValue,
            is_inline: self.is_inline,
            content_id,
            mime_type: self.mime_type,
            creation_time: self.creation_time,
            last_modification_time: self.last_modification_time,
        })
    }
}

/// Strip any directory part, accepting both `/` and `\` separators.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn extension_of(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Ordered attachments with unique (case-insensitive) file names.
///
/// Insertion order is the storage index order in the written file.
#[derive(Debug, Default)]
pub struct Attachments {
    items: Vec<Attachment>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attachment read from `source`.
    ///
    /// Fails if the base name collides with an existing entry or if an
    /// inline attachment has no content id.
    pub fn add(
        &mut self,
        source: impl Read + 'static,
        file_name: &str,
        is_inline: bool,
        content_id: Option<&str>,
    ) -> Result<()> {
        let mut builder = AttachmentBuilder::new(file_name).reader(source);
        if is_inline {
            builder = builder.inline(content_id);
        } else if let Some(cid) = content_id {
            builder = builder.content_id(cid);
        }
        self.push(builder.build()?)
    }

    /// Add a file from disk, using its modification time when available.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let name = path.to_string_lossy().to_string();
        let file = File::open(path).map_err(|e| MsgError::AttachmentRead {
            name: name.clone(),
            source: e,
        })?;
        let mut builder = AttachmentBuilder::new(&name);
        if let Ok(modified) = file.metadata().and_then(|m| m.modified()) {
            builder = builder.last_modification_time(modified.into());
        }
        self.push(builder.reader(BufReader::new(file)).build()?)
    }

    /// Append an already-built attachment.
    pub fn push(&mut self, attachment: Attachment) -> Result<()> {
        if self.contains(attachment.file_name()) {
            return Err(MsgError::DuplicateAttachment(attachment.file_name));
        }
        debug!(name = %attachment.file_name, index = self.items.len(), "Attachment added");
        self.items.push(attachment);
        Ok(())
    }

    /// `true` if an attachment with this base name (any case) exists.
    pub fn contains(&self, file_name: &str) -> bool {
        let wanted = base_name(file_name).to_lowercase();
        self.items
            .iter()
            .any(|a| a.file_name.to_lowercase() == wanted)
    }

    /// Remove the attachment with this base name (any case), dropping its byte source.
    pub fn remove(&mut self, file_name: &str) -> bool {
        let wanted = base_name(file_name).to_lowercase();
        match self
            .items
            .iter()
            .position(|a| a.file_name.to_lowercase() == wanted)
        {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(Attachment::file_name).collect()
    }
}

impl IntoIterator for Attachments {
    type Item = Attachment;
    type IntoIter = std::vec::IntoIter<Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
