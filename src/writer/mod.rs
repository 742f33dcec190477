//! Storage assembler: turns a [`Message`] into a `.msg` container tree.
//!
//! ```text
//! /
//! ├── __recip_version1.0_#00000000/     one per recipient, in order
//! ├── __attach_version1.0_#00000000/    one per attachment, in order
//! ├── __nameid_version1.0/              empty named-property map
//! ├── __substg1.0_XXXXXXXX              message value streams
//! └── __properties_version1.0           message property table
//! ```

pub mod attachment;
pub mod message;
pub mod recipient;

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::MessageConfig;
use crate::error::{MsgError, Result};
use crate::model::message::Message;
use crate::property::{write_properties, StreamHeader};
use crate::storage::{CompoundFile, Container, StoragePath, NAMEID_STORAGE, NAMEID_STREAMS};

/// Settings for one build. `now` stamps every timestamp the caller did not supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub now: DateTime<Utc>,
    pub message_class: String,
    pub internet_code_page: i32,
    pub store_support_mask: i32,
    pub hide_inline_attachments: bool,
}

impl BuildOptions {
    /// Default options with an explicit build time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::from_config(&MessageConfig::default(), now)
    }

    pub fn from_config(config: &MessageConfig, now: DateTime<Utc>) -> Self {
        Self {
            now,
            message_class: config.message_class.clone(),
            internet_code_page: config.internet_code_page,
            store_support_mask: config.store_support_mask,
            hide_inline_attachments: config.hide_inline_attachments,
        }
    }
}

/// What a build produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Recipient storage names, in index order.
    pub recipient_slots: Vec<String>,
    /// Attachment storage names, in index order.
    pub attachment_slots: Vec<String>,
    /// Total attachment payload bytes.
    pub attachment_bytes: u64,
}

/// Write `msg` into `container` and commit it.
///
/// Recipients and attachments get storages in insertion order, then the
/// message's own property stream is written. A failure part-way leaves
/// whatever was already created in the container.
///
/// The progress callback receives `(attachments_done, total)`.
pub fn write_message<C: Container + ?Sized>(
    msg: Message,
    container: &mut C,
    options: &BuildOptions,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<BuildSummary> {
    let root = StoragePath::root();
    let top_level = message::message_properties(&msg, options);
    let recipient_count = slot_index(msg.recipients.len())?;
    let attachment_count = slot_index(msg.attachments.len())?;

    let mut summary = BuildSummary::default();

    for (i, recip) in msg.recipients.iter().enumerate() {
        let name = recipient::write_recipient(container, &root, slot_index(i)?, recip)?;
        summary.recipient_slots.push(name);
    }

    let total = msg.attachments.len();
    for (i, att) in msg.attachments.into_iter().enumerate() {
        if let Some(cb) = progress {
            cb(i, total);
        }
        let (name, size) =
            attachment::write_attachment(container, &root, slot_index(i)?, att, options)?;
        summary.attachment_slots.push(name);
        summary.attachment_bytes += size;
    }
    if let Some(cb) = progress {
        cb(total, total);
    }

    let nameid = container.create_storage(&root, NAMEID_STORAGE)?;
    for stream in NAMEID_STREAMS {
        container.write_stream(&nameid, stream, &[])?;
    }

    let header = StreamHeader::TopLevel {
        next_recipient_id: recipient_count,
        next_attachment_id: attachment_count,
        recipient_count,
        attachment_count,
    };
    write_properties(container, &root, &header, top_level)?;
    container.commit()?;

    info!(
        recipients = recipient_count,
        attachments = attachment_count,
        attachment_bytes = summary.attachment_bytes,
        "Message written"
    );
    Ok(summary)
}

/// Create a `.msg` file at `path` and write `message` into it.
///
/// The file is written in place; build to a temporary path and rename if
/// readers must never see a partial file.
pub fn save_message(
    message: Message,
    path: &Path,
    options: &BuildOptions,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<BuildSummary> {
    let mut file = CompoundFile::create(path)?;
    write_message(message, &mut file, options, progress)
}

fn slot_index(i: usize) -> Result<u32> {
    u32::try_from(i).map_err(|_| MsgError::Unsupported("more than 2^32 entities in one collection"))
}
