//! Recipient serializer.

use tracing::debug;

use crate::error::{MsgError, Result};
use crate::model::recipient::Recipient;
use crate::property::tag::*;
use crate::property::{write_properties, PropertySet, StreamHeader};
use crate::storage::{slot_name, Container, StoragePath, RECIPIENT_PREFIX};

/// `MAPI_MAILUSER` object type.
const OBJECT_TYPE_MAILUSER: i32 = 6;

/// `DT_MAILUSER` display type.
const DISPLAY_TYPE_MAILUSER: i32 = 0;

const ADDRTYPE_SMTP: &str = "SMTP";

pub fn recipient_properties(index: u32, recipient: &Recipient) -> Result<PropertySet> {
    let row_id =
        i32::try_from(index).map_err(|_| MsgError::Unsupported("recipient index beyond i32"))?;
    let mut set = PropertySet::new();
    set.push(PR_ROWID, row_id);
    set.push(PR_RECIPIENT_TYPE, recipient.kind().code());
    set.push(PR_OBJECT_TYPE, OBJECT_TYPE_MAILUSER);
    set.push(PR_DISPLAY_TYPE, DISPLAY_TYPE_MAILUSER);
    set.push(PR_DISPLAY_NAME, recipient.shown_name());
    set.push(PR_ADDRTYPE, ADDRTYPE_SMTP);
    set.push(PR_EMAIL_ADDRESS, recipient.email());
    set.push(PR_SMTP_ADDRESS, recipient.email());
    Ok(set)
}

/// Allocate the recipient's storage under `parent` and write its property stream.
pub fn write_recipient<C: Container + ?Sized>(
    container: &mut C,
    parent: &StoragePath,
    index: u32,
    recipient: &Recipient,
) -> Result<String> {
    let name = slot_name(RECIPIENT_PREFIX, index);
    let storage = container.create_storage(parent, &name)?;
    let set = recipient_properties(index, recipient)?;
    write_properties(container, &storage, &StreamHeader::Entity, set)?;
    debug!(slot = %name, email = %recipient.email(), "Recipient written");
    Ok(name)
}
