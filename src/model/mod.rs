//! Core data model: messages, recipients and attachments.

pub mod attachment;
pub mod message;
pub mod recipient;

pub use attachment::{AttachKind, Attachment, AttachmentBuilder, AttachmentMeta, Attachments};
pub use message::{Importance, Message, Sender};
pub use recipient::{Recipient, RecipientKind, Recipients};
