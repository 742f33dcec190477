//! Attachment serializer.

use tracing::debug;

use crate::error::{MsgError, Result};
use crate::model::attachment::{Attachment, AttachmentMeta};
use crate::property::tag::*;
use crate::property::{write_properties, PropertySet, StreamHeader};
use crate::storage::{slot_name, Container, StoragePath, ATTACHMENT_PREFIX};

use super::BuildOptions;

/// `MAPI_ATTACH` object type.
const OBJECT_TYPE_ATTACHMENT: i32 = 7;

/// Rendering position meaning "not rendered in the body".
const RENDERING_POSITION_NONE: i32 = -1;

/// Build the property set for the attachment at `index`.
///
/// Timestamps come from the attachment when the caller supplied them,
/// otherwise from the build time in `options`.
pub fn attachment_properties(
    index: u32,
    meta: &AttachmentMeta,
    data: Vec<u8>,
    options: &BuildOptions,
) -> Result<PropertySet> {
    let size = i32::try_from(data.len())
        .map_err(|_| MsgError::Unsupported("attachment larger than 2 GiB"))?;
    let attach_num =
        i32::try_from(index).map_err(|_| MsgError::Unsupported("attachment index beyond i32"))?;
    let created = meta.creation_time.unwrap_or(options.now);
    let modified = meta.last_modification_time.unwrap_or(options.now);

    let mut set = PropertySet::new();
    set.push(PR_ATTACH_NUM, attach_num);
    set.push(PR_RECORD_KEY, index.to_le_bytes().to_vec());
    set.push(PR_OBJECT_TYPE, OBJECT_TYPE_ATTACHMENT);
    set.push(PR_DISPLAY_NAME, meta.file_name.as_str());
    set.push(PR_ATTACH_FILENAME, meta.file_name.as_str());
    set.push(PR_ATTACH_LONG_FILENAME, meta.file_name.as_str());
    if let Some(ext) = meta.extension() {
        set.push(PR_ATTACH_EXTENSION, ext);
    }
    set.push(PR_ATTACH_METHOD, meta.kind.method());
    set.push(PR_ATTACH_SIZE, size);
    set.push(PR_ATTACH_DATA_BIN, data);
    set.push(PR_RENDERING_POSITION, RENDERING_POSITION_NONE);
    set.push(PR_CREATION_TIME, created);
    set.push(PR_LAST_MODIFICATION_TIME, modified);
    if let Some(mime) = &meta.mime_type {
        set.push(PR_ATTACH_MIME_TAG, mime.as_str());
    }
    if let Some(cid) = &meta.content_id {
        set.push(PR_ATTACH_CONTENT_ID, cid.as_str());
    }
    if meta.is_inline && options.hide_inline_attachments {
        set.push(PR_ATTACHMENT_HIDDEN, true);
    }
    Ok(set)
}

/// Allocate the attachment's storage under `parent`, read its payload and
/// write its property stream. Returns the slot name and payload size.
pub fn write_attachment<C: Container + ?Sized>(
    container: &mut C,
    parent: &StoragePath,
    index: u32,
    attachment: Attachment,
    options: &BuildOptions,
) -> Result<(String, u64)> {
    let name = slot_name(ATTACHMENT_PREFIX, index);
    let storage = container.create_storage(parent, &name)?;

    let (meta, data) = attachment.read_data()?;
    let size = data.len() as u64;
    let set = attachment_properties(index, &meta, data, options)?;
    write_properties(container, &storage, &StreamHeader::Entity, set)?;

    debug!(slot = %name, file = %meta.file_name, bytes = size, "Attachment written");
    Ok((name, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::AttachmentBuilder;
    use crate::property::PropValue;
    use crate::storage::{MemoryContainer, PROPERTIES_STREAM};
    use chrono::{TimeZone, Utc};

    fn options() -> BuildOptions {
        BuildOptions::new(Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap())
    }

    fn meta(att: Attachment) -> (AttachmentMeta, Vec<u8>) {
        att.read_data().unwrap()
    }

    #[test]
    fn test_report_pdf_properties() {
        let att = AttachmentBuilder::new("report.pdf")
            .bytes(vec![0u8; 10])
            .build()
            .unwrap();
        let (meta, data) = meta(att);
        let set = attachment_properties(0, &meta, data, &options()).unwrap();

        assert_eq!(set.get(PR_ATTACH_SIZE), Some(&PropValue::Long(10)));
        assert_eq!(
            set.get(PR_DISPLAY_NAME),
            Some(&PropValue::String("report.pdf".into()))
        );
        assert_eq!(
            set.get(PR_ATTACH_EXTENSION),
            Some(&PropValue::String("pdf".into()))
        );
        assert_eq!(set.get(PR_ATTACH_METHOD), Some(&PropValue::Long(1)));
        assert_eq!(set.get(PR_ATTACH_DATA_BIN), Some(&PropValue::Binary(vec![0u8; 10])));
        assert_eq!(set.get(PR_ATTACH_NUM), Some(&PropValue::Long(0)));
    }

    #[test]
    fn test_no_extension_property_without_extension() {
        let att = AttachmentBuilder::new("Makefile").bytes(vec![1]).build().unwrap();
        let (meta, data) = meta(att);
        let set = attachment_properties(3, &meta, data, &options()).unwrap();
        assert!(set.get(PR_ATTACH_EXTENSION).is_none());
        assert_eq!(set.get(PR_RECORD_KEY), Some(&PropValue::Binary(vec![3, 0, 0, 0])));
    }

    #[test]
    fn test_attach_num_beyond_i32_rejected() {
        let att = AttachmentBuilder::new("a.txt").bytes(vec![1]).build().unwrap();
        let (m, d) = meta(att);
        let err = attachment_properties(u32::MAX, &m, d, &options()).unwrap_err();
        assert!(matches!(err, MsgError::Unsupported(_)));
    }

    #[test]
    fn test_timestamps_use_build_time_unless_supplied() {
        let opts = options();
        let att = AttachmentBuilder::new("a.txt").bytes(vec![1]).build().unwrap();
        let (m, d) = meta(att);
        let set = attachment_properties(0, &m, d, &opts).unwrap();
        assert_eq!(set.get(PR_CREATION_TIME), Some(&PropValue::Time(opts.now)));
        assert_eq!(set.get(PR_LAST_MODIFICATION_TIME), Some(&PropValue::Time(opts.now)));

        let modified = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let att = AttachmentBuilder::new("b.txt")
            .bytes(vec![1])
            .last_modification_time(modified)
            .build()
            .unwrap();
        let (m, d) = meta(att);
        let set = attachment_properties(0, &m, d, &opts).unwrap();
        assert_eq!(set.get(PR_CREATION_TIME), Some(&PropValue::Time(opts.now)));
        assert_eq!(set.get(PR_LAST_MODIFICATION_TIME), Some(&PropValue::Time(modified)));
    }

    #[test]
    fn test_inline_properties() {
        let att = AttachmentBuilder::new("logo.png")
            .bytes(vec![1, 2])
            .inline(Some("logo@cid"))
            .mime_type("image/png")
            .build()
            .unwrap();
        let (m, d) = meta(att);
        let set = attachment_properties(0, &m, d, &options()).unwrap();
        assert_eq!(
            set.get(PR_ATTACH_CONTENT_ID),
            Some(&PropValue::String("logo@cid".into()))
        );
        assert_eq!(
            set.get(PR_ATTACH_MIME_TAG),
            Some(&PropValue::String("image/png".into()))
        );
        assert_eq!(set.get(PR_ATTACHMENT_HIDDEN), Some(&PropValue::Boolean(true)));

        let mut opts = options();
        opts.hide_inline_attachments = false;
        let att = AttachmentBuilder::new("logo.png")
            .bytes(vec![1, 2])
            .inline(Some("logo@cid"))
            .build()
            .unwrap();
        let (m, d) = meta(att);
        let set = attachment_properties(0, &m, d, &opts).unwrap();
        assert!(set.get(PR_ATTACHMENT_HIDDEN).is_none());
    }

    #[test]
    fn test_write_attachment_creates_slot() {
        let mut c = MemoryContainer::new();
        let root = StoragePath::root();
        let att = AttachmentBuilder::new("report.pdf")
            .bytes(b"0123456789".to_vec())
            .build()
            .unwrap();
        let (name, size) = write_attachment(&mut c, &root, 255, att, &options()).unwrap();
        assert_eq!(name, "__attach_version1.0_#000000FF");
        assert_eq!(size, 10);

        let slot = root.child(&name);
        assert!(c.stream(&slot, PROPERTIES_STREAM).is_some());
        assert_eq!(
            c.stream(&slot, "__substg1.0_37010102"),
            Some(&b"0123456789"[..])
        );
    }

    #[test]
    fn test_unreadable_source_is_read_error() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
            }
        }
        let mut c = MemoryContainer::new();
        let att = AttachmentBuilder::new("x.bin").reader(Broken).build().unwrap();
        let err = write_attachment(&mut c, &StoragePath::root(), 0, att, &options()).unwrap_err();
        assert!(matches!(err, MsgError::AttachmentRead { ref name, .. } if name == "x.bin"));
    }
}
