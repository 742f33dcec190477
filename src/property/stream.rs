//! Property stream encoder.
//!
//! ```text
//! __properties_version1.0
//! ┌──────────────────────────────────────┐
//! │ HEADER (32 bytes top-level, else 8)  │
//! ├──────────────────────────────────────┤
//! │ ENTRY × n (16 bytes each, LE)        │
//! │  tag: u32  (id << 16 | type code)    │
//! │  flags: u32                          │
//! │  value: [u8; 8]                      │
//! │    scalar → inline, zero-padded      │
//! │    variable → size: u32, 0: u32      │
//! └──────────────────────────────────────┘
//! __substg1.0_IIIITTTT   one per variable-width property
//! ```

use std::collections::HashSet;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::error::{MsgError, Result};
use crate::storage::{value_stream_name, Container, StoragePath, PROPERTIES_STREAM};

use super::tag::{self, PropType, PropertyTag};
use super::value::{to_filetime, utf16le, PropValue};

/// Size of one fixed property entry.
pub const ENTRY_SIZE: usize = 16;

const PROPATTR_READABLE: u32 = 0x0000_0002;
const PROPATTR_WRITABLE: u32 = 0x0000_0004;

/// Header written before the fixed entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamHeader {
    /// The message root.
    TopLevel {
        next_recipient_id: u32,
        next_attachment_id: u32,
        recipient_count: u32,
        attachment_count: u32,
    },
    /// A recipient or attachment storage.
    Entity,
}

impl StreamHeader {
    /// Header length in bytes.
    pub fn size(&self) -> usize {
        match self {
            StreamHeader::TopLevel { .. } => 32,
            StreamHeader::Entity => 8,
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(&[0u8; 8]);
        if let StreamHeader::TopLevel {
            next_recipient_id,
            next_attachment_id,
            recipient_count,
            attachment_count,
        } = *self
        {
            buf.write_u32::<LittleEndian>(next_recipient_id)?;
            buf.write_u32::<LittleEndian>(next_attachment_id)?;
            buf.write_u32::<LittleEndian>(recipient_count)?;
            buf.write_u32::<LittleEndian>(attachment_count)?;
            buf.extend_from_slice(&[0u8; 8]);
        }
        Ok(())
    }
}

/// One tagged value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub tag: PropertyTag,
    pub value: PropValue,
}

/// Ordered properties of one entity. Validation happens in [`encode`].
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    properties: Vec<Property>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: PropertyTag, value: impl Into<PropValue>) {
        self.properties.push(Property {
            tag,
            value: value.into(),
        });
    }

    /// First value stored under `tag`.
    pub fn get(&self, tag: PropertyTag) -> Option<&PropValue> {
        self.properties
            .iter()
            .find(|p| p.tag == tag)
            .map(|p| &p.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A variable-width value destined for its own stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueStream {
    pub name: String,
    pub data: Vec<u8>,
}

/// The encoded form of one property set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    /// Contents of `__properties_version1.0`.
    pub properties: Vec<u8>,
    /// Secondary value streams, in property order.
    pub values: Vec<ValueStream>,
}

/// Encode a property set into its fixed record table and value streams.
///
/// Fails on duplicate tags, tags missing from the registry and values
/// whose type does not match the tag. Binary payloads move into their
/// value streams without being copied.
pub fn encode(header: &StreamHeader, set: PropertySet) -> Result<EncodedStream> {
    let mut properties = Vec::with_capacity(header.size() + set.len() * ENTRY_SIZE);
    header.write(&mut properties)?;

    let mut seen = HashSet::new();
    let mut values = Vec::new();

    for prop in set.properties {
        check_tag(&prop.tag)?;
        if !seen.insert(prop.tag.id) {
            return Err(MsgError::DuplicateProperty {
                id: prop.tag.id,
                name: prop.tag.name,
            });
        }
        if prop.value.prop_type() != prop.tag.prop_type {
            return Err(MsgError::TypeMismatch {
                name: prop.tag.name,
                expected: prop.tag.prop_type.name(),
                found: prop.value.prop_type().name(),
            });
        }

        properties.write_u32::<LittleEndian>(prop.tag.value())?;
        properties.write_u32::<LittleEndian>(PROPATTR_READABLE | PROPATTR_WRITABLE)?;

        match prop.value {
            PropValue::Long(v) => {
                properties.write_i32::<LittleEndian>(v)?;
                properties.write_u32::<LittleEndian>(0)?;
            }
            PropValue::Boolean(v) => {
                properties.write_u16::<LittleEndian>(u16::from(v))?;
                properties.extend_from_slice(&[0u8; 6]);
            }
            PropValue::Long64(v) => properties.write_i64::<LittleEndian>(v)?,
            PropValue::Time(t) => properties.write_u64::<LittleEndian>(to_filetime(&t))?,
            PropValue::String(s) => {
                let data = utf16le(&s);
                // Size counts the implied UTF-16 terminator.
                write_variable_entry(&mut properties, &prop.tag, data.len() + 2)?;
                values.push(ValueStream {
                    name: value_stream_name(&prop.tag),
                    data,
                });
            }
            PropValue::Binary(data) => {
                write_variable_entry(&mut properties, &prop.tag, data.len())?;
                values.push(ValueStream {
                    name: value_stream_name(&prop.tag),
                    data,
                });
            }
        }
    }

    Ok(EncodedStream { properties, values })
}

/// Encode `set` and write the property stream plus its value streams under `storage`.
pub fn write_properties<C: Container + ?Sized>(
    container: &mut C,
    storage: &StoragePath,
    header: &StreamHeader,
    set: PropertySet,
) -> Result<()> {
    let count = set.len();
    let encoded = encode(header, set)?;
    for value in &encoded.values {
        container.write_stream(storage, &value.name, &value.data)?;
    }
    container.write_stream(storage, PROPERTIES_STREAM, &encoded.properties)?;
    debug!(
        storage = %storage,
        properties = count,
        value_streams = encoded.values.len(),
        "Wrote property stream"
    );
    Ok(())
}

fn check_tag(tag: &PropertyTag) -> Result<()> {
    let known = tag::lookup(tag.id)?;
    if known.prop_type != tag.prop_type {
        return Err(MsgError::TypeMismatch {
            name: known.name,
            expected: known.prop_type.name(),
            found: tag.prop_type.name(),
        });
    }
    Ok(())
}

fn write_variable_entry(buf: &mut Vec<u8>, tag: &PropertyTag, size: usize) -> Result<()> {
    debug_assert!(matches!(tag.prop_type, PropType::Unicode | PropType::Binary));
    let size = u32::try_from(size).map_err(|_| MsgError::Unsupported("property value over 4 GiB"))?;
    buf.write_u32::<LittleEndian>(size)?;
    buf.write_u32::<LittleEndian>(0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::tag::*;
    use crate::storage::MemoryContainer;
    use byteorder::ReadBytesExt;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;

    /// Read back `(id, type code, value bytes)` for each fixed entry.
    fn read_entries(bytes: &[u8], header_len: usize) -> Vec<(u16, u16, [u8; 8])> {
        let body = &bytes[header_len..];
        assert_eq!(body.len() % ENTRY_SIZE, 0);
        let mut cur = Cursor::new(body);
        let mut out = Vec::new();
        while (cur.position() as usize) < body.len() {
            let tag = cur.read_u32::<LittleEndian>().unwrap();
            let flags = cur.read_u32::<LittleEndian>().unwrap();
            assert_eq!(flags, 6);
            let mut value = [0u8; 8];
            std::io::Read::read_exact(&mut cur, &mut value).unwrap();
            out.push(((tag >> 16) as u16, (tag & 0xFFFF) as u16, value));
        }
        out
    }

    fn sample_set() -> PropertySet {
        let mut set = PropertySet::new();
        set.push(PR_ATTACH_NUM, 3);
        set.push(PR_DISPLAY_NAME, "report.pdf");
        set.push(PR_ATTACH_DATA_BIN, vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        set.push(PR_HASATTACH, true);
        set.push(PR_MESSAGE_SIZE_EXTENDED, 1_i64 << 40);
        set.push(
            PR_CREATION_TIME,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        );
        set
    }

    #[test]
    fn test_entries_preserve_order_and_types() {
        let set = sample_set();
        let encoded = encode(&StreamHeader::Entity, set.clone()).unwrap();
        assert_eq!(encoded.properties.len(), 8 + set.len() * ENTRY_SIZE);

        let entries = read_entries(&encoded.properties, 8);
        let pairs: Vec<(u16, u16)> = entries.iter().map(|e| (e.0, e.1)).collect();
        let expected: Vec<(u16, u16)> = set
            .iter()
            .map(|p| (p.tag.id, p.tag.prop_type.code()))
            .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_inline_values() {
        let encoded = encode(&StreamHeader::Entity, sample_set()).unwrap();
        let entries = read_entries(&encoded.properties, 8);
        assert_eq!(entries[0].2, [3, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(entries[3].2, [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(i64::from_le_bytes(entries[4].2), 1_i64 << 40);
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(u64::from_le_bytes(entries[5].2), to_filetime(&t));
    }

    #[test]
    fn test_variable_values_go_to_value_streams() {
        let encoded = encode(&StreamHeader::Entity, sample_set()).unwrap();
        assert_eq!(encoded.values.len(), 2);

        assert_eq!(encoded.values[0].name, "__substg1.0_3001001F");
        assert_eq!(encoded.values[0].data, utf16le("report.pdf"));
        assert_eq!(encoded.values[1].name, "__substg1.0_37010102");
        assert_eq!(encoded.values[1].data, (1u8..=10).collect::<Vec<_>>());

        let entries = read_entries(&encoded.properties, 8);
        // String size includes the terminator, binary size is exact.
        assert_eq!(u32::from_le_bytes(entries[1].2[..4].try_into().unwrap()), 22);
        assert_eq!(u32::from_le_bytes(entries[2].2[..4].try_into().unwrap()), 10);
        assert_eq!(&entries[2].2[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_top_level_header() {
        let header = StreamHeader::TopLevel {
            next_recipient_id: 2,
            next_attachment_id: 1,
            recipient_count: 2,
            attachment_count: 1,
        };
        let encoded = encode(&header, PropertySet::new()).unwrap();
        assert_eq!(encoded.properties.len(), 32);
        assert_eq!(&encoded.properties[..8], &[0u8; 8]);
        assert_eq!(&encoded.properties[8..12], &2u32.to_le_bytes());
        assert_eq!(&encoded.properties[12..16], &1u32.to_le_bytes());
        assert_eq!(&encoded.properties[16..20], &2u32.to_le_bytes());
        assert_eq!(&encoded.properties[20..24], &1u32.to_le_bytes());
        assert_eq!(&encoded.properties[24..], &[0u8; 8]);
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut set = PropertySet::new();
        set.push(PR_SUBJECT, "a");
        set.push(PR_SUBJECT, "b");
        let err = encode(&StreamHeader::Entity, set).unwrap_err();
        assert!(matches!(err, MsgError::DuplicateProperty { id: 0x0037, .. }));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut set = PropertySet::new();
        set.push(PR_ATTACH_SIZE, "ten");
        let err = encode(&StreamHeader::Entity, set).unwrap_err();
        assert!(matches!(
            err,
            MsgError::TypeMismatch {
                expected: "PT_LONG",
                found: "PT_UNICODE",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut set = PropertySet::new();
        set.push(PropertyTag::new(0x6666, PropType::Long, "PR_MADE_UP"), 1);
        let err = encode(&StreamHeader::Entity, set).unwrap_err();
        assert!(matches!(err, MsgError::UnknownProperty(0x6666)));
    }

    #[test]
    fn test_tag_type_disagreeing_with_registry_rejected() {
        let mut set = PropertySet::new();
        set.push(PropertyTag::new(0x0037, PropType::Long, "PR_SUBJECT"), 1);
        let err = encode(&StreamHeader::Entity, set).unwrap_err();
        assert!(matches!(
            err,
            MsgError::TypeMismatch {
                name: "PR_SUBJECT",
                expected: "PT_UNICODE",
                found: "PT_LONG",
            }
        ));
    }

    #[test]
    fn test_write_properties_creates_streams() {
        let mut container = MemoryContainer::new();
        let root = StoragePath::root();
        write_properties(&mut container, &root, &StreamHeader::Entity, sample_set()).unwrap();

        assert!(container.stream(&root, PROPERTIES_STREAM).is_some());
        assert_eq!(
            container.stream(&root, "__substg1.0_37010102").unwrap(),
            &(1u8..=10).collect::<Vec<_>>()[..]
        );
        assert_eq!(container.streams_in(&root).count(), 3);
    }
}
