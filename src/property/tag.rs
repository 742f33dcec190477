//! Property tags and the registry of well-known MAPI properties.
//!
//! The numeric ids and type codes below are a wire contract with every
//! `.msg` reader and must never be renumbered.

use crate::error::{MsgError, Result};

/// MAPI property value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropType {
    /// `PT_LONG`: signed 32-bit integer.
    Long,
    /// `PT_BOOLEAN`: 16-bit boolean.
    Boolean,
    /// `PT_I8`: signed 64-bit integer.
    Long64,
    /// `PT_UNICODE`: UTF-16LE string.
    Unicode,
    /// `PT_SYSTIME`: FILETIME (100 ns ticks since 1601-01-01 UTC).
    SysTime,
    /// `PT_BINARY`: opaque byte array.
    Binary,
}

/// Storage width class of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthClass {
    /// Up to 32 bits, stored inline.
    Scalar,
    /// 64-bit integer, stored inline.
    Wide,
    /// 64-bit FILETIME, stored inline.
    Timestamp,
    /// Variable-length bytes, stored in a value stream.
    VariableBinary,
    /// Variable-length string, stored in a value stream.
    VariableString,
}

impl PropType {
    /// The on-disk type code.
    pub const fn code(self) -> u16 {
        match self {
            PropType::Long => 0x0003,
            PropType::Boolean => 0x000B,
            PropType::Long64 => 0x0014,
            PropType::Unicode => 0x001F,
            PropType::SysTime => 0x0040,
            PropType::Binary => 0x0102,
        }
    }

    /// Resolve a type code back to a [`PropType`].
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0003 => Some(PropType::Long),
            0x000B => Some(PropType::Boolean),
            0x0014 => Some(PropType::Long64),
            0x001F => Some(PropType::Unicode),
            0x0040 => Some(PropType::SysTime),
            0x0102 => Some(PropType::Binary),
            _ => None,
        }
    }

    pub const fn width_class(self) -> WidthClass {
        match self {
            PropType::Long | PropType::Boolean => WidthClass::Scalar,
            PropType::Long64 => WidthClass::Wide,
            PropType::SysTime => WidthClass::Timestamp,
            PropType::Binary => WidthClass::VariableBinary,
            PropType::Unicode => WidthClass::VariableString,
        }
    }

    /// `true` if values of this type live in their own value stream.
    pub const fn is_variable(self) -> bool {
        matches!(
            self.width_class(),
            WidthClass::VariableBinary | WidthClass::VariableString
        )
    }

    /// Short name used in error messages and listings.
    pub const fn name(self) -> &'static str {
        match self {
            PropType::Long => "PT_LONG",
            PropType::Boolean => "PT_BOOLEAN",
            PropType::Long64 => "PT_I8",
            PropType::Unicode => "PT_UNICODE",
            PropType::SysTime => "PT_SYSTIME",
            PropType::Binary => "PT_BINARY",
        }
    }
}

/// Identifies one property slot: id, declared value type and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyTag {
    pub id: u16,
    pub prop_type: PropType,
    pub name: &'static str,
}

impl PropertyTag {
    pub const fn new(id: u16, prop_type: PropType, name: &'static str) -> Self {
        Self {
            id,
            prop_type,
            name,
        }
    }

    /// The 32-bit tag as written on disk: id in the high word, type code in the low word.
    pub const fn value(&self) -> u32 {
        ((self.id as u32) << 16) | self.prop_type.code() as u32
    }
}

macro_rules! tags {
    ($($name:ident = $id:literal, $ty:ident;)*) => {
        $(pub const $name: PropertyTag = PropertyTag::new($id, PropType::$ty, stringify!($name));)*

        /// Every known tag, sorted by id.
        pub static REGISTRY: &[PropertyTag] = &[$($name),*];
    };
}

tags! {
    PR_IMPORTANCE = 0x0017, Long;
    PR_MESSAGE_CLASS = 0x001A, Unicode;
    PR_SUBJECT = 0x0037, Unicode;
    PR_CLIENT_SUBMIT_TIME = 0x0039, SysTime;
    PR_SENT_REPRESENTING_NAME = 0x0042, Unicode;
    PR_SENT_REPRESENTING_EMAIL_ADDRESS = 0x0065, Unicode;
    PR_CONVERSATION_TOPIC = 0x0070, Unicode;
    PR_RECIPIENT_TYPE = 0x0C15, Long;
    PR_SENDER_NAME = 0x0C1A, Unicode;
    PR_SENDER_ADDRTYPE = 0x0C1E, Unicode;
    PR_SENDER_EMAIL_ADDRESS = 0x0C1F, Unicode;
    PR_DISPLAY_BCC = 0x0E02, Unicode;
    PR_DISPLAY_CC = 0x0E03, Unicode;
    PR_DISPLAY_TO = 0x0E04, Unicode;
    PR_MESSAGE_DELIVERY_TIME = 0x0E06, SysTime;
    PR_MESSAGE_FLAGS = 0x0E07, Long;
    PR_MESSAGE_SIZE_EXTENDED = 0x0E08, Long64;
    PR_HASATTACH = 0x0E1B, Boolean;
    PR_ATTACH_SIZE = 0x0E20, Long;
    PR_ATTACH_NUM = 0x0E21, Long;
    PR_RECORD_KEY = 0x0FF9, Binary;
    PR_OBJECT_TYPE = 0x0FFE, Long;
    PR_BODY = 0x1000, Unicode;
    PR_BODY_HTML = 0x1013, Binary;
    PR_INTERNET_MESSAGE_ID = 0x1035, Unicode;
    PR_ROWID = 0x3000, Long;
    PR_DISPLAY_NAME = 0x3001, Unicode;
    PR_ADDRTYPE = 0x3002, Unicode;
    PR_EMAIL_ADDRESS = 0x3003, Unicode;
    PR_CREATION_TIME = 0x3007, SysTime;
    PR_LAST_MODIFICATION_TIME = 0x3008, SysTime;
    PR_STORE_SUPPORT_MASK = 0x340D, Long;
    PR_ATTACH_DATA_BIN = 0x3701, Binary;
    PR_ATTACH_EXTENSION = 0x3703, Unicode;
    PR_ATTACH_FILENAME = 0x3704, Unicode;
    PR_ATTACH_METHOD = 0x3705, Long;
    PR_ATTACH_LONG_FILENAME = 0x3707, Unicode;
    PR_RENDERING_POSITION = 0x370B, Long;
    PR_ATTACH_MIME_TAG = 0x370E, Unicode;
    PR_ATTACH_CONTENT_ID = 0x3712, Unicode;
    PR_DISPLAY_TYPE = 0x3900, Long;
    PR_SMTP_ADDRESS = 0x39FE, Unicode;
    PR_INTERNET_CPID = 0x3FDE, Long;
    PR_ATTACHMENT_HIDDEN = 0x7FFE, Boolean;
}

/// Look up a well-known tag by property id.
pub fn lookup(id: u16) -> Result<PropertyTag> {
    REGISTRY
        .binary_search_by_key(&id, |t| t.id)
        .map(|pos| REGISTRY[pos])
        .map_err(|_| MsgError::UnknownProperty(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_sorted_and_unique() {
        for pair in REGISTRY.windows(2) {
            assert!(
                pair[0].id < pair[1].id,
                "{} must sort before {}",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_lookup_known() {
        let tag = lookup(0x3701).unwrap();
        assert_eq!(tag, PR_ATTACH_DATA_BIN);
        assert_eq!(tag.name, "PR_ATTACH_DATA_BIN");
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(matches!(lookup(0x1234), Err(MsgError::UnknownProperty(0x1234))));
    }

    #[test]
    fn test_tag_value() {
        assert_eq!(PR_SUBJECT.value(), 0x0037_001F);
        assert_eq!(PR_ATTACH_DATA_BIN.value(), 0x3701_0102);
    }

    #[test]
    fn test_type_code_mapping_is_stable() {
        for ty in [
            PropType::Long,
            PropType::Boolean,
            PropType::Long64,
            PropType::Unicode,
            PropType::SysTime,
            PropType::Binary,
        ] {
            assert_eq!(PropType::from_code(ty.code()), Some(ty));
        }
        assert!(PropType::Unicode.is_variable());
        assert!(PropType::Binary.is_variable());
        assert!(!PropType::SysTime.is_variable());
        assert!(!PropType::Long64.is_variable());
    }
}
