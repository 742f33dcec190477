//! MAPI properties: tag registry, typed values and the property stream encoder.

pub mod stream;
pub mod tag;
pub mod value;

pub use stream::{encode, write_properties, PropertySet, StreamHeader};
pub use tag::{lookup, PropType, PropertyTag};
pub use value::PropValue;
