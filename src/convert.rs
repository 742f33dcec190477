//! EML ↔ MSG conversion front door.
//!
//! Neither direction is implemented; both report
//! [`MsgError::Unsupported`] so callers can tell "not available" apart
//! from a failed conversion.

use std::io::{Read, Write};

use crate::error::{MsgError, Result};

/// Convert an RFC 5322 message into `.msg`.
pub fn eml_to_msg<R: Read, W: Write>(_eml: R, _msg: W) -> Result<()> {
    Err(MsgError::Unsupported("EML to MSG conversion"))
}

/// Convert a `.msg` file into an RFC 5322 message.
pub fn msg_to_eml<R: Read, W: Write>(_msg: R, _eml: W) -> Result<()> {
    Err(MsgError::Unsupported("MSG to EML conversion"))
}
