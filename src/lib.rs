//! `msgforge`: write Outlook-compatible `.msg` files.
//!
//! This crate provides the property-and-storage engine: a registry of MAPI
//! property tags, the property stream encoder, validated recipient and
//! attachment collections, and the assembler that lays them out inside a
//! compound file.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod property;
pub mod storage;
pub mod writer;
