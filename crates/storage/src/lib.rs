//! Storage backend for rekorder log files
//!
//! This crate provides the file-backed byte regions the writer and reader
//! work on:
//! - GrowableMmap: read/write mapping over a sparsely preallocated file that
//!   grows geometrically on demand
//! - MappedFile: read-only mapping of a finished log
//! - FlushPolicy: when the writer syncs mapped bytes to disk

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod durability;
pub mod mmap;

pub use durability::FlushPolicy;
pub use mmap::{GrowableMmap, MappedFile};
