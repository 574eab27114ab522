//! Memory-mapped file regions.

mod growable;
mod mapped;

pub use growable::GrowableMmap;
pub use mapped::MappedFile;
