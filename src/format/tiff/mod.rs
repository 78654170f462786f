//! TIFF and BigTIFF container parsing.
//!
//! Classic TIFF uses 32-bit offsets and BigTIFF 64-bit ones; both byte
//! orders are supported. Whole-slide files chain one IFD per pyramid level
//! (plus label and macro images). Small tag values sit inline in their
//! entry, larger ones at an offset the entry points to.

mod directory;
mod parser;
mod tags;
mod values;

pub use directory::{read_ifd, TiffDirectory, TileTable};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{Compression, FieldType, TiffTag};
pub use values::{parse_u64_array, ValueReader};
