//! Tile decoding.
//!
//! [`JpegTileDecoder`] is the single JPEG codec entry point. The container
//! cursor uses it to decode tiles to a raster, and the chunk validator uses
//! it to verify raw chunks.

mod decoder;

pub use decoder::{bounded_message, JpegTileDecoder, DEFAULT_MAX_DECODE_BYTES, MAX_MESSAGE_CHARS};
