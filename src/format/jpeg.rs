//! JPEG markers and JPEGTables merging.
//!
//! Tiled JPEG TIFFs (Aperio SVS in particular) usually store each tile as an
//! abbreviated stream: SOI, frame header, scan, EOI, with some or all of
//! the quantization and Huffman tables left out. The tables live once per
//! directory in the `JPEGTables` tag, itself a tiny SOI..EOI stream. Before
//! a tile can be decoded the two are spliced:
//!
//! ```text
//! tables: SOI DQT DHT EOI        tile: SOI SOF SOS <data> EOI
//! merged: SOI DQT DHT SOF SOS <data> EOI
//! ```
//!
//! Tables the tile defines itself come later in the merged stream and
//! replace the directory's.

use bytes::{Bytes, BytesMut};

pub const SOI: [u8; 2] = [0xFF, 0xD8];
pub const EOI: [u8; 2] = [0xFF, 0xD9];

// =============================================================================
// Merging
// =============================================================================

/// Splice a JPEGTables blob in front of an abbreviated tile.
///
/// Drops the trailing EOI of `tables` and the leading SOI of `tile_data`.
pub fn merge_jpeg_tables(tables: &[u8], tile_data: &[u8]) -> Bytes {
    if tables.is_empty() {
        return Bytes::copy_from_slice(tile_data);
    }
    if tile_data.is_empty() {
        return Bytes::new();
    }

    let tables = tables.strip_suffix(&EOI).unwrap_or(tables);
    let tile = tile_data.strip_prefix(&SOI).unwrap_or(tile_data);

    let mut merged = BytesMut::with_capacity(tables.len() + tile.len());
    merged.extend_from_slice(tables);
    merged.extend_from_slice(tile);
    merged.freeze()
}

/// Produce the byte stream a JPEG codec should see for one tile.
///
/// Any tile that starts with SOI gets the directory's tables in front,
/// whether or not it carries tables of its own. Anything else passes
/// through untouched so the codec can report on it.
pub fn prepare_tile_jpeg(tables: Option<&[u8]>, tile_data: &[u8]) -> Bytes {
    match tables {
        Some(tables) if tile_data.starts_with(&SOI) => merge_jpeg_tables(tables, tile_data),
        _ => Bytes::copy_from_slice(tile_data),
    }
}
