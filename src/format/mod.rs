//! Container and bitstream formats.
//!
//! [`tiff`] parses the TIFF/BigTIFF structure of a slide; [`jpeg`] prepares
//! each tile's JPEG stream for the codec.

pub mod jpeg;
pub mod tiff;
