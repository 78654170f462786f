//! # WSI Validator
//!
//! A fast pre-flight check for JPEG tile corruption in Whole Slide Images.
//!
//! Pathology slides are stored as tiled TIFF/SVS pyramids that routinely
//! run into gigabytes. A single damaged tile will abort hours of downstream
//! processing, so this crate walks the pyramid ahead of time and decodes
//! every JPEG tile, reporting the first one that fails. It produces no
//! pixels; the output is a verdict and a message.
//!
//! ## Architecture
//!
//! - [`io`] - Positioned reads over local files
//! - [`mod@format`] - TIFF/BigTIFF parsing and JPEG stream preparation
//! - [`container`] - Directory/tile cursor over an opened slide
//! - [`tile`] - JPEG codec wrapper
//! - [`validate`] - Chunk validator, traversal engine and entry points
//! - [`config`] / [`report`] - CLI options and per-file output
//!
//! ## Example
//!
//! ```rust,no_run
//! let (is_valid, message) = wsi_validator::check_file("slide.svs", true);
//! if !is_valid {
//!     eprintln!("corrupt slide: {message}");
//! }
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod format;
pub mod io;
pub mod report;
pub mod tile;
pub mod validate;

pub use config::{Config, OutputFormat};
pub use container::{ContainerCursor, TiffCursor};
pub use error::{FetchError, IoError, TiffError, TileError};
pub use io::{LocalFileReader, RangeReader};
pub use report::FileReport;
pub use tile::JpegTileDecoder;
pub use validate::{
    check_file, check_file_with, check_slide, ChunkValidator, DecodeStrategy, FaultKind,
    TileLocation, ValidateOptions, ValidationEngine, Verdict,
};
