//! Container cursor abstraction.
//!
//! A cursor walks the directories of an opened slide one at a time and
//! hands out tiles of the current directory, either as the raw bytes stored
//! in the file or decoded to a raster. The validation engine only talks to
//! this trait, so tests can drive it with an instrumented cursor.
//!
//! Closing is dropping: the file handle and any cached tables go away with
//! the cursor.

mod tiff_cursor;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

pub use tiff_cursor::{TiffCursor, MAX_DIRECTORIES};

#[async_trait]
pub trait ContainerCursor: Send {
    /// Compression code of the current directory, if the tag is present.
    fn compression(&self) -> Option<u16>;

    /// Whether the current directory is tile-organized.
    fn is_tiled(&self) -> bool;

    /// Bytes needed to hold one decoded tile; 0 means unusable.
    fn tile_buffer_size(&self) -> u64;

    /// Number of tiles in the current directory.
    fn tile_count(&self) -> u32;

    /// Decode tile `index` into `buf`, returning the number of bytes written.
    async fn read_encoded_tile(&mut self, index: u32, buf: &mut [u8]) -> Result<usize, FetchError>;

    /// Tile `index` exactly as stored in the file.
    async fn read_raw_tile(&mut self, index: u32) -> Result<Bytes, FetchError>;

    /// The current directory's JPEGTables blob, if any.
    async fn jpeg_tables(&mut self) -> Result<Option<Bytes>, FetchError>;

    /// Move to the next directory. Returns false when there is none.
    async fn advance_directory(&mut self) -> bool;
}
