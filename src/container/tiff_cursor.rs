use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

use super::ContainerCursor;
use crate::error::{FetchError, TiffError};
use crate::format::jpeg::prepare_tile_jpeg;
use crate::format::tiff::{TiffDirectory, TiffHeader, TileTable, BIGTIFF_HEADER_SIZE};
use crate::io::{LocalFileReader, RangeReader};
use crate::tile::JpegTileDecoder;

/// Longest IFD chain the cursor will follow.
pub const MAX_DIRECTORIES: usize = 1024;

/// Cursor over the IFD chain of a TIFF or BigTIFF file.
///
/// Opening reads the header and the first directory. Tile tables and
/// JPEGTables are fetched the first time a tile of the directory is asked
/// for, and dropped when the cursor advances.
pub struct TiffCursor<R: RangeReader> {
    reader: R,
    header: TiffHeader,
    directory: TiffDirectory,
    tiles: Option<TileTable>,
    tables: Option<Option<Bytes>>,
    visited: HashSet<u64>,
    decoder: JpegTileDecoder,
}

impl TiffCursor<LocalFileReader> {
    /// Open a slide on the local filesystem.
    pub async fn open_path(
        path: impl AsRef<Path>,
        decoder: JpegTileDecoder,
    ) -> Result<Self, TiffError> {
        let reader = LocalFileReader::open(path).await?;
        Self::open(reader, decoder).await
    }
}

impl<R: RangeReader> TiffCursor<R> {
    /// Parse the header and position the cursor on directory 0.
    pub async fn open(reader: R, decoder: JpegTileDecoder) -> Result<Self, TiffError> {
        let header_len = reader.size().min(BIGTIFF_HEADER_SIZE as u64) as usize;
        let header_bytes = reader.read_exact_at(0, header_len).await?;
        let header = TiffHeader::parse(&header_bytes, reader.size())?;

        let directory = TiffDirectory::load(&reader, &header, header.first_ifd_offset, 0).await?;

        debug!(
            file = reader.identifier(),
            bigtiff = header.is_bigtiff,
            byte_order = ?header.byte_order,
            "Opened TIFF container"
        );

        let mut visited = HashSet::new();
        visited.insert(header.first_ifd_offset);

        Ok(Self {
            reader,
            header,
            directory,
            tiles: None,
            tables: None,
            visited,
            decoder,
        })
    }

    /// The directory the cursor is positioned on.
    pub fn directory(&self) -> &TiffDirectory {
        &self.directory
    }

    async fn tile_location(&mut self, index: u32) -> Result<(u64, u64), FetchError> {
        let table = match self.tiles.take() {
            Some(table) => table,
            None => TileTable::load(&self.reader, &self.header, &self.directory).await?,
        };
        let location = table.location(index);
        let count = table.len();
        self.tiles = Some(table);

        location.ok_or(FetchError::TileOutOfRange { index, count })
    }
}

#[async_trait]
impl<R: RangeReader> ContainerCursor for TiffCursor<R> {
    fn compression(&self) -> Option<u16> {
        self.directory.compression
    }

    fn is_tiled(&self) -> bool {
        self.directory.is_tiled()
    }

    fn tile_buffer_size(&self) -> u64 {
        self.directory.tile_buffer_size()
    }

    fn tile_count(&self) -> u32 {
        self.directory.tile_count()
    }

    async fn read_encoded_tile(&mut self, index: u32, buf: &mut [u8]) -> Result<usize, FetchError> {
        let raw = self.read_raw_tile(index).await?;
        let tables = self.jpeg_tables().await?;
        let stream = prepare_tile_jpeg(tables.as_deref(), &raw);
        Ok(self.decoder.decode_into(&stream, buf)?)
    }

    async fn read_raw_tile(&mut self, index: u32) -> Result<Bytes, FetchError> {
        let (offset, byte_count) = self.tile_location(index).await?;
        trace!(
            directory = self.directory.index,
            tile = index,
            offset,
            byte_count,
            "Reading tile"
        );

        let len = usize::try_from(byte_count).map_err(|_| TiffError::InvalidTagValue {
            tag: "TileByteCounts",
            message: format!("tile {} claims {} bytes", index, byte_count),
        })?;
        Ok(self.reader.read_exact_at(offset, len).await?)
    }

    async fn jpeg_tables(&mut self) -> Result<Option<Bytes>, FetchError> {
        if let Some(tables) = &self.tables {
            return Ok(tables.clone());
        }
        let tables = self
            .directory
            .load_jpeg_tables(&self.reader, &self.header)
            .await?;
        self.tables = Some(tables.clone());
        Ok(tables)
    }

    async fn advance_directory(&mut self) -> bool {
        let next = self.directory.next_ifd_offset();
        if next == 0 {
            return false;
        }
        if self.visited.len() >= MAX_DIRECTORIES {
            debug!(
                file = self.reader.identifier(),
                limit = MAX_DIRECTORIES,
                "Directory limit reached"
            );
            return false;
        }
        if !self.visited.insert(next) {
            debug!(
                file = self.reader.identifier(),
                error = %TiffError::IfdLoop(next),
                "Stopping directory traversal"
            );
            return false;
        }

        let index = self.directory.index + 1;
        match TiffDirectory::load(&self.reader, &self.header, next, index).await {
            Ok(directory) => {
                self.directory = directory;
                self.tiles = None;
                self.tables = None;
                true
            }
            Err(e) => {
                debug!(
                    file = self.reader.identifier(),
                    directory = index,
                    offset = next,
                    error = %e,
                    "Unreadable directory ends traversal"
                );
                false
            }
        }
    }
}
