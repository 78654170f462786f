//! Directory and tile traversal.
//!
//! The engine walks directories in file order and tiles in index order,
//! stopping at the first fault. Which directories are checked:
//!
//! - compression is JPEG (7) or old-style JPEG (6)
//! - the directory is tiled
//! - one decoded tile fits in a buffer no larger than `max_decode_bytes`
//!
//! Anything else is skipped without affecting the verdict.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::container::{ContainerCursor, TiffCursor};
use crate::error::FetchError;
use crate::format::jpeg::prepare_tile_jpeg;
use crate::format::tiff::Compression;
use crate::tile::{JpegTileDecoder, DEFAULT_MAX_DECODE_BYTES};

use super::chunk::ChunkValidator;
use super::verdict::{FaultKind, TileLocation, Verdict};

/// Message for files that cannot be opened as TIFF containers.
pub const OPEN_FAILURE_MESSAGE: &str = "Cannot open file";

/// How each tile is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DecodeStrategy {
    /// Pull the stored chunk and verify it with the chunk validator
    #[default]
    RawChunk,
    /// Have the container decode each tile to a raster
    DecodeTile,
}

/// Knobs for one validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Stop after directory 0
    pub level_zero_only: bool,
    pub strategy: DecodeStrategy,
    /// Largest decoded tile or frame the engine will allocate for
    pub max_decode_bytes: u64,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            level_zero_only: true,
            strategy: DecodeStrategy::default(),
            max_decode_bytes: DEFAULT_MAX_DECODE_BYTES,
        }
    }
}

impl ValidateOptions {
    pub fn all_levels() -> Self {
        Self {
            level_zero_only: false,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: DecodeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn decoder(&self) -> JpegTileDecoder {
        JpegTileDecoder::new(self.max_decode_bytes)
    }
}

/// Drives a [`ContainerCursor`] to a [`Verdict`].
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    options: ValidateOptions,
    chunks: ChunkValidator,
}

impl ValidationEngine {
    pub fn new(options: ValidateOptions) -> Self {
        let chunks = ChunkValidator::new(options.decoder());
        Self { options, chunks }
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    /// Open `path` and validate it.
    pub async fn check_path(&self, path: impl AsRef<Path>) -> Verdict {
        let path = path.as_ref();
        match TiffCursor::open_path(path, self.options.decoder()).await {
            Ok(cursor) => self.validate(cursor).await,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to open container");
                Verdict::invalid(FaultKind::OpenFailure, OPEN_FAILURE_MESSAGE)
            }
        }
    }

    /// Validate an opened container. The cursor is dropped before returning.
    pub async fn validate<C: ContainerCursor>(&self, mut cursor: C) -> Verdict {
        let mut directory = 0usize;
        loop {
            if let Err(fault) = self.validate_directory(&mut cursor, directory).await {
                return fault;
            }
            if self.options.level_zero_only || !cursor.advance_directory().await {
                break;
            }
            directory += 1;
        }
        Verdict::valid()
    }

    async fn validate_directory<C: ContainerCursor>(
        &self,
        cursor: &mut C,
        directory: usize,
    ) -> Result<(), Verdict> {
        let compression = cursor.compression();
        let jpeg = compression
            .and_then(Compression::from_u16)
            .map_or(false, Compression::is_jpeg_family);
        if !jpeg {
            debug!(directory, ?compression, "Skipping non-JPEG directory");
            return Ok(());
        }

        if !cursor.is_tiled() {
            debug!(directory, "Skipping untiled directory");
            return Ok(());
        }

        let tile_size = cursor.tile_buffer_size();
        if tile_size == 0 {
            debug!(directory, "Skipping directory with unusable tile geometry");
            return Ok(());
        }
        if tile_size > self.options.max_decode_bytes {
            warn!(
                directory,
                tile_size,
                limit = self.options.max_decode_bytes,
                "Skipping directory: tile buffer exceeds decode limit"
            );
            return Ok(());
        }
        let Ok(buffer_len) = usize::try_from(tile_size) else {
            warn!(
                directory,
                tile_size, "Skipping directory: tile buffer not addressable on this platform"
            );
            return Ok(());
        };

        let tile_count = cursor.tile_count();
        debug!(
            directory,
            tile_count,
            tile_size,
            strategy = ?self.options.strategy,
            "Validating directory"
        );

        match self.options.strategy {
            DecodeStrategy::DecodeTile => {
                self.decode_tiles(cursor, directory, tile_count, buffer_len)
                    .await
            }
            DecodeStrategy::RawChunk => self.verify_chunks(cursor, directory, tile_count).await,
        }
    }

    async fn decode_tiles<C: ContainerCursor>(
        &self,
        cursor: &mut C,
        directory: usize,
        tile_count: u32,
        tile_size: usize,
    ) -> Result<(), Verdict> {
        let mut buf = vec![0u8; tile_size];
        for tile in 0..tile_count {
            trace!(directory, tile, "Decoding tile");
            if let Err(e) = cursor.read_encoded_tile(tile, &mut buf).await {
                debug!(directory, tile, error = %e, "Tile failed to decode");
                let kind = match e {
                    FetchError::Decode(_) => FaultKind::DecodeFailure,
                    _ => FaultKind::FetchFailure,
                };
                return Err(Verdict::invalid(
                    kind,
                    format!(
                        "Tile integrity error: Failed to decode tile #{} in directory {}",
                        tile, directory
                    ),
                )
                .at(TileLocation { directory, tile }));
            }
        }
        Ok(())
    }

    async fn verify_chunks<C: ContainerCursor>(
        &self,
        cursor: &mut C,
        directory: usize,
        tile_count: u32,
    ) -> Result<(), Verdict> {
        let tables: Option<Bytes> = match cursor.jpeg_tables().await {
            Ok(tables) => tables,
            Err(e) => {
                debug!(directory, error = %e, "Failed to read JPEG tables");
                return Err(Verdict::invalid(
                    FaultKind::FetchFailure,
                    format!(
                        "Tile integrity error: Failed to read JPEG tables in directory {}",
                        directory
                    ),
                ));
            }
        };

        for tile in 0..tile_count {
            let location = TileLocation { directory, tile };
            let raw = match cursor.read_raw_tile(tile).await {
                Ok(raw) => raw,
                Err(e) => {
                    debug!(directory, tile, error = %e, "Failed to read tile");
                    return Err(Verdict::invalid(
                        FaultKind::FetchFailure,
                        format!(
                            "Tile integrity error: Failed to read tile #{} in directory {}",
                            tile, directory
                        ),
                    )
                    .at(location));
                }
            };
            trace!(directory, tile, bytes = raw.len(), "Verifying chunk");

            let verdict = if raw.is_empty() {
                self.chunks.validate_chunk(&raw)
            } else {
                self.chunks
                    .validate_chunk(&prepare_tile_jpeg(tables.as_deref(), &raw))
            };
            if !verdict.is_valid() {
                debug!(directory, tile, error = verdict.message(), "Chunk failed to decode");
                return Err(verdict.at(location));
            }
        }
        Ok(())
    }
}
