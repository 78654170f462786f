use crate::error::TileError;
use crate::tile::JpegTileDecoder;

use super::verdict::{FaultKind, Verdict};

/// Verifies a single compressed chunk with a fresh codec instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkValidator {
    decoder: JpegTileDecoder,
}

impl ChunkValidator {
    pub fn new(decoder: JpegTileDecoder) -> Self {
        Self { decoder }
    }

    /// Decode `chunk` fully and report whether it is intact.
    ///
    /// The chunk must already be a self-contained JPEG stream; abbreviated
    /// tiles need their tables merged in first.
    pub fn validate_chunk(&self, chunk: &[u8]) -> Verdict {
        match self.decoder.verify(chunk) {
            Ok(()) => Verdict::valid(),
            Err(TileError::EmptyTile) => {
                Verdict::invalid(FaultKind::EmptyChunk, TileError::EmptyTile.to_string())
            }
            Err(e) => Verdict::invalid(FaultKind::DecodeFailure, e.to_string()),
        }
    }
}
