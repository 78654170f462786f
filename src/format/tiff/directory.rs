//! Per-directory geometry and tile tables.
//!
//! A [`TiffDirectory`] is one IFD with the attributes the validator cares
//! about already resolved: compression, tiling, and the sample layout that
//! determines how large a decoded tile is. The tile table and JPEGTables are
//! not touched here; [`TileTable::load`] and
//! [`TiffDirectory::load_jpeg_tables`] fetch them on demand.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{Ifd, TiffHeader};
use super::tags::TiffTag;
use super::values::ValueReader;

const PLANAR_SEPARATE: u32 = 2;

/// Read and parse the IFD at `offset`.
pub async fn read_ifd<R: RangeReader>(
    reader: &R,
    header: &TiffHeader,
    offset: u64,
) -> Result<Ifd, TiffError> {
    let count_size = header.ifd_count_size();
    let fits = offset
        .checked_add(count_size as u64)
        .map_or(false, |end| end <= reader.size());
    if offset == 0 || !fits {
        return Err(TiffError::InvalidIfdOffset(offset));
    }

    let count_bytes = reader.read_exact_at(offset, count_size).await?;
    let entry_count = header.read_entry_count(&count_bytes);
    let ifd_size =
        Ifd::calculate_size(entry_count, header).ok_or(TiffError::InvalidIfdOffset(offset))?;

    let bytes = reader.read_exact_at(offset, ifd_size).await?;
    Ifd::parse(&bytes, header)
}

/// One image directory with its tile geometry resolved.
#[derive(Debug, Clone)]
pub struct TiffDirectory {
    /// Position in the IFD chain, starting at 0
    pub index: usize,
    /// File offset of the IFD
    pub offset: u64,
    pub ifd: Ifd,
    pub compression: Option<u16>,
    pub image_width: u32,
    pub image_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub samples_per_pixel: u32,
    pub bits_per_sample: u32,
    pub planar_separate: bool,
}

impl TiffDirectory {
    /// Read the IFD at `offset` and resolve its attributes.
    pub async fn load<R: RangeReader>(
        reader: &R,
        header: &TiffHeader,
        offset: u64,
        index: usize,
    ) -> Result<Self, TiffError> {
        let ifd = read_ifd(reader, header, offset).await?;
        Self::from_ifd(reader, header, ifd, offset, index).await
    }

    pub async fn from_ifd<R: RangeReader>(
        reader: &R,
        header: &TiffHeader,
        ifd: Ifd,
        offset: u64,
        index: usize,
    ) -> Result<Self, TiffError> {
        let values = ValueReader::new(reader, header);

        let compression = scalar(&values, &ifd, TiffTag::Compression)
            .await?
            .map(|v| v as u16);
        let image_width = scalar(&values, &ifd, TiffTag::ImageWidth).await?.unwrap_or(0);
        let image_height = scalar(&values, &ifd, TiffTag::ImageLength).await?.unwrap_or(0);
        let tile_width = scalar(&values, &ifd, TiffTag::TileWidth).await?.unwrap_or(0);
        let tile_height = scalar(&values, &ifd, TiffTag::TileLength).await?.unwrap_or(0);
        let samples_per_pixel = scalar(&values, &ifd, TiffTag::SamplesPerPixel)
            .await?
            .unwrap_or(1);
        let planar_separate = scalar(&values, &ifd, TiffTag::PlanarConfiguration)
            .await?
            .map_or(false, |v| v == PLANAR_SEPARATE);

        let bits_per_sample = match ifd.get_entry_by_tag(TiffTag::BitsPerSample) {
            Some(entry) => values.read_first_u32(entry).await?,
            None => 1,
        };

        Ok(TiffDirectory {
            index,
            offset,
            ifd,
            compression,
            image_width,
            image_height,
            tile_width,
            tile_height,
            samples_per_pixel,
            bits_per_sample,
            planar_separate,
        })
    }

    #[inline]
    pub fn is_tiled(&self) -> bool {
        self.ifd.is_tiled()
    }

    #[inline]
    pub fn next_ifd_offset(&self) -> u64 {
        self.ifd.next_ifd_offset
    }

    /// Number of tiles, counting every plane when samples are stored separately.
    pub fn tile_count(&self) -> u32 {
        if !self.is_tiled() || self.tile_width == 0 || self.tile_height == 0 {
            return 0;
        }
        let across = (self.image_width as u64).div_ceil(self.tile_width as u64);
        let down = (self.image_height as u64).div_ceil(self.tile_height as u64);
        let planes = if self.planar_separate {
            self.samples_per_pixel.max(1) as u64
        } else {
            1
        };
        u32::try_from(across * down * planes).unwrap_or(u32::MAX)
    }

    /// Bytes needed to hold one decoded tile, or 0 when the geometry is
    /// unusable.
    pub fn tile_buffer_size(&self) -> u64 {
        if !self.is_tiled() || self.tile_width == 0 || self.tile_height == 0 {
            return 0;
        }
        let samples = if self.planar_separate {
            1
        } else {
            self.samples_per_pixel as u64
        };
        (self.tile_width as u64)
            .checked_mul(samples)
            .and_then(|v| v.checked_mul(self.bits_per_sample as u64))
            .map(|bits| bits.div_ceil(8))
            .and_then(|row| row.checked_mul(self.tile_height as u64))
            .unwrap_or(0)
    }

    /// Fetch the JPEGTables blob, if the directory has one.
    pub async fn load_jpeg_tables<R: RangeReader>(
        &self,
        reader: &R,
        header: &TiffHeader,
    ) -> Result<Option<Bytes>, TiffError> {
        match self.ifd.get_entry_by_tag(TiffTag::JpegTables) {
            Some(entry) => {
                let tables = ValueReader::new(reader, header).read_bytes(entry).await?;
                Ok(Some(tables))
            }
            None => Ok(None),
        }
    }
}

async fn scalar<R: RangeReader>(
    values: &ValueReader<'_, R>,
    ifd: &Ifd,
    tag: TiffTag,
) -> Result<Option<u32>, TiffError> {
    match ifd.get_entry_by_tag(tag) {
        Some(entry) => values.read_u32(entry).await.map(Some),
        None => Ok(None),
    }
}

// =============================================================================
// TileTable
// =============================================================================

/// Offsets and byte counts of every tile in a directory.
#[derive(Debug, Clone, Default)]
pub struct TileTable {
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl TileTable {
    pub async fn load<R: RangeReader>(
        reader: &R,
        header: &TiffHeader,
        directory: &TiffDirectory,
    ) -> Result<Self, TiffError> {
        let values = ValueReader::new(reader, header);

        let offsets = match directory.ifd.get_entry_by_tag(TiffTag::TileOffsets) {
            Some(entry) => values.read_u64_array(entry).await?,
            None => return Err(TiffError::MissingTag("TileOffsets")),
        };
        let byte_counts = match directory.ifd.get_entry_by_tag(TiffTag::TileByteCounts) {
            Some(entry) => values.read_u64_array(entry).await?,
            None => return Err(TiffError::MissingTag("TileByteCounts")),
        };

        Ok(TileTable {
            offsets,
            byte_counts,
        })
    }

    /// Number of tiles with both an offset and a byte count.
    pub fn len(&self) -> usize {
        self.offsets.len().min(self.byte_counts.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(offset, byte_count)` of a tile.
    pub fn location(&self, tile_index: u32) -> Option<(u64, u64)> {
        let idx = tile_index as usize;
        Some((*self.offsets.get(idx)?, *self.byte_counts.get(idx)?))
    }
}
