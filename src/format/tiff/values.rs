//! Reading tag values, inline or out-of-line.
//!
//! Array values (TileOffsets, TileByteCounts, JPEGTables) are fetched with a
//! single positioned read each.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::{FieldType, TiffTag};

/// Reads the values behind IFD entries through a [`RangeReader`].
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Raw value bytes, taken from the entry or fetched from the file.
    pub async fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            return Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ));
        }

        let size = usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
            tag: tag_name(entry),
            message: format!("value of {} bytes is not addressable", size),
        })?;
        let offset = entry.value_offset(self.header.byte_order);
        Ok(self.reader.read_exact_at(offset, size).await?)
    }

    /// A scalar Short or Long value.
    pub async fn read_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        if let Some(value) = entry.inline_u32(self.header.byte_order) {
            return Ok(value);
        }
        if entry.count != 1 {
            return Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("expected count 1, got {}", entry.count),
            });
        }
        self.read_first_u32(entry).await
    }

    /// The first element of a Short or Long array.
    ///
    /// BitsPerSample carries one value per sample; every sample shares the
    /// same depth in the files we check, so the first one stands for all.
    pub async fn read_first_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        let field_type = known_type(entry)?;
        if entry.count == 0 {
            return Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: "empty value".to_string(),
            });
        }

        let bytes = self.read_bytes(entry).await?;
        let byte_order = self.header.byte_order;
        match field_type {
            FieldType::Short => Ok(byte_order.read_u16(&bytes) as u32),
            FieldType::Long => Ok(byte_order.read_u32(&bytes)),
            other => Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("expected Short or Long, got {:?}", other),
            }),
        }
    }

    /// A Short, Long or Long8 array widened to u64.
    pub async fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        let field_type = known_type(entry)?;
        if !matches!(
            field_type,
            FieldType::Short | FieldType::Long | FieldType::Long8 | FieldType::Ifd8
        ) {
            return Err(TiffError::InvalidTagValue {
                tag: tag_name(entry),
                message: format!("expected an integer array, got {:?}", field_type),
            });
        }
        if entry.count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry).await?;
        Ok(parse_u64_array(&bytes, field_type, self.header.byte_order))
    }
}

/// Decode a packed integer array. Trailing partial elements are ignored.
pub fn parse_u64_array(bytes: &[u8], field_type: FieldType, byte_order: ByteOrder) -> Vec<u64> {
    let width = field_type.size_in_bytes();
    bytes
        .chunks_exact(width)
        .map(|chunk| match field_type {
            FieldType::Short => byte_order.read_u16(chunk) as u64,
            FieldType::Long => byte_order.read_u32(chunk) as u64,
            _ => byte_order.read_u64(chunk),
        })
        .collect()
}

fn known_type(entry: &IfdEntry) -> Result<FieldType, TiffError> {
    entry
        .field_type
        .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))
}

fn tag_name(entry: &IfdEntry) -> &'static str {
    TiffTag::from_u16(entry.tag_id).map_or("unknown", TiffTag::name)
}
