use thiserror::Error;

/// I/O errors that can occur when reading from a slide file
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File does not exist or is not a regular file
    #[error("File not found: {0}")]
    NotFound(String),

    /// Underlying read or seek failed
    #[error("Read error: {0}")]
    Read(String),
}

/// Errors that can occur when parsing TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// IFD chain points back at a directory that was already read
    #[error("IFD loop detected at offset {0}")]
    IfdLoop(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors raised while decoding a single JPEG tile
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The tile payload has no bytes at all
    #[error("Empty tile data")]
    EmptyTile,

    /// The JPEG codec rejected the stream
    #[error("{message}")]
    DecodeError { message: String },

    /// The frame header asks for more memory than the configured limit
    #[error("JPEG frame needs {required} bytes, decode limit is {limit}")]
    FrameTooLarge { required: u64, limit: u64 },

    /// The codec panicked; the unwind was stopped at the decode boundary
    #[error("JPEG decoder aborted: {message}")]
    DecoderPanic { message: String },
}

/// Errors surfaced by a container cursor when a tile cannot be produced
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Tile index is past the end of the directory's tile table
    #[error("Tile {index} out of range: directory has {count} tile entries")]
    TileOutOfRange { index: u32, count: usize },

    /// Container structure could not be read
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// Tile bytes could not be read
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Tile bytes were read but did not decode
    #[error("Decode error: {0}")]
    Decode(#[from] TileError),
}
