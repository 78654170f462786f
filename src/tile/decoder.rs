//! JPEG tile decoder.
//!
//! Thin wrapper over the `image` crate's JPEG codec that answers one
//! question: does this tile decode? Both validation strategies go through
//! here, so a tile either passes under both or fails under both.
//!
//! Every call gets its own codec instance. A codec panic is stopped at this
//! boundary and reported like any other decode failure; the panic message
//! is not printed while codec work is running on the current thread.
//!
//! The codec has no scanline-at-a-time interface, so [`JpegTileDecoder::verify`]
//! still materialises the whole frame in a scratch buffer. The raw-chunk
//! strategy saves the container's tile buffer, not the decode itself.

use std::any::Any;
use std::cell::Cell;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use image::codecs::jpeg::JpegDecoder;
use image::{ImageDecoder, Limits};

use crate::error::TileError;

/// Default cap on the decoded size of a single tile (256 MiB).
pub const DEFAULT_MAX_DECODE_BYTES: u64 = 256 * 1024 * 1024;

/// Upper bound on codec diagnostic length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

// =============================================================================
// JPEG Decoder
// =============================================================================

/// Decodes JPEG tiles with a fixed allocation ceiling.
#[derive(Debug, Clone, Copy)]
pub struct JpegTileDecoder {
    max_decode_bytes: u64,
}

impl Default for JpegTileDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DECODE_BYTES)
    }
}

impl JpegTileDecoder {
    pub fn new(max_decode_bytes: u64) -> Self {
        Self { max_decode_bytes }
    }

    #[inline]
    pub fn max_decode_bytes(&self) -> u64 {
        self.max_decode_bytes
    }

    /// Parse the header, decode every scanline, and throw the pixels away.
    pub fn verify(&self, data: &[u8]) -> Result<(), TileError> {
        guarded(|| {
            let decoder = self.open(data)?;
            let mut scratch = vec![0u8; decoder.total_bytes() as usize];
            decoder.read_image(&mut scratch).map_err(decode_error)
        })
    }

    /// Decode into `buf`, returning the number of bytes written.
    ///
    /// A frame larger than `buf` is decoded in full and truncated; one that
    /// is smaller leaves the tail of `buf` untouched.
    pub fn decode_into(&self, data: &[u8], buf: &mut [u8]) -> Result<usize, TileError> {
        guarded(|| {
            let decoder = self.open(data)?;
            let total = decoder.total_bytes() as usize;

            if total <= buf.len() {
                decoder
                    .read_image(&mut buf[..total])
                    .map_err(decode_error)?;
                return Ok(total);
            }

            let mut scratch = vec![0u8; total];
            decoder.read_image(&mut scratch).map_err(decode_error)?;
            buf.copy_from_slice(&scratch[..buf.len()]);
            Ok(buf.len())
        })
    }

    /// Build a codec, parse the headers, and apply the allocation limit.
    fn open<'a>(&self, data: &'a [u8]) -> Result<JpegDecoder<Cursor<&'a [u8]>>, TileError> {
        if data.is_empty() {
            return Err(TileError::EmptyTile);
        }

        let mut decoder = JpegDecoder::new(Cursor::new(data)).map_err(decode_error)?;

        let required = decoder.total_bytes();
        if required > self.max_decode_bytes {
            return Err(TileError::FrameTooLarge {
                required,
                limit: self.max_decode_bytes,
            });
        }

        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_decode_bytes);
        decoder.set_limits(limits).map_err(decode_error)?;

        Ok(decoder)
    }
}

// =============================================================================
// Error plumbing
// =============================================================================

fn decode_error(err: image::ImageError) -> TileError {
    TileError::DecodeError {
        message: bounded_message(&err.to_string()),
    }
}

thread_local! {
    static IN_CODEC: Cell<bool> = const { Cell::new(false) };
}

static QUIET_PANIC_HOOK: Once = Once::new();

/// Wrap the process panic hook so panics raised inside codec work are not
/// printed. Panics anywhere else still reach the previous hook.
fn install_quiet_panic_hook() {
    QUIET_PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_CODEC.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Run codec work, turning a panic into `DecoderPanic`.
fn guarded<T>(work: impl FnOnce() -> Result<T, TileError>) -> Result<T, TileError> {
    install_quiet_panic_hook();

    IN_CODEC.with(|flag| flag.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(work));
    IN_CODEC.with(|flag| flag.set(false));

    result.unwrap_or_else(|payload| {
        Err(TileError::DecoderPanic {
            message: bounded_message(&panic_message(payload.as_ref())),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Clip a diagnostic to [`MAX_MESSAGE_CHARS`] characters.
///
/// Never returns an empty string.
pub fn bounded_message(message: &str) -> String {
    let clipped: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
    if clipped.trim().is_empty() {
        "JPEG decode failed".to_string()
    } else {
        clipped
    }
}
