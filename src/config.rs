//! Command-line configuration for the `wsi-validator` binary.
//!
//! Every option except the paths can also come from an environment variable
//! with the `WSI_` prefix:
//!
//! - `WSI_ALL_LEVELS` - Check every directory, not just level 0
//! - `WSI_STRATEGY` - `raw-chunk` (default) or `decode-tile`
//! - `WSI_JOBS` - Files validated concurrently (default: 4)
//! - `WSI_MAX_DECODE_BYTES` - Largest decoded tile allowed (default: 256 MiB)
//! - `WSI_FORMAT` - `text` (default) or `json`

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::tile::DEFAULT_MAX_DECODE_BYTES;
use crate::validate::{DecodeStrategy, ValidateOptions};

// =============================================================================
// Default Values
// =============================================================================

pub const DEFAULT_JOBS: usize = 4;

/// Smallest accepted decode limit (1 MiB).
pub const MIN_MAX_DECODE_BYTES: u64 = 1024 * 1024;

/// Largest accepted decode limit (16 GiB).
pub const MAX_MAX_DECODE_BYTES: u64 = 16 * 1024 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// How reports are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `OK`/`FAIL` line per file
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Check whole-slide TIFF/SVS files for corrupt JPEG tiles.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-validator")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Slide files to check
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Check every pyramid level instead of only the full-resolution one
    #[arg(long, default_value_t = false, env = "WSI_ALL_LEVELS")]
    pub all_levels: bool,

    /// How tiles are checked
    #[arg(long, value_enum, default_value_t = DecodeStrategy::RawChunk, env = "WSI_STRATEGY")]
    pub strategy: DecodeStrategy,

    /// Number of files checked at the same time
    #[arg(short, long, default_value_t = DEFAULT_JOBS, env = "WSI_JOBS")]
    pub jobs: usize,

    /// Largest decoded tile, in bytes; directories needing more are skipped
    #[arg(long, default_value_t = DEFAULT_MAX_DECODE_BYTES, env = "WSI_MAX_DECODE_BYTES")]
    pub max_decode_bytes: u64,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "WSI_FORMAT")]
    pub format: OutputFormat,

    /// Enable debug logging and show fault locations
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Check settings clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.paths.is_empty() {
            return Err("At least one slide path is required".to_string());
        }

        if self.jobs == 0 {
            return Err("jobs must be greater than 0".to_string());
        }

        if !(MIN_MAX_DECODE_BYTES..=MAX_MAX_DECODE_BYTES).contains(&self.max_decode_bytes) {
            return Err("max_decode_bytes must be between 1MB and 16GB".to_string());
        }

        Ok(())
    }

    pub fn validate_options(&self) -> ValidateOptions {
        ValidateOptions {
            level_zero_only: !self.all_levels,
            strategy: self.strategy,
            max_decode_bytes: self.max_decode_bytes,
        }
    }
}
