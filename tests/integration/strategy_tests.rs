//! Decode strategy tests over real files.
//!
//! Tests verify:
//! - Classic TIFF (both byte orders), BigTIFF, SVS tables and RGB tiles
//! - Corrupt tiles are reported with their (directory, tile) position
//! - Raw-chunk and decode-tile strategies reach the same verdict

use proptest::prelude::*;

use wsi_validator::validate::{
    check_file_with, DecodeStrategy, FaultKind, TileLocation, ValidateOptions, Verdict,
};

use super::test_utils::{
    corrupt_jpeg, create_test_jpeg, write_slide, DirectorySpec, TiffBuilder,
};

fn check(data: &[u8], options: &ValidateOptions) -> Verdict {
    let file = write_slide(data);
    check_file_with(file.path(), options)
}

fn check_both(data: &[u8], level_zero_only: bool) -> (Verdict, Verdict) {
    let options = ValidateOptions {
        level_zero_only,
        ..ValidateOptions::default()
    };
    let raw = check(data, &options.clone().with_strategy(DecodeStrategy::RawChunk));
    let decoded = check(data, &options.with_strategy(DecodeStrategy::DecodeTile));
    (raw, decoded)
}

fn three_levels(bad_level: Option<usize>) -> Vec<u8> {
    let level = |index: usize, cols: u32| {
        if bad_level == Some(index) {
            DirectorySpec::gray_grid_with_corrupt_tile(cols, 1, (cols - 1) as usize)
        } else {
            DirectorySpec::gray_grid(cols, 1)
        }
    };
    TiffBuilder::new()
        .directory(level(0, 4))
        .directory(level(1, 2))
        .directory(level(2, 1))
        .build()
}

// =============================================================================
// Container Variants
// =============================================================================

#[test]
fn test_little_endian_tiff_is_valid() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid(3, 2))
        .build();

    let (raw, decoded) = check_both(&data, false);
    assert!(raw.is_valid(), "{}", raw.message());
    assert!(decoded.is_valid(), "{}", decoded.message());
}

#[test]
fn test_big_endian_tiff_is_valid() {
    let data = TiffBuilder::new()
        .big_endian()
        .directory(DirectorySpec::gray_grid(2, 2))
        .directory(DirectorySpec::gray_grid(1, 1))
        .build();

    let (raw, decoded) = check_both(&data, false);
    assert!(raw.is_valid(), "{}", raw.message());
    assert!(decoded.is_valid(), "{}", decoded.message());
}

#[test]
fn test_bigtiff_is_valid() {
    for builder in [TiffBuilder::new().bigtiff(), TiffBuilder::new().bigtiff().big_endian()] {
        let data = builder
            .directory(DirectorySpec::gray_grid(2, 1))
            .directory(DirectorySpec::gray_grid(1, 1))
            .build();

        let (raw, decoded) = check_both(&data, false);
        assert!(raw.is_valid(), "{}", raw.message());
        assert!(decoded.is_valid(), "{}", decoded.message());
    }
}

#[test]
fn test_svs_tables_are_merged() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::svs_grid(2, 2))
        .build();

    let (raw, decoded) = check_both(&data, true);
    assert!(raw.is_valid(), "{}", raw.message());
    assert!(decoded.is_valid(), "{}", decoded.message());
}

#[test]
fn test_tiles_with_own_huffman_tables_use_directory_quantization_tables() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::svs_grid_split_tables(2, 2))
        .build();

    let (raw, decoded) = check_both(&data, true);
    assert!(raw.is_valid(), "{}", raw.message());
    assert!(decoded.is_valid(), "{}", decoded.message());
}

#[test]
fn test_rgb_tiles_are_valid() {
    let data = TiffBuilder::new().directory(DirectorySpec::rgb_pair()).build();

    let (raw, decoded) = check_both(&data, true);
    assert!(raw.is_valid(), "{}", raw.message());
    assert!(decoded.is_valid(), "{}", decoded.message());
}

#[test]
fn test_non_jpeg_and_stripped_levels_are_skipped() {
    let garbage = vec![0xAB; 64];
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid(2, 1).with_compression(Some(5)).with_tile(0, garbage.clone()))
        .directory(DirectorySpec::gray_grid(1, 1).as_stripped().with_tile(0, garbage.clone()))
        .directory(DirectorySpec::gray_grid(1, 1).with_compression(None).with_tile(0, garbage))
        .build();

    let (raw, decoded) = check_both(&data, false);
    assert!(raw.is_valid(), "{}", raw.message());
    assert!(decoded.is_valid(), "{}", decoded.message());
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn test_corrupt_tile_is_located() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid_with_corrupt_tile(3, 2, 4))
        .build();

    let (raw, decoded) = check_both(&data, true);
    let expected = Some(TileLocation { directory: 0, tile: 4 });

    assert!(!raw.is_valid());
    assert_eq!(raw.kind(), Some(FaultKind::DecodeFailure));
    assert_eq!(raw.location(), expected);

    assert!(!decoded.is_valid());
    assert_eq!(
        decoded.message(),
        "Tile integrity error: Failed to decode tile #4 in directory 0"
    );
    assert_eq!(decoded.location(), expected);
}

#[test]
fn test_corrupt_abbreviated_tile() {
    let mut spec = DirectorySpec::svs_grid(2, 1);
    spec.tiles[1] = vec![0x55; spec.tiles[1].len()];
    let data = TiffBuilder::new().directory(spec).build();

    let (raw, decoded) = check_both(&data, true);
    assert!(!raw.is_valid());
    assert!(!decoded.is_valid());
    assert_eq!(raw.location(), Some(TileLocation { directory: 0, tile: 1 }));
    assert_eq!(decoded.location(), Some(TileLocation { directory: 0, tile: 1 }));
}

#[test]
fn test_fault_in_lower_level_needs_all_levels() {
    let data = three_levels(Some(2));

    let (raw, decoded) = check_both(&data, true);
    assert!(raw.is_valid());
    assert!(decoded.is_valid());

    let (raw, decoded) = check_both(&data, false);
    assert_eq!(raw.location(), Some(TileLocation { directory: 2, tile: 0 }));
    assert_eq!(
        decoded.message(),
        "Tile integrity error: Failed to decode tile #0 in directory 2"
    );
}

#[test]
fn test_empty_tile_in_file() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid(2, 1).with_tile(1, Vec::new()))
        .build();

    let options = ValidateOptions::default();
    let verdict = check(&data, &options);
    assert_eq!(verdict.message(), "Empty tile data");
    assert_eq!(verdict.kind(), Some(FaultKind::EmptyChunk));

    let verdict = check(&data, &options.with_strategy(DecodeStrategy::DecodeTile));
    assert_eq!(
        verdict.message(),
        "Tile integrity error: Failed to decode tile #1 in directory 0"
    );
}

#[test]
fn test_tile_offset_past_end_of_file() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid(2, 1).with_tile_offset(1, 10_000_000))
        .build();

    let (raw, decoded) = check_both(&data, true);
    assert_eq!(
        raw.message(),
        "Tile integrity error: Failed to read tile #1 in directory 0"
    );
    assert_eq!(raw.kind(), Some(FaultKind::FetchFailure));
    assert_eq!(
        decoded.message(),
        "Tile integrity error: Failed to decode tile #1 in directory 0"
    );
    assert_eq!(decoded.kind(), Some(FaultKind::FetchFailure));
}

#[test]
fn test_oversized_tiles_are_skipped() {
    let mut spec = DirectorySpec::gray_grid(1, 1).with_tile(0, vec![0xCD; 32]);
    spec.width = 4096;
    spec.height = 4096;
    spec.tile_width = 4096;
    spec.tile_height = 4096;
    let data = TiffBuilder::new().directory(spec).build();

    // 16 MiB per decoded tile against a 1 MiB limit
    let options = ValidateOptions {
        max_decode_bytes: 1024 * 1024,
        ..ValidateOptions::default()
    };
    assert!(check(&data, &options).is_valid());

    let options = ValidateOptions::default();
    assert!(!check(&data, &options).is_valid());
}

// =============================================================================
// Strategy Equivalence
// =============================================================================

#[test]
fn test_strategies_agree_on_clean_and_broken_pyramids() {
    for bad_level in [None, Some(0), Some(1), Some(2)] {
        let data = three_levels(bad_level);
        let (raw, decoded) = check_both(&data, false);
        assert_eq!(raw.is_valid(), decoded.is_valid(), "bad level {bad_level:?}");
        assert_eq!(raw.location(), decoded.location(), "bad level {bad_level:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_strategies_agree_on_corrupt_tile(bad in 0usize..6, replace in any::<bool>()) {
        let mut spec = DirectorySpec::gray_grid(3, 2);
        spec.tiles[bad] = if replace {
            vec![0x11; 40]
        } else {
            corrupt_jpeg(create_test_jpeg(16, 16))
        };
        let data = TiffBuilder::new().directory(spec).build();

        let (raw, decoded) = check_both(&data, true);
        prop_assert!(!raw.is_valid());
        prop_assert!(!decoded.is_valid());
        prop_assert_eq!(raw.location(), decoded.location());
        prop_assert_eq!(raw.location(), Some(TileLocation { directory: 0, tile: bad as u32 }));
    }
}
