//! Entry point tests.
//!
//! Tests verify:
//! - Unopenable inputs give (false, "Cannot open file")
//! - Valid files give (true, "") and repeated calls agree
//! - The async entry point matches the blocking one

use std::io::Write;

use wsi_validator::validate::{check_slide, FaultKind, ValidateOptions};
use wsi_validator::{check_file, FileReport};

use super::test_utils::{write_slide, DirectorySpec, TiffBuilder};

fn cannot_open() -> (bool, String) {
    (false, "Cannot open file".to_string())
}

// =============================================================================
// Open Failures
// =============================================================================

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.svs");

    assert_eq!(check_file(&path, true), cannot_open());
    assert_eq!(check_file(&path, false), cannot_open());
}

#[test]
fn test_directory_path() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(check_file(dir.path(), true), cannot_open());
}

#[test]
fn test_not_a_tiff() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"this is a text file, not a slide").unwrap();
    file.flush().unwrap();

    assert_eq!(check_file(file.path(), true), cannot_open());
}

#[test]
fn test_truncated_header() {
    let data = TiffBuilder::new().directory(DirectorySpec::gray_grid(1, 1)).build();
    let file = write_slide(&data[..6]);
    assert_eq!(check_file(file.path(), true), cannot_open());

    let empty = write_slide(&[]);
    assert_eq!(check_file(empty.path(), true), cannot_open());
}

#[test]
fn test_first_directory_out_of_bounds() {
    let mut data = TiffBuilder::new().directory(DirectorySpec::gray_grid(1, 1)).build();
    let past_end = (data.len() as u32 + 100).to_le_bytes();
    data[4..8].copy_from_slice(&past_end);

    let file = write_slide(&data);
    assert_eq!(check_file(file.path(), true), cannot_open());
}

// =============================================================================
// Valid Files
// =============================================================================

#[test]
fn test_valid_file() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid(2, 2))
        .directory(DirectorySpec::gray_grid(1, 1))
        .build();
    let file = write_slide(&data);

    assert_eq!(check_file(file.path(), true), (true, String::new()));
    assert_eq!(check_file(file.path(), false), (true, String::new()));
}

#[test]
fn test_file_without_jpeg_tiles_is_valid() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid(1, 1).as_stripped())
        .directory(DirectorySpec::gray_grid(1, 1).with_compression(Some(1)))
        .build();
    let file = write_slide(&data);

    assert_eq!(check_file(file.path(), false), (true, String::new()));
}

#[test]
fn test_repeated_calls_agree() {
    let data = TiffBuilder::new()
        .directory(DirectorySpec::gray_grid_with_corrupt_tile(2, 1, 0))
        .build();
    let file = write_slide(&data);

    let first = check_file(file.path(), true);
    assert!(!first.0);
    assert!(!first.1.is_empty());
    for _ in 0..3 {
        assert_eq!(check_file(file.path(), true), first);
    }
}

// =============================================================================
// Async Entry Point
// =============================================================================

#[tokio::test]
async fn test_check_slide_matches_check_file() {
    let good = write_slide(&TiffBuilder::new().directory(DirectorySpec::gray_grid(2, 1)).build());
    let bad = write_slide(
        &TiffBuilder::new()
            .directory(DirectorySpec::gray_grid_with_corrupt_tile(2, 1, 1))
            .build(),
    );

    let options = ValidateOptions::default();
    let verdict = check_slide(good.path(), &options).await;
    assert!(verdict.is_valid());

    let verdict = check_slide(bad.path(), &options).await;
    assert!(!verdict.is_valid());
    assert_eq!(verdict.kind(), Some(FaultKind::DecodeFailure));

    let blocking = {
        let path = bad.path().to_path_buf();
        tokio::task::spawn_blocking(move || check_file(path, true))
            .await
            .unwrap()
    };
    assert_eq!(verdict.into_tuple(), blocking);
}

#[tokio::test]
async fn test_report_carries_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.svs");

    let verdict = check_slide(&path, &ValidateOptions::all_levels()).await;
    let report = FileReport::new(path, verdict);
    assert!(!report.is_valid());

    let json: serde_json::Value = serde_json::from_str(&report.json().unwrap()).unwrap();
    assert_eq!(json["is_valid"], false);
    assert_eq!(json["error_message"], "Cannot open file");
}
