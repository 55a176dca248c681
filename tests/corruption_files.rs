//! Corrupt and foreign input detection
//!
//! Every damaged file must be rejected with a classified error, never a panic
//! and never a partially built guide.

use guide_rs::{ArchBits, Guide, GuideError};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::TempDir;

/// Header (35 bytes) plus root record with 8-byte refs and empty strings
const FIRST_RECORD_END: usize = 35 + 16 + 4 + 84 + 4 + 4;

fn sample() -> Guide {
    let mut guide = Guide::create().unwrap();
    let root = guide.root();
    for i in 0..3 {
        let child = guide.new_node_with(format!("child {i}"), "body text").unwrap();
        guide.add_child(root, child, None).unwrap();
    }
    guide
}

fn write_at(path: &Path, offset: u64, bytes: &[u8]) {
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
}

#[test]
fn test_every_truncation_is_rejected() {
    let bytes = sample().encode(ArchBits::Bits64).unwrap();

    let mut record_boundaries = Vec::new();
    for len in 0..bytes.len() {
        match Guide::decode(&bytes[..len], ArchBits::Bits64) {
            Err(e) if len < 20 => assert!(
                matches!(e, GuideError::TooShort { .. }),
                "len {len}: {e}"
            ),
            Err(e) => assert!(e.is_corruption(), "len {len}: {e}"),
            // Cutting exactly between records leaves a shorter but valid guide.
            Ok(guide) => record_boundaries.push((len, guide.len())),
        }
    }

    assert_eq!(record_boundaries.first().map(|b| b.0), Some(FIRST_RECORD_END));
    assert_eq!(
        record_boundaries.iter().map(|b| b.1).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_truncated_file_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cut.gde");
    sample().store(&path).unwrap();

    let size = fs::metadata(&path).unwrap().len();
    OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(size - 5)
        .unwrap();

    let err = Guide::load(&path, ArchBits::Bits64).unwrap_err();
    assert!(err.is_corruption());
    assert_eq!(err.os_error_code(), None);
}

#[test]
fn test_header_only_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("header.gde");
    let bytes = sample().encode(ArchBits::Bits64).unwrap();
    fs::write(&path, &bytes[..35]).unwrap();

    assert!(matches!(
        Guide::load(&path, ArchBits::Bits64),
        Err(GuideError::Truncated { .. })
    ));
}

#[test]
fn test_empty_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.gde");
    File::create(&path).unwrap();

    let err = Guide::load(&path, ArchBits::Bits64).unwrap_err();
    assert!(err.is_unrecognized());
    assert_eq!(err.os_error_code(), None);
}

#[test]
fn test_bad_signature() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sig.gde");
    sample().store(&path).unwrap();
    write_at(&path, 0, b"XYZ");

    let err = Guide::load(&path, ArchBits::Bits64).unwrap_err();
    assert!(matches!(err, GuideError::InvalidSignature));
    assert!(err.is_unrecognized());
    assert_eq!(err.os_error_code(), None);
}

#[test]
fn test_other_versions() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("version.gde");
    sample().store(&path).unwrap();

    for version in [0u32, 1, 3, u32::MAX] {
        write_at(&path, 3, &version.to_le_bytes());
        let err = Guide::load(&path, ArchBits::Bits64).unwrap_err();
        assert!(matches!(err, GuideError::UnsupportedVersion(v) if v == version));
        assert!(err.is_unrecognized());
    }
}

#[test]
fn test_oversized_title_length() {
    let mut bytes = sample().encode(ArchBits::Bits64).unwrap();
    // title_len of the root record
    let at = 35 + 16 + 4 + 84;
    bytes[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());

    assert!(matches!(
        Guide::decode(&bytes, ArchBits::Bits64),
        Err(GuideError::Truncated { .. })
    ));
}

#[test]
fn test_broken_parent_reference() {
    let mut bytes = sample().encode(ArchBits::Bits64).unwrap();
    // parent_ref of the second record
    let at = FIRST_RECORD_END + 8;
    bytes[at..at + 8].copy_from_slice(&0x7777u64.to_le_bytes());

    assert!(matches!(
        Guide::decode(&bytes, ArchBits::Bits64),
        Err(GuideError::UnresolvedParent { parent_ref: 0x7777 })
    ));
}

#[test]
fn test_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = Guide::load(temp.path().join("nope.gde"), ArchBits::Bits64).unwrap_err();
    assert!(matches!(err, GuideError::Io(_)));
    assert!(!err.is_unrecognized());
    assert!(err.os_error_code().is_some());
}
