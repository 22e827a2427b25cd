use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use ttv_archive::{Error, absorb, extract_zip};
use zip::write::SimpleFileOptions;

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap();
}

fn all_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}

#[test]
fn absorb_extracts_and_deletes_package() {
    let temp_dir = tempfile::Builder::new()
        .prefix("ttv-test-zip-")
        .tempdir()
        .expect("Failed to create temp dir");
    let package = temp_dir.path().join("doi-10-5072-dar-abc.zip");
    write_zip(
        &package,
        &[
            ("bag/", b""),
            ("bag/bagit.txt", b"BagIt-Version: 1.0\n"),
            ("bag/data/file.txt", b"hello"),
        ],
    );
    let destination = temp_dir.path().join("batch/urn:nbn:1/v1");
    std::fs::create_dir_all(destination.parent().unwrap()).unwrap();

    let report = absorb(&package, &destination).unwrap();

    assert_eq!(report.entry_count, 3);
    assert_eq!(report.files().count(), 2);
    assert!(!package.exists());
    assert_eq!(std::fs::read(destination.join("bag/data/file.txt")).unwrap(), b"hello");
}

#[test]
fn rejected_package_is_left_in_place() {
    let temp_dir = tempfile::tempdir().unwrap();
    let package = temp_dir.path().join("evil.zip");
    write_zip(&package, &[("data/ok.txt", b"ok"), ("../../outside.txt", b"evil")]);
    let destination = temp_dir.path().join("batch/urn:nbn:1/v1");
    std::fs::create_dir_all(destination.parent().unwrap()).unwrap();

    let err = absorb(&package, &destination).unwrap_err();

    assert!(err.is_safety_violation());
    assert!(package.exists());
    assert!(!destination.exists());
    assert!(!temp_dir.path().join("outside.txt").exists());
    assert!(!temp_dir.path().join("batch/outside.txt").exists());
    assert_eq!(all_files(temp_dir.path()), vec![package]);
}

#[test]
fn duplicate_version_is_refused() {
    let temp_dir = tempfile::tempdir().unwrap();
    let package = temp_dir.path().join("pkg.zip");
    write_zip(&package, &[("file.txt", b"second")]);
    let destination = temp_dir.path().join("v1");
    std::fs::create_dir_all(&destination).unwrap();
    std::fs::write(destination.join("file.txt"), "first").unwrap();

    let result = extract_zip(&package, &destination);

    assert!(matches!(result, Err(Error::AlreadyExtracted(_))));
    assert_eq!(std::fs::read(destination.join("file.txt")).unwrap(), b"first");
}

#[test]
fn corrupted_package_reports_its_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let package = temp_dir.path().join("broken.zip");
    std::fs::write(&package, b"not a zip at all").unwrap();

    let err = extract_zip(&package, &temp_dir.path().join("v1")).unwrap_err();

    match err {
        Error::Corrupted { path, .. } => assert_eq!(path, package),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!temp_dir.path().join("v1").exists());
}

fn escaping_name() -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z]{1,6}", 0..3),
        1usize..4,
        "[a-z]{1,8}\\.txt",
    )
        .prop_map(|(inner, ups, leaf)| {
            let mut parts = inner.clone();
            // climb out of every inner component and then out of the root
            parts.extend(std::iter::repeat_n("..".to_string(), inner.len() + ups));
            parts.push(leaf);
            parts.join("/")
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn escaping_entries_never_write_outside_root(name in escaping_name()) {
        let temp_dir = tempfile::tempdir().unwrap();
        let package = temp_dir.path().join("pkg.zip");
        write_zip(&package, &[("inside.txt", b"ok"), (name.as_str(), b"evil")]);
        let destination = temp_dir.path().join("a/b/c/d/root");
        std::fs::create_dir_all(destination.parent().unwrap()).unwrap();

        let result = extract_zip(&package, &destination);

        let is_zip_slip = matches!(result, Err(Error::ZipSlip { .. }));
        prop_assert!(is_zip_slip, "expected a zip-slip error, got {:?}", result);
        prop_assert_eq!(all_files(temp_dir.path()), vec![package.clone()]);
    }
}
