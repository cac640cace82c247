//! Reading sources and configuration from disk

use std::fs;
use stree_core::driver::{format_checked, read};
use stree_core::{ConfigLoader, StreeError};
use tempfile::TempDir;

#[test]
fn configuration_drives_formatting() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(".streerc.toml"),
        "[formatter]\npreferredQuote = \"'\"\n",
    )
    .unwrap();
    let source_path = temp_dir.path().join("app.rb");
    fs::write(&source_path, "puts \"hello\"\n").unwrap();

    let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
    let options = config.format_options().unwrap();
    let source = read(&source_path).unwrap();
    assert_eq!(
        format_checked(&source, &options, &source_path).unwrap(),
        "puts 'hello'\n"
    );
}

#[test]
fn unsupported_encodings_are_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("legacy.rb");
    fs::write(&path, "# -*- coding: euc-jp -*-\nputs 1\n").unwrap();

    match read(&path) {
        Err(StreeError::Encoding { encoding, .. }) => assert_eq!(encoding, "euc-jp"),
        other => panic!("expected an encoding error, got {other:?}"),
    }
}

#[test]
fn missing_files_are_io_errors() {
    let temp_dir = TempDir::new().unwrap();
    let err = read(&temp_dir.path().join("nope.rb")).unwrap_err();
    assert!(matches!(err, StreeError::IoError { .. }));
}
