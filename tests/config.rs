use std::time::Duration;

use assert_matches::assert_matches;

use kingshelf::api::DEFAULT_ENDPOINT;
use kingshelf::config::{ConfigLoader, DEFAULT_TIMEOUT_SECS};
use kingshelf::error::ShelfError;

#[test]
fn missing_default_config_resolves_to_defaults() {
    // No kingshelf.json is checked into the crate root, so the default
    // lookup falls through to pure defaults.
    let resolved = ConfigLoader::resolve(None).unwrap();
    assert_eq!(resolved.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(resolved.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert!(resolved.covers.is_none());
}

#[test]
fn explicit_config_file_is_parsed() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kingshelf.json");
    std::fs::write(
        &path,
        r#"{"endpoint": "http://localhost:9999/books", "timeout_secs": 3}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.endpoint, "http://localhost:9999/books");
    assert_eq!(resolved.timeout, Duration::from_secs(3));
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/kingshelf.json")).unwrap_err();
    assert_matches!(err, ShelfError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kingshelf.json");
    std::fs::write(&path, "{endpoint:").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, ShelfError::ConfigParse(_));
}
