use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kingshelf::error::ShelfError;
use kingshelf::supplement::SupplementIndex;

#[test]
fn index_loads_from_an_override_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("covers.json")).unwrap();
    std::fs::write(
        path.as_std_path(),
        r#"[{"name": "Cujo", "image": "covers/cujo.jpg"}]"#,
    )
    .unwrap();

    let index = SupplementIndex::from_file(&path).unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index.lookup("Cujo").unwrap().image, "covers/cujo.jpg");
}

#[test]
fn missing_override_file_is_a_read_error() {
    let err = SupplementIndex::from_file(Utf8PathBuf::from("/nonexistent/covers.json").as_path())
        .unwrap_err();
    assert_matches!(err, ShelfError::SupplementRead(_));
}

#[test]
fn malformed_override_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("covers.json")).unwrap();
    std::fs::write(path.as_std_path(), r#"{"name": "not a list"}"#).unwrap();

    let err = SupplementIndex::from_file(&path).unwrap_err();
    assert_matches!(err, ShelfError::SupplementParse(_));
}

#[test]
fn bundled_dataset_is_wellformed() {
    let index = SupplementIndex::bundled().unwrap();
    assert!(index.len() >= 10);
    assert_eq!(
        index.lookup("The Shining").unwrap().image,
        "covers/the-shining.jpg"
    );
    // Exact-equality join: case and punctuation are not normalized.
    assert!(index.lookup("the shining").is_none());
}
