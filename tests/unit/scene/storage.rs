use super::*;

#[test]
fn file_store_reports_missing_save_then_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path());
    assert!(matches!(store.load(), Err(PapercutError::NoSavedProject)));

    store.save(r#"{"fps":12}"#).unwrap();
    assert_eq!(store.load().unwrap(), r#"{"fps":12}"#);
    assert_eq!(store.path(), dir.path().join(PROJECT_FILE_NAME));

    store.save("{}").unwrap();
    assert_eq!(store.load().unwrap(), "{}");
}

#[test]
fn file_store_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::at_path(dir.path().join("nested/deeper/project.json"));
    store.save("{}").unwrap();
    assert_eq!(store.load().unwrap(), "{}");
}

#[test]
fn file_store_unwritable_location_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let mut store = FileStore::new(&blocker);
    let err = store.save("{}").unwrap_err();
    assert!(matches!(err, PapercutError::StorageUnavailable(_)));
    assert!(err.is_notice());
}

#[test]
fn memory_store_round_trips() {
    let mut store = MemoryStore::new();
    assert!(matches!(store.load(), Err(PapercutError::NoSavedProject)));
    store.save("abc").unwrap();
    assert_eq!(store.load().unwrap(), "abc");
}
