use super::*;
use gobarber::storage::{TOKEN_KEY, USER_KEY};

fn store_in(dir: &tempfile::TempDir) -> FileStore {
    FileStore::new(dir.path().join("nested").join("session.json"))
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    assert_eq!(store.multi_get(&[TOKEN_KEY, USER_KEY]).expect("read"), vec![None, None]);
}

#[test]
fn multi_set_persists_across_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    store_in(&dir).multi_set(&[(TOKEN_KEY, "tok"), (USER_KEY, "{}")]).expect("write");

    let reopened = store_in(&dir);
    assert_eq!(
        reopened.multi_get(&[TOKEN_KEY, USER_KEY]).expect("read"),
        vec![Some("tok".to_owned()), Some("{}".to_owned())]
    );
}

#[test]
fn multi_remove_drops_only_named_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store.multi_set(&[(TOKEN_KEY, "tok"), (USER_KEY, "{}"), ("other", "keep")]).expect("write");

    store.multi_remove(&[TOKEN_KEY, USER_KEY]).expect("remove");

    assert_eq!(
        store.multi_get(&[TOKEN_KEY, USER_KEY, "other"]).expect("read"),
        vec![None, None, Some("keep".to_owned())]
    );
}

#[test]
fn multi_remove_without_file_does_not_create_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store.multi_remove(&[TOKEN_KEY]).expect("remove");
    assert!(!store.path().exists());
}

#[test]
fn corrupt_file_is_reported_as_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    fs::write(&path, "not json").expect("seed");

    let err = FileStore::new(&path).multi_get(&[TOKEN_KEY]).expect_err("corrupt");
    assert!(matches!(err, StorageError::Unavailable(_)));
}

#[test]
fn set_item_overwrites_single_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = store_in(&dir);
    store.multi_set(&[(TOKEN_KEY, "tok"), (USER_KEY, "old")]).expect("write");
    store.set_item(USER_KEY, "new").expect("write");
    assert_eq!(
        store.multi_get(&[TOKEN_KEY, USER_KEY]).expect("read"),
        vec![Some("tok".to_owned()), Some("new".to_owned())]
    );
}
