use super::*;

fn temp_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("keygate-{tag}-{}-{nanos}", std::process::id()))
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

#[test]
fn memory_store_starts_empty() {
    let store = MemoryTokenStore::new();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn memory_store_save_overwrites_slot() {
    let store = MemoryTokenStore::new();
    store.save("first").unwrap();
    store.save("second").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("second"));
}

#[test]
fn memory_store_clear_empties_slot() {
    let store = MemoryTokenStore::new();
    store.save("token").unwrap();
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

// =============================================================================
// FileTokenStore
// =============================================================================

#[test]
fn file_store_missing_file_is_empty() {
    let store = FileTokenStore::new(temp_path("missing"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn file_store_round_trip() {
    let path = temp_path("roundtrip");
    let store = FileTokenStore::new(&path);
    store.save("abc.def.ghi").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn file_store_trims_whitespace() {
    let path = temp_path("trim");
    std::fs::write(&path, "  token-with-newline\n").unwrap();
    let store = FileTokenStore::new(&path);
    assert_eq!(store.load().unwrap().as_deref(), Some("token-with-newline"));
    store.clear().unwrap();
}

#[test]
fn file_store_empty_file_is_empty_slot() {
    let path = temp_path("empty");
    std::fs::write(&path, "").unwrap();
    let store = FileTokenStore::new(&path);
    assert_eq!(store.load().unwrap(), None);
    store.clear().unwrap();
}

#[test]
fn file_store_clear_is_idempotent() {
    let store = FileTokenStore::new(temp_path("idempotent"));
    store.clear().unwrap();
    store.clear().unwrap();
}

#[test]
fn file_store_creates_parent_directories() {
    let path = temp_path("nested").join("inner").join("token");
    let store = FileTokenStore::new(&path);
    store.save("tok").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("tok"));
    store.clear().unwrap();
}
