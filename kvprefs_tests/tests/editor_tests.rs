/// Editors write through on every setter and publish on `update`.
///
/// Run with: cargo test -p kvprefs_tests --test editor_tests

use kvprefs::StoredValue;
use kvprefs::prelude::*;
use kvprefs_tests::{PrimitiveData, PrimitiveDataPreferences};
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn test_setter_writes_through_before_update() {
    let store = Arc::new(MemoryKv::new());
    let prefs = PrimitiveDataPreferences::new(store.clone());

    let mut editor = prefs.mutable();
    editor.set_ratio(0.75);
    editor.set_tags(HashSet::from(["b".to_string(), "c".to_string()]));

    assert_eq!(store.get("ratio"), Some(StoredValue::Float(0.75)));
    assert!(store.contains_key("tags"));
    // Not published yet.
    assert_eq!(prefs.get().ratio, 1.5);

    prefs.update(&editor);
    assert_eq!(prefs.get().ratio, 0.75);
}

#[test]
fn test_editor_starts_from_current_snapshot() {
    let store = Arc::new(MemoryKv::new());
    store.encode_string("label", Some("stored"));
    let prefs = PrimitiveDataPreferences::new(store);

    let editor = prefs.mutable();
    assert_eq!(editor.label(), "stored");
    assert_eq!(*editor.count(), 42);
    assert_eq!(editor.to_immutable(), *prefs.get());
}

#[test]
fn test_editors_are_independent() {
    let prefs = PrimitiveDataPreferences::new(Arc::new(MemoryKv::new()));

    let mut first = prefs.mutable();
    let second = prefs.mutable();
    first.set_flag(false);

    assert!(!first.flag());
    assert!(*second.flag());
}

#[test]
fn test_fresh_accessor_reflects_edits() {
    let store = Arc::new(MemoryKv::new());
    let prefs = PrimitiveDataPreferences::new(store.clone());
    let snapshot = prefs.edit(|editor| {
        editor.set_total(123);
        editor.set_blob(vec![4, 5]);
    });

    let expected = PrimitiveData {
        total: 123,
        blob: vec![4, 5],
        ..PrimitiveData::default()
    };
    assert_eq!(*snapshot, expected);
    assert_eq!(*PrimitiveDataPreferences::new(store).get(), expected);
}
