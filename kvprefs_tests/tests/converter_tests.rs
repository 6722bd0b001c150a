/// Converter-backed fields: every value written through an editor reads
/// back unchanged from a fresh accessor.
///
/// Run with: cargo test -p kvprefs_tests --test converter_tests

use chrono::NaiveDate;
use kvprefs::StoredValue;
use kvprefs::prelude::*;
use kvprefs_tests::{
    Color, CustomData, CustomDataPreferences, DateConverters, Level, Power, list_converters,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn test_converter_functions_invert_each_other() {
    let day = date(1999, 12, 31);
    assert_eq!(DateConverters::days_to_date(DateConverters::date_to_days(&day)), day);
    assert_eq!(
        DateConverters::parse_date(DateConverters::format_date(&Some(day))),
        Some(day)
    );
    assert_eq!(DateConverters::format_date(&None), None);
    assert_eq!(
        list_converters::split_ints(&list_converters::join_ints(&vec![4, -5, 6])),
        vec![4, -5, 6]
    );
}

#[test]
fn test_converted_defaults_and_persisted_default() {
    let store = Arc::new(MemoryKv::new());
    let prefs = CustomDataPreferences::new(store.clone());

    assert_eq!(*prefs.get(), CustomData::default());
    // `since` is flagged and goes through the encoder.
    assert_eq!(
        store.get("since"),
        Some(StoredValue::Long(DateConverters::date_to_days(&date(2024, 1, 1))))
    );
    assert_eq!(store.get("power"), Some(StoredValue::Bool(true)));
    assert!(!store.contains_key("pinned"));
}

#[test]
fn test_converted_values_round_trip() {
    let store = Arc::new(MemoryKv::new());
    let prefs = CustomDataPreferences::new(store.clone());

    let expected = CustomData {
        since: date(2001, 9, 9),
        until: Some(date(2030, 6, 1)),
        pinned: vec![10, 20],
        accent: Color(0xdead_beef),
        levels: BTreeSet::from([Level::High, Level::Low]),
        power: Power::Off,
    };

    prefs.edit(|editor| {
        editor.set_since(expected.since);
        editor.set_until(expected.until);
        editor.set_pinned(expected.pinned.clone());
        editor.set_accent(expected.accent);
        editor.set_levels(expected.levels.clone());
        editor.set_power(expected.power);
    });

    assert_eq!(store.get("until"), Some(StoredValue::String("2030-06-01".to_string())));
    assert_eq!(store.get("pinned"), Some(StoredValue::String("10,20".to_string())));

    let reopened = CustomDataPreferences::new(store);
    assert_eq!(*reopened.get(), expected);
}

#[test]
fn test_nullable_converted_field_removes_key_on_none() {
    let store = Arc::new(MemoryKv::new());
    let prefs = CustomDataPreferences::new(store.clone());

    prefs.edit(|editor| editor.set_until(Some(date(2020, 2, 29))));
    assert!(store.contains_key("until"));

    prefs.edit(|editor| editor.set_until(None));
    assert!(!store.contains_key("until"));
    assert_eq!(CustomDataPreferences::new(store).get().until, None);
}

#[test]
fn test_boolean_converter_checks_key_existence() {
    let store = Arc::new(MemoryKv::new());
    store.encode_bool("power", false);
    let prefs = CustomDataPreferences::new(store.clone());
    assert_eq!(prefs.get().power, Power::Off);
    assert_eq!(store.get("power"), Some(StoredValue::Bool(false)));

    let store = Arc::new(MemoryKv::new());
    store.encode_bool("power", true);
    assert_eq!(CustomDataPreferences::new(store).get().power, Power::On);
}
