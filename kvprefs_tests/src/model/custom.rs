use super::converters::{Color, Power};
use super::primitive::Level;
use chrono::NaiveDate;
use kvprefs::Preferences;
use std::collections::BTreeSet;

/// Fields stored through type converters.
#[derive(Debug, Clone, PartialEq, Preferences)]
#[preferences(id = "custom")]
pub struct CustomData {
    #[pref(default = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(), persist_default)]
    pub since: NaiveDate,
    #[pref(default = None)]
    pub until: Option<NaiveDate>,
    #[pref(default = vec![1, 2, 3])]
    pub pinned: Vec<i32>,
    #[pref(default = Color(0x00ff_00ff))]
    pub accent: Color,
    #[pref(default = BTreeSet::from([Level::Low]))]
    pub levels: BTreeSet<Level>,
    #[pref(default = Power::On, persist_default)]
    pub power: Power,
}

include!(concat!(env!("OUT_DIR"), "/custom_data_preferences.rs"));
