use kvprefs::{Marshal, PrefEnum, Preferences};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, PrefEnum)]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Marshal)]
pub struct Payload {
    pub name: String,
    pub weight: u32,
}

/// One field per storage primitive, plus an enum and a structured value.
#[derive(Debug, Clone, PartialEq, Preferences)]
#[preferences(id = "primitive")]
pub struct PrimitiveData {
    #[pref(default = true)]
    pub flag: bool,
    #[pref(default = 42, persist_default)]
    pub count: i32,
    #[pref(default = 7_000_000_000)]
    pub total: i64,
    #[pref(default = 1.5)]
    pub ratio: f32,
    #[pref(default = 2.25, persist_default)]
    pub precise: f64,
    #[pref(default = vec![1, 2, 3])]
    pub blob: Vec<u8>,
    #[pref(default = "hello".to_string(), persist_default)]
    pub label: String,
    #[pref(default = HashSet::from(["a".to_string()]))]
    pub tags: HashSet<String>,
    #[pref(default = Level::Medium, persist_default)]
    pub level: Level,
    #[pref(default = Payload { name: "default".to_string(), weight: 1 })]
    pub payload: Payload,
    #[pref(default = 0, persist_default)]
    pub zero: i32,
    #[pref(default = false, persist_default)]
    pub off: bool,
}

#[derive(Debug, Clone, PartialEq, Preferences)]
pub struct NullableData {
    #[pref(default = None)]
    pub flag: Option<bool>,
    #[pref(default = Some(5))]
    pub count: Option<i32>,
    #[pref(default = None)]
    pub total: Option<i64>,
    #[pref(default = None)]
    pub ratio: Option<f32>,
    #[pref(default = Some(0.5), persist_default)]
    pub precise: Option<f64>,
    #[pref(default = None)]
    pub blob: Option<Vec<u8>>,
    #[pref(default = Some("n".to_string()))]
    pub label: Option<String>,
    #[pref(default = None)]
    pub tags: Option<BTreeSet<String>>,
    #[pref(default = None, persist_default)]
    pub level: Option<Level>,
    #[pref(default = None)]
    pub payload: Option<Payload>,
    #[pref(default = Some(true), persist_default)]
    pub enabled: Option<bool>,
}

include!(concat!(env!("OUT_DIR"), "/primitive_data_preferences.rs"));
include!(concat!(env!("OUT_DIR"), "/nullable_data_preferences.rs"));
