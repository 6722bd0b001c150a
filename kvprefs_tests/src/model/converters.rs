use super::primitive::Level;
use chrono::{Datelike, NaiveDate};
use kvprefs::{PrefEnum, type_converters};
use std::collections::{BTreeSet, HashSet};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    On,
    Off,
}

pub struct DateConverters;

#[type_converters]
impl DateConverters {
    pub fn date_to_days(date: &NaiveDate) -> i64 {
        i64::from(date.num_days_from_ce())
    }

    pub fn days_to_date(days: i64) -> NaiveDate {
        i32::try_from(days)
            .ok()
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .unwrap_or_default()
    }

    pub fn format_date(date: &Option<NaiveDate>) -> Option<String> {
        date.as_ref().map(|date| date.format(DATE_FORMAT).to_string())
    }

    pub fn parse_date(text: Option<String>) -> Option<NaiveDate> {
        text.and_then(|text| NaiveDate::parse_from_str(&text, DATE_FORMAT).ok())
    }

    pub fn color_to_bits(color: Color) -> i32 {
        color.0 as i32
    }

    pub fn bits_to_color(bits: i32) -> Color {
        Color(bits as u32)
    }
}

pub struct PowerConverters;

#[type_converters]
impl PowerConverters {
    pub fn power_to_bool(power: &Power) -> bool {
        matches!(power, Power::On)
    }

    pub fn bool_to_power(on: bool) -> Power {
        if on { Power::On } else { Power::Off }
    }
}

pub struct LevelConverters;

#[type_converters]
impl LevelConverters {
    pub fn levels_to_names(levels: &BTreeSet<Level>) -> HashSet<String> {
        levels.iter().map(|level| level.ordinal().to_string()).collect()
    }

    /// Unknown entries are skipped.
    pub fn names_to_levels(names: HashSet<String>) -> BTreeSet<Level> {
        names
            .iter()
            .filter_map(|name| name.parse().ok())
            .filter_map(Level::from_ordinal)
            .collect()
    }
}

#[type_converters]
pub mod list_converters {
    #[allow(clippy::ptr_arg)]
    pub fn join_ints(values: &Vec<i32>) -> String {
        values
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn split_ints(text: &str) -> Vec<i32> {
        text.split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    }
}
