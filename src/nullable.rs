//! Codecs for nullable scalars.
//!
//! Storage engines have no nullable representation for scalar kinds, so a
//! nullable value is carried by a wider kind: booleans as an int with `-1`
//! for null, ints as a long with `i64::MAX` for null, and longs, floats and
//! doubles as little-endian bytes where a missing entry is null.

pub const NULL_BOOL: i32 = -1;
pub const NULL_INT: i64 = i64::MAX;

pub fn decode_bool(raw: i32) -> Option<bool> {
    match raw {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

pub fn encode_bool(value: Option<bool>) -> i32 {
    match value {
        Some(true) => 1,
        Some(false) => 0,
        None => NULL_BOOL,
    }
}

pub fn decode_int(raw: i64) -> Option<i32> {
    if raw == NULL_INT {
        return None;
    }
    i32::try_from(raw).ok()
}

pub fn encode_int(value: Option<i32>) -> i64 {
    value.map_or(NULL_INT, i64::from)
}

pub fn decode_long(raw: Option<&[u8]>) -> Option<i64> {
    Some(i64::from_le_bytes(raw?.try_into().ok()?))
}

pub fn encode_long(value: Option<i64>) -> Option<Vec<u8>> {
    value.map(|v| v.to_le_bytes().to_vec())
}

pub fn decode_float(raw: Option<&[u8]>) -> Option<f32> {
    Some(f32::from_le_bytes(raw?.try_into().ok()?))
}

pub fn encode_float(value: Option<f32>) -> Option<Vec<u8>> {
    value.map(|v| v.to_le_bytes().to_vec())
}

pub fn decode_double(raw: Option<&[u8]>) -> Option<f64> {
    Some(f64::from_le_bytes(raw?.try_into().ok()?))
}

pub fn encode_double(value: Option<f64>) -> Option<Vec<u8>> {
    value.map(|v| v.to_le_bytes().to_vec())
}
