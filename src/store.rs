use std::collections::BTreeSet;
use std::sync::Arc;

/// Key-value storage engine consumed by generated preferences.
///
/// Scalar kinds decode with a caller supplied fallback that is returned when
/// the key is absent or holds a value of another kind. Byte, text and text
/// set kinds report absence through `None`, and encoding `None` removes the
/// key.
pub trait KvStore: Send + Sync {
    fn decode_bool(&self, key: &str, fallback: bool) -> bool;
    fn decode_int(&self, key: &str, fallback: i32) -> i32;
    fn decode_long(&self, key: &str, fallback: i64) -> i64;
    fn decode_float(&self, key: &str, fallback: f32) -> f32;
    fn decode_double(&self, key: &str, fallback: f64) -> f64;
    fn decode_bytes(&self, key: &str) -> Option<Vec<u8>>;
    fn decode_string(&self, key: &str) -> Option<String>;
    fn decode_string_set(&self, key: &str) -> Option<BTreeSet<String>>;

    fn encode_bool(&self, key: &str, value: bool);
    fn encode_int(&self, key: &str, value: i32);
    fn encode_long(&self, key: &str, value: i64);
    fn encode_float(&self, key: &str, value: f32);
    fn encode_double(&self, key: &str, value: f64);
    fn encode_bytes(&self, key: &str, value: Option<&[u8]>);
    fn encode_string(&self, key: &str, value: Option<&str>);
    fn encode_string_set(&self, key: &str, value: Option<&BTreeSet<String>>);

    fn contains_key(&self, key: &str) -> bool;
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// Opens stores by namespace id.
pub trait KvEngine: Send + Sync {
    fn open(&self, id: &str) -> Arc<dyn KvStore>;
}
