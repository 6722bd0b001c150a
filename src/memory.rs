use crate::store::{KvEngine, KvStore};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    StringSet(BTreeSet<String>),
}

/// In-process store keeping one typed value per key.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value, for inspection in tests and tooling.
    pub fn get(&self, key: &str) -> Option<StoredValue> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: StoredValue) {
        self.entries.write().insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn read<T>(&self, key: &str, pick: impl FnOnce(&StoredValue) -> Option<T>) -> Option<T> {
        self.entries.read().get(key).and_then(pick)
    }

    fn write_optional<T>(&self, key: &str, value: Option<T>, wrap: impl FnOnce(T) -> StoredValue) {
        match value {
            Some(value) => self.insert(key, wrap(value)),
            None => self.remove(key),
        }
    }
}

impl KvStore for MemoryKv {
    fn decode_bool(&self, key: &str, fallback: bool) -> bool {
        self.read(key, |value| match value {
            StoredValue::Bool(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(fallback)
    }

    fn decode_int(&self, key: &str, fallback: i32) -> i32 {
        self.read(key, |value| match value {
            StoredValue::Int(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(fallback)
    }

    fn decode_long(&self, key: &str, fallback: i64) -> i64 {
        self.read(key, |value| match value {
            StoredValue::Long(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(fallback)
    }

    fn decode_float(&self, key: &str, fallback: f32) -> f32 {
        self.read(key, |value| match value {
            StoredValue::Float(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(fallback)
    }

    fn decode_double(&self, key: &str, fallback: f64) -> f64 {
        self.read(key, |value| match value {
            StoredValue::Double(v) => Some(*v),
            _ => None,
        })
        .unwrap_or(fallback)
    }

    fn decode_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.read(key, |value| match value {
            StoredValue::Bytes(v) => Some(v.clone()),
            _ => None,
        })
    }

    fn decode_string(&self, key: &str) -> Option<String> {
        self.read(key, |value| match value {
            StoredValue::String(v) => Some(v.clone()),
            _ => None,
        })
    }

    fn decode_string_set(&self, key: &str) -> Option<BTreeSet<String>> {
        self.read(key, |value| match value {
            StoredValue::StringSet(v) => Some(v.clone()),
            _ => None,
        })
    }

    fn encode_bool(&self, key: &str, value: bool) {
        self.insert(key, StoredValue::Bool(value));
    }

    fn encode_int(&self, key: &str, value: i32) {
        self.insert(key, StoredValue::Int(value));
    }

    fn encode_long(&self, key: &str, value: i64) {
        self.insert(key, StoredValue::Long(value));
    }

    fn encode_float(&self, key: &str, value: f32) {
        self.insert(key, StoredValue::Float(value));
    }

    fn encode_double(&self, key: &str, value: f64) {
        self.insert(key, StoredValue::Double(value));
    }

    fn encode_bytes(&self, key: &str, value: Option<&[u8]>) {
        self.write_optional(key, value, |v| StoredValue::Bytes(v.to_vec()));
    }

    fn encode_string(&self, key: &str, value: Option<&str>) {
        self.write_optional(key, value, |v| StoredValue::String(v.to_string()));
    }

    fn encode_string_set(&self, key: &str, value: Option<&BTreeSet<String>>) {
        self.write_optional(key, value, |v| StoredValue::StringSet(v.clone()));
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Hands out one shared [`MemoryKv`] per namespace id.
#[derive(Default)]
pub struct MemoryKvEngine {
    stores: Mutex<HashMap<String, Arc<MemoryKv>>>,
}

impl MemoryKvEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed handle to a namespace, created on first use.
    pub fn store(&self, id: &str) -> Arc<MemoryKv> {
        self.stores
            .lock()
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(MemoryKv::new()))
            .clone()
    }

    pub fn namespaces(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.stores.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl KvEngine for MemoryKvEngine {
    fn open(&self, id: &str) -> Arc<dyn KvStore> {
        self.store(id)
    }
}
