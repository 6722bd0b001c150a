//! Structured values stored as MessagePack bytes.

use crate::error::{Error, Result};
use crate::store::KvStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Marker for types stored whole through the marshal mechanism.
///
/// Implemented by `#[derive(Marshal)]`; the generator recognises the derive
/// and routes the field through [`decode`] and [`encode`].
pub trait Marshal: Serialize + DeserializeOwned {}

pub fn try_decode<T: Marshal>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    let Some(bytes) = store.decode_bytes(key) else {
        return Ok(None);
    };
    rmp_serde::from_slice(&bytes)
        .map(Some)
        .map_err(|err| Error::Unmarshal {
            key: key.to_string(),
            message: err.to_string(),
        })
}

/// Unreadable payloads count as absent.
pub fn decode<T: Marshal>(store: &dyn KvStore, key: &str) -> Option<T> {
    match try_decode(store, key) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "discarding unreadable structured preference");
            None
        }
    }
}

pub fn try_encode<T: Marshal>(store: &dyn KvStore, key: &str, value: Option<&T>) -> Result<()> {
    let Some(value) = value else {
        store.encode_bytes(key, None);
        return Ok(());
    };
    let bytes = rmp_serde::to_vec_named(value).map_err(|err| Error::Marshal {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    store.encode_bytes(key, Some(&bytes));
    Ok(())
}

/// A value that fails to marshal leaves the stored entry untouched.
pub fn encode<T: Marshal>(store: &dyn KvStore, key: &str, value: Option<&T>) {
    if let Err(err) = try_encode(store, key, value) {
        warn!(key, error = %err, "structured preference was not written");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKv;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Window {
        width: u32,
        title: String,
    }

    impl Marshal for Window {}

    #[test]
    fn structured_value_round_trips_through_bytes() {
        let store = MemoryKv::new();
        let window = Window {
            width: 640,
            title: "main".to_string(),
        };

        encode(&store, "window", Some(&window));
        assert_eq!(decode::<Window>(&store, "window"), Some(window));

        encode::<Window>(&store, "window", None);
        assert!(!store.contains_key("window"));
    }

    #[test]
    fn garbage_bytes_decode_as_absent() {
        let store = MemoryKv::new();
        store.encode_bytes("window", Some(&[0xc1]));

        assert!(try_decode::<Window>(&store, "window").is_err());
        assert_eq!(decode::<Window>(&store, "window"), None);
    }
}
