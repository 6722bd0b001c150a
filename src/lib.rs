// ============================================================================
// kvprefs runtime
// ============================================================================
//
// Support code for preferences generated by `kvprefs_codegen`: the storage
// interface the generated decoders and encoders talk to, the codecs they
// rely on, and the observable state they publish.

pub mod error;
pub mod flow;
pub mod marshal;
pub mod memory;
pub mod nullable;
pub mod preferences;
pub mod published;
pub mod sentinel;
pub mod store;

pub use error::{Error, Result};
pub use flow::{MappedStateFlow, MappedSubscription, StateFlow};
pub use marshal::Marshal;
pub use memory::{MemoryKv, MemoryKvEngine, StoredValue};
pub use preferences::{PrefEnum, Preferences, PreferencesEditor};
pub use published::Published;
pub use sentinel::Sentinel;
pub use store::{KvEngine, KvStore};

pub use kvprefs_derive::{Marshal, PrefEnum, Preferences, type_converters};

/// Items generated code refers to; not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use parking_lot::Mutex;
    pub use std::collections::BTreeSet;
    pub use std::sync::Arc;
}

pub mod prelude {
    pub use crate::{
        KvEngine, KvStore, MappedStateFlow, Marshal, MemoryKv, MemoryKvEngine, PrefEnum,
        Preferences, PreferencesEditor, StateFlow, type_converters,
    };
}
