//! Declarations compiled through `kvprefs_codegen` by this crate's build
//! script. The integration tests under `tests/` drive the generated types.

pub mod model;

pub use model::converters::{
    Color, DateConverters, LevelConverters, Power, PowerConverters, list_converters,
};
pub use model::custom::{CustomData, CustomDataEditor, CustomDataPreferences};
pub use model::primitive::{
    Level, NullableData, NullableDataEditor, NullableDataPreferences, Payload, PrimitiveData,
    PrimitiveDataEditor, PrimitiveDataPreferences,
};
