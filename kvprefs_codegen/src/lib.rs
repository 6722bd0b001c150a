//! Build-time generator for `kvprefs` preferences.
//!
//! A build script points the generator at the source files that declare
//! `#[derive(Preferences)]` structs. For each declaration the generator
//! writes `<snake_name>_preferences.rs` into `OUT_DIR`, containing a
//! `FooPreferences` accessor and a `FooEditor`, which the declaring module
//! pulls in with `include!`.
//!
//! ```no_run
//! // build.rs
//! use kvprefs_codegen::{Generator, GeneratorConfig};
//!
//! fn main() -> Result<(), kvprefs_codegen::GenError> {
//!     let config = GeneratorConfig::from_env()?.source("src/settings.rs", "settings");
//!     Generator::new(config).run()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod converter;
pub mod discovery;
pub mod emit;
pub mod error;
pub mod generator;
pub mod model;
pub mod plan;
pub mod resolver;

pub use config::{GeneratorConfig, NullableMatch, SourceFile};
pub use converter::{ConverterDescriptor, ConverterFn, ConverterRegistry, ConverterSource};
pub use discovery::Discovery;
pub use error::{GenError, Result};
pub use generator::{GeneratedFile, GenerationReport, Generator};
pub use model::{Field, PreferencesDeclaration, TypeRef, TypeShape};
pub use plan::{FieldKind, FieldPlan, PlanBuilder};
pub use resolver::{StoragePrimitive, resolve};
