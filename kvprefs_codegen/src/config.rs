use crate::error::{GenError, Result};
use std::path::{Path, PathBuf};

/// How nullability is compared when matching converter signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullableMatch {
    /// A non-nullable value may flow into a nullable slot; the generated
    /// call wraps it in `Some`.
    #[default]
    Lenient,
    /// Nullability must be identical on both sides.
    Exact,
}

impl NullableMatch {
    /// Whether a value of `value_nullable` may be passed where `slot_nullable`
    /// is expected.
    pub fn accepts(self, slot_nullable: bool, value_nullable: bool) -> bool {
        match self {
            Self::Lenient => slot_nullable || !value_nullable,
            Self::Exact => slot_nullable == value_nullable,
        }
    }
}

/// A source file to scan, with the module path it is compiled as.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub module: Vec<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, module: &str) -> Self {
        Self {
            path: path.into(),
            module: split_module_path(module),
        }
    }
}

/// Generator configuration
///
/// # Examples
///
/// ```
/// use kvprefs_codegen::GeneratorConfig;
///
/// let config = GeneratorConfig::new("target/generated")
///     .source("src/settings.rs", "settings")
///     .runtime_crate("::kvprefs");
/// assert_eq!(config.sources.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory receiving one file per declaration
    pub out_dir: PathBuf,

    /// Files scanned for declarations, enums, structured types and converters
    pub sources: Vec<SourceFile>,

    /// Path generated code uses to reach the runtime crate
    pub runtime_crate: String,

    /// Nullability rule for converter matching
    pub nullable_match: NullableMatch,

    /// Print `cargo:rerun-if-changed` for every source
    pub emit_rerun_hints: bool,
}

impl GeneratorConfig {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            sources: Vec::new(),
            runtime_crate: "::kvprefs".to_string(),
            nullable_match: NullableMatch::default(),
            emit_rerun_hints: false,
        }
    }

    /// Configuration for a build script: output goes to `OUT_DIR`, relative
    /// sources resolve against `CARGO_MANIFEST_DIR`, rerun hints are on.
    pub fn from_env() -> Result<Self> {
        let out_dir = std::env::var_os("OUT_DIR")
            .ok_or_else(|| GenError::Config("OUT_DIR is not set".to_string()))?;
        let mut config = Self::new(out_dir);
        config.emit_rerun_hints = true;
        Ok(config)
    }

    /// Add a source file compiled as `module` (`""` for the crate root,
    /// `"a::b"` for nested modules).
    pub fn source(mut self, path: impl AsRef<Path>, module: &str) -> Self {
        let path = resolve_against_manifest(path.as_ref());
        self.sources.push(SourceFile::new(path, module));
        self
    }

    pub fn runtime_crate(mut self, path: &str) -> Self {
        self.runtime_crate = path.to_string();
        self
    }

    pub fn nullable_match(mut self, rule: NullableMatch) -> Self {
        self.nullable_match = rule;
        self
    }

    pub fn emit_rerun_hints(mut self, enabled: bool) -> Self {
        self.emit_rerun_hints = enabled;
        self
    }

    pub fn runtime_path(&self) -> Result<syn::Path> {
        syn::parse_str(&self.runtime_crate).map_err(|err| {
            GenError::Config(format!(
                "runtime crate path '{}' is invalid: {err}",
                self.runtime_crate
            ))
        })
    }
}

fn resolve_against_manifest(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::var_os("CARGO_MANIFEST_DIR") {
        Some(dir) => PathBuf::from(dir).join(path),
        None => path.to_path_buf(),
    }
}

pub(crate) fn split_module_path(module: &str) -> Vec<String> {
    module
        .trim_start_matches("crate::")
        .split("::")
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != "crate")
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_rule_lets_values_widen_to_nullable() {
        let rule = NullableMatch::Lenient;
        assert!(rule.accepts(true, false));
        assert!(rule.accepts(true, true));
        assert!(rule.accepts(false, false));
        assert!(!rule.accepts(false, true));
    }

    #[test]
    fn exact_rule_requires_same_nullability() {
        let rule = NullableMatch::Exact;
        assert!(!rule.accepts(true, false));
        assert!(rule.accepts(true, true));
        assert!(!rule.accepts(false, true));
    }

    #[test]
    fn module_paths_are_crate_relative() {
        assert_eq!(split_module_path(""), Vec::<String>::new());
        assert_eq!(split_module_path("crate::model::custom"), vec!["model", "custom"]);
        assert_eq!(split_module_path("settings"), vec!["settings"]);
    }
}
