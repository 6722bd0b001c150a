use crate::config::GeneratorConfig;
use crate::converter::ConverterRegistry;
use crate::discovery::Discovery;
use crate::emit::Emitter;
use crate::error::{GenError, Result};
use crate::plan::PlanBuilder;
use std::path::PathBuf;
use tracing::{info, info_span};

const HEADER: &str = "// @generated by kvprefs_codegen. Do not edit.\n\n";

/// Source produced for one declaration.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub declaration: String,
    pub file_name: String,
    pub contents: String,
}

/// Outcome of a successful [`Generator::run`].
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub declarations: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// One generation pass over the configured sources.
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Scans every configured source.
    pub fn discover(&self) -> Result<Discovery> {
        let mut discovery = Discovery::new();
        for source in &self.config.sources {
            if self.config.emit_rerun_hints {
                println!("cargo:rerun-if-changed={}", source.path.display());
            }
            discovery.scan_file(source)?;
        }
        Ok(discovery)
    }

    /// Plans and emits every declaration without touching the disk.
    ///
    /// Fails on the first invalid declaration; nothing is produced for it.
    pub fn generate(&self, discovery: &Discovery) -> Result<Vec<GeneratedFile>> {
        let runtime = self.config.runtime_path()?;
        let emitter = Emitter::new(&runtime);

        let mut registry = ConverterRegistry::new(self.config.nullable_match);
        for source in &discovery.converters {
            registry.register(source.clone());
        }

        let mut files = Vec::with_capacity(discovery.declarations.len());
        for declaration in &discovery.declarations {
            let span = info_span!(
                "codegen.declaration",
                declaration = %declaration.ident,
                id = %declaration.id
            );
            let _entered = span.enter();

            let plans = PlanBuilder::new(
                declaration,
                &discovery.enums,
                &discovery.structured,
                &registry,
            )
            .plan_declaration()?;

            let tokens = emitter.declaration(declaration, &plans);
            let file: syn::File = syn::parse2(tokens).map_err(|err| GenError::Format {
                declaration: declaration.name(),
                source: err,
            })?;

            files.push(GeneratedFile {
                declaration: declaration.name(),
                file_name: format!("{}.rs", declaration.file_stem()),
                contents: format!("{HEADER}{}", prettyplease::unparse(&file)),
            });
        }
        Ok(files)
    }

    /// Discovers, generates and writes one file per declaration into the
    /// output directory.
    pub fn run(&self) -> Result<GenerationReport> {
        let discovery = self.discover()?;
        let files = self.generate(&discovery)?;

        let out_dir = &self.config.out_dir;
        std::fs::create_dir_all(out_dir).map_err(|err| GenError::Io {
            path: out_dir.clone(),
            source: err,
        })?;

        let mut report = GenerationReport::default();
        for file in files {
            let path = out_dir.join(&file.file_name);
            std::fs::write(&path, &file.contents).map_err(|err| GenError::Io {
                path: path.clone(),
                source: err,
            })?;
            info!(
                declaration = %file.declaration,
                path = %path.display(),
                "wrote preferences implementation"
            );
            report.declarations.push(file.declaration);
            report.files.push(path);
        }
        Ok(report)
    }
}
