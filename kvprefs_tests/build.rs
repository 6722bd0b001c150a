use kvprefs_codegen::{Generator, GeneratorConfig};

fn main() -> anyhow::Result<()> {
    let config = GeneratorConfig::from_env()?
        .source("src/model/primitive.rs", "model::primitive")
        .source("src/model/custom.rs", "model::custom")
        .source("src/model/converters.rs", "model::converters");

    Generator::new(config).run()?;
    Ok(())
}
