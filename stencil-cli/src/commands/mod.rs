pub mod list;
pub mod program;
pub mod render;
pub mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stencil_renderer::{EngineConfig, TemplateEngine};

/// Options shared by every subcommand for building the engine.
#[derive(Args, Debug)]
pub struct EngineArgs {
    /// YAML catalogue of extra templates, loaded over the built-ins.
    #[arg(long, global = true, value_name = "FILE")]
    pub catalogue: Option<PathBuf>,

    /// YAML engine configuration.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl EngineArgs {
    pub fn build(&self) -> Result<TemplateEngine> {
        let config = match &self.config {
            Some(path) => EngineConfig::load_at(path)
                .with_context(|| format!("could not load config '{}'", path.display()))?,
            None => EngineConfig::default(),
        };
        let mut engine = TemplateEngine::new(config);
        if let Some(path) = &self.catalogue {
            let count = engine
                .registry_mut()
                .load_catalogue_at(path)
                .with_context(|| format!("could not load catalogue '{}'", path.display()))?;
            tracing::info!(path = %path.display(), count, "catalogue loaded");
        }
        Ok(engine)
    }
}

/// Print `text`, adding a trailing newline only when it lacks one.
pub fn print_block(text: &str) {
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
}
