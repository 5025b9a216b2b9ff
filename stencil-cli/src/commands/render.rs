//! `stencil render <TEMPLATE>`: render a template by name or raw body.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use stencil_renderer::RenderContext;

use super::{print_block, EngineArgs};

/// Arguments for `stencil render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Registered template name, or a raw template body.
    pub template: String,

    /// JSON file with the render data.
    #[arg(long, value_name = "FILE", conflicts_with = "json")]
    pub data: Option<PathBuf>,

    /// Render data as inline JSON.
    #[arg(long, value_name = "TEXT")]
    pub json: Option<String>,

    /// Report the exact failure instead of the logged soft failure.
    #[arg(long)]
    pub strict: bool,
}

impl RenderArgs {
    pub fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build()?;
        let data = self.load_data()?;

        let output = if self.strict {
            let ctx = RenderContext::from_json(data);
            engine
                .render(&self.template, &ctx)
                .with_context(|| format!("render failed for '{}'", self.template))?
        } else {
            match engine.set(&self.template, &data) {
                Some(output) => output,
                None => bail!("render failed for '{}'", self.template),
            }
        };

        print_block(&output);
        Ok(())
    }

    fn load_data(&self) -> Result<serde_json::Value> {
        if let Some(path) = &self.data {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("could not read data file '{}'", path.display()))?;
            return serde_json::from_str(&contents)
                .with_context(|| format!("invalid JSON in '{}'", path.display()));
        }
        if let Some(text) = &self.json {
            return serde_json::from_str(text).context("invalid JSON in --json");
        }
        Ok(serde_json::Value::Object(serde_json::Map::new()))
    }
}
