//! `stencil show <NAME>`: print a registered template body.

use anyhow::{Context, Result};
use clap::Args;

use super::{print_block, EngineArgs};

/// Arguments for `stencil show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Template name.
    pub name: String,
}

impl ShowArgs {
    pub fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build()?;
        let body = engine
            .get(&self.name)
            .with_context(|| format!("no template named '{}'", self.name))?;
        print_block(&body);
        Ok(())
    }
}
