//! `stencil program <TEMPLATE>`: print the compiled program listing.

use anyhow::{Context, Result};
use clap::Args;

use super::{print_block, EngineArgs};

/// Arguments for `stencil program`.
#[derive(Args, Debug)]
pub struct ProgramArgs {
    /// Registered template name, or a raw template body.
    pub template: String,
}

impl ProgramArgs {
    pub fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build()?;
        let program = engine
            .compile(&self.template)
            .with_context(|| format!("compile failed for '{}'", self.template))?;
        print_block(&program.to_string());
        Ok(())
    }
}
