//! `stencil list`: registered template names.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use stencil_core::{TemplateDefinition, TemplateName};
use tabled::{settings::Style, Table, Tabled};

use super::EngineArgs;

/// Arguments for `stencil list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show a table with segment and byte counts.
    #[arg(long)]
    pub long: bool,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "template")]
    name: String,
    #[tabled(rename = "segments")]
    segments: usize,
    #[tabled(rename = "bytes")]
    bytes: usize,
    #[tabled(rename = "role")]
    role: &'static str,
}

impl TemplateRow {
    fn new(def: &TemplateDefinition, slot: &TemplateName) -> Self {
        Self {
            name: def.name.to_string(),
            segments: def.segments.len(),
            bytes: def.body().len(),
            role: if &def.name == slot { "dynamic slot" } else { "" },
        }
    }
}

impl ListArgs {
    pub fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build()?;
        let registry = engine.registry();
        let slot = registry.dynamic_slot();

        if self.long {
            let rows: Vec<TemplateRow> = registry
                .names()
                .into_iter()
                .filter_map(|name| registry.definition(name.0.as_str()))
                .map(|def| TemplateRow::new(def, slot))
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
            return Ok(());
        }

        for name in registry.names() {
            if name == slot {
                println!("{name}  {}", "(dynamic slot)".dimmed());
            } else {
                println!("{name}");
            }
        }
        Ok(())
    }
}
