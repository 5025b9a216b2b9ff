//! Stencil: render `<% … %>` templates from the shell.
//!
//! # Usage
//!
//! ```text
//! stencil render <TEMPLATE> [--data FILE | --json TEXT] [--strict]
//! stencil list [--long]
//! stencil show <NAME>
//! stencil program <TEMPLATE>
//! ```
//!
//! Every subcommand accepts `--catalogue FILE` and `--config FILE`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    list::ListArgs, program::ProgramArgs, render::RenderArgs, show::ShowArgs, EngineArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stencil",
    version,
    about = "Render embedded-directive templates against JSON data",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template by name or raw body.
    Render(RenderArgs),

    /// List registered template names.
    List(ListArgs),

    /// Print the raw body of a registered template.
    Show(ShowArgs),

    /// Print the program a template compiles to.
    Program(ProgramArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => args.run(&cli.engine),
        Commands::List(args) => args.run(&cli.engine),
        Commands::Show(args) => args.run(&cli.engine),
        Commands::Program(args) => args.run(&cli.engine),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
