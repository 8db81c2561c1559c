//! Tessera CLI - Main entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod components;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(version)]
#[command(about = "Render declarative node trees into configuration documents", long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "tessera_render=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON declaration document
    Render {
        /// Declaration document (use '-' for stdin)
        input: PathBuf,

        /// Output document format
        #[arg(short = 't', long, value_enum, default_value_t = OutputFormat::Yaml)]
        to: OutputFormat,

        /// Keep string leaves as strings (no number/boolean coercion)
        #[arg(long)]
        raw_strings: bool,

        /// Separator between path segments in error messages
        #[arg(long, default_value = tessera_render::DEFAULT_SEPARATOR)]
        separator: String,
    },

    /// List the components available to documents
    Components,
}

/// Serialization format for rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "tessera=info,tessera_render=warn".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Render {
            input,
            to,
            raw_strings,
            separator,
        } => commands::render::execute(commands::render::RenderArgs {
            input,
            format: to,
            raw_strings,
            separator,
        }),
        Commands::Components => commands::components::execute(),
    }
}
