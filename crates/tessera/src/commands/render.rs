/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! Reads a JSON declaration document, renders every declaration and writes
//! one document mapping declaration names to their values, in dependency
//! order. Declarations that fail are reported on stderr; the others are
//! still written, and the command exits with a failure status.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use tessera_render::{BatchOutcome, RenderOptions, Renderer, decode_declarations, render_declarations};

use crate::OutputFormat;
use crate::components::builtin_registry;

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    /// Declaration document, or `-` for stdin
    pub input: PathBuf,
    /// Output format
    pub format: OutputFormat,
    /// Disable scalar coercion
    pub raw_strings: bool,
    /// Context path separator for error messages
    pub separator: String,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<ExitCode> {
    let source = read_input(&args.input)?;
    let document: Value = serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse {} as JSON", args.input.display()))?;

    let registry = builtin_registry();
    let declarations = decode_declarations(&document, &registry)
        .with_context(|| format!("Invalid declaration document {}", args.input.display()))?;
    info!(
        "Rendering {} declaration(s) from {}",
        declarations.len(),
        args.input.display()
    );

    let options = RenderOptions::default()
        .with_separator(args.separator.as_str())
        .with_coerce_scalars(!args.raw_strings);
    let renderer = Renderer::new(options);
    let outcome = pollster::block_on(render_declarations(&renderer, &declarations));

    for rejected in &outcome.rejected {
        error!("Declaration '{}' failed:\n{}", rejected.name, rejected.reason);
    }

    print!("{}", format_outcome(&outcome, args.format)?);

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        debug!("Reading declarations from stdin");
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read stdin")?;
        Ok(source)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))
    }
}

/// Serialize fulfilled declarations, in dependency order.
pub fn format_outcome(outcome: &BatchOutcome, format: OutputFormat) -> Result<String> {
    let rendered: Map<String, Value> = outcome
        .ordered_values()
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    let rendered = Value::Object(rendered);

    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(&rendered).context("Failed to serialize output as YAML")
        }
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(&rendered)
                .context("Failed to serialize output as JSON")?;
            text.push('\n');
            Ok(text)
        }
    }
}
