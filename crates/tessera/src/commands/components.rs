/*
 * components.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Components command implementation
 */

//! Lists the built-in components.

use std::process::ExitCode;

use anyhow::Result;
use tracing::debug;

use crate::components::builtin_registry;

/// Execute the components command
pub fn execute() -> Result<ExitCode> {
    let registry = builtin_registry();
    debug!("{} component(s) registered", registry.len());
    for name in registry.names() {
        println!("{}", name);
    }
    Ok(ExitCode::SUCCESS)
}
