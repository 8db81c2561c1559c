/*
 * components.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Components built into the command-line driver.
 */

//! Built-in components.
//!
//! Documents reference these by name with `{"component": "env", ...}`.

use std::sync::Arc;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tessera_render::{Component, ComponentRegistry, Node, Props, Scalar};

/// Reads an environment variable.
///
/// Props: `name` (required), `default` (scalar used when the variable is
/// unset). The value is a string leaf, so the renderer coerces it like any
/// other string.
pub struct EnvComponent;

#[async_trait]
impl Component for EnvComponent {
    fn name(&self) -> Option<&str> {
        Some("env")
    }

    async fn render(&self, props: Props) -> anyhow::Result<Node> {
        let name = props
            .get_str("name")
            .context("the env component requires a string 'name' property")?;

        match std::env::var(name) {
            Ok(value) => Ok(Node::from(value)),
            Err(std::env::VarError::NotPresent) => match props.get("default") {
                Some(default) => match Scalar::from_value(default) {
                    Some(scalar) => Ok(Node::leaf(scalar)),
                    None => bail!("default for environment variable '{}' must be a scalar", name),
                },
                None => bail!("environment variable '{}' is not set", name),
            },
            Err(err) => {
                Err(err).with_context(|| format!("failed to read environment variable '{}'", name))
            }
        }
    }
}

/// The registry used by the `render` command.
pub fn builtin_registry() -> ComponentRegistry {
    ComponentRegistry::new().with("env", Arc::new(EnvComponent))
}
