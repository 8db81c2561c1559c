/*
 * batch.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Rendering a set of named declarations.
//!
//! Unlike a single tree, where the first failing child fails its parent,
//! a batch reports every declaration's outcome: one declaration's failure
//! never hides another's result.

use std::collections::HashMap;

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{error, info};

use crate::error::RenderError;
use crate::graph::{Declaration, resolve};
use crate::render::Renderer;

/// A declaration that rendered successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct Fulfilled {
    pub name: String,
    pub value: Value,
}

/// A declaration whose rendering failed.
#[derive(Debug)]
pub struct Rejected {
    pub name: String,
    pub reason: RenderError,
}

/// The settled outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Declaration names in dependency order.
    pub order: Vec<String>,
    /// Successful declarations, in input order.
    pub fulfilled: Vec<Fulfilled>,
    /// Failed declarations, in input order.
    pub rejected: Vec<Rejected>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Fulfilled values, following the dependency order.
    pub fn ordered_values(&self) -> Vec<(&str, &Value)> {
        let by_name: HashMap<&str, &Value> = self
            .fulfilled
            .iter()
            .map(|f| (f.name.as_str(), &f.value))
            .collect();
        self.order
            .iter()
            .filter_map(|name| by_name.get(name.as_str()).map(|value| (name.as_str(), *value)))
            .collect()
    }
}

/// Render every declaration concurrently and settle all of them.
pub async fn render_declarations(
    renderer: &Renderer,
    declarations: &IndexMap<String, Declaration>,
) -> BatchOutcome {
    info!(declarations = declarations.len(), "Rendering declarations");

    let order = declaration_order(declarations);

    let settled = join_all(declarations.iter().map(|(name, declaration)| async move {
        (name, renderer.render_node(declaration.underlying()).await)
    }))
    .await;

    let mut outcome = BatchOutcome {
        order,
        ..BatchOutcome::default()
    };
    for (name, result) in settled {
        match result {
            Ok(value) => outcome.fulfilled.push(Fulfilled {
                name: name.clone(),
                value,
            }),
            Err(reason) => {
                error!(declaration = %name, error = %reason, "Declaration failed");
                outcome.rejected.push(Rejected {
                    name: name.clone(),
                    reason,
                });
            }
        }
    }

    info!(
        fulfilled = outcome.fulfilled.len(),
        rejected = outcome.rejected.len(),
        "Rendered declarations"
    );
    outcome
}

/// Names sorted by where their underlying node lands in the resolved order.
fn declaration_order(declarations: &IndexMap<String, Declaration>) -> Vec<String> {
    let all: Vec<Declaration> = declarations.values().cloned().collect();
    let position: HashMap<_, usize> = resolve(&all)
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id(), index))
        .collect();

    let mut names: Vec<(usize, &String)> = declarations
        .iter()
        .map(|(name, declaration)| {
            let index = position
                .get(&declaration.underlying().id())
                .copied()
                .unwrap_or(usize::MAX);
            (index, name)
        })
        .collect();
    names.sort_by_key(|(index, _)| *index);
    names.into_iter().map(|(_, name)| name.clone()).collect()
}
