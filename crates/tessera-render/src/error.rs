/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for declaration, rendering and decoding.

use thiserror::Error;

use crate::context::ContextPath;
use crate::node::NodeId;

/// A scalar was about to overwrite an existing key during a deep merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Merge conflict: key '{key}' is already set")]
pub struct MergeConflict {
    /// Dotted path of the conflicting key, relative to the merge root.
    pub key: String,
}

impl MergeConflict {
    /// Prefix the conflicting key with the key of the enclosing object.
    pub(crate) fn nested_under(self, parent: &str) -> Self {
        Self {
            key: format!("{}.{}", parent, self.key),
        }
    }
}

/// Errors raised while constructing declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A declaration lists, as a dependency, a wrapper around its own node.
    #[error("Circular dependency: node {node} depends on a declaration of itself")]
    CircularDependency { node: NodeId },
}

/// Errors that can occur while rendering a node.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The node is malformed (it carries no tag).
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A container token other than the reserved ones was used as a tag.
    #[error("Unsupported tag: container token '{token}' is not a known container")]
    UnsupportedTag { token: String },

    #[error(transparent)]
    MergeConflict(#[from] MergeConflict),

    /// A component returned an error.
    #[error("{source:#}")]
    Component {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// A component panicked.
    #[error("Component '{name}' panicked: {message}")]
    Panicked { name: String, message: String },

    /// Any of the above, annotated with the path at which it happened.
    #[error("{trail}\n  {source}")]
    Contextual {
        path: ContextPath,
        /// The path joined for display.
        trail: String,
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// Annotate this error with `path`.
    ///
    /// An error that already carries a path is returned unchanged, so the
    /// innermost (most specific) path wins as the error propagates upward.
    pub fn in_context(self, path: &ContextPath, separator: &str) -> Self {
        if self.is_contextual() {
            return self;
        }
        RenderError::Contextual {
            path: path.clone(),
            trail: path.display(separator),
            source: Box::new(self),
        }
    }

    pub fn is_contextual(&self) -> bool {
        matches!(self, RenderError::Contextual { .. })
    }

    /// The path attached to this error, if any.
    pub fn path(&self) -> Option<&ContextPath> {
        match self {
            RenderError::Contextual { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The underlying error with any context stripped.
    pub fn root_cause(&self) -> &RenderError {
        match self {
            RenderError::Contextual { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors raised while decoding a JSON node document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Declaration document must be a JSON object")]
    NotAnObject,

    #[error("Invalid node at '{pointer}': {message}")]
    InvalidNode { pointer: String, message: String },

    #[error("Unknown component '{name}' at '{pointer}'")]
    UnknownComponent { name: String, pointer: String },

    #[error("Declaration '{name}' depends on unknown declaration '{dependency}'")]
    UnknownDependency { name: String, dependency: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}
