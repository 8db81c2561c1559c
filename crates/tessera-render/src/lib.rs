/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render declarative node trees into plain configuration values.
//!
//! Authors describe configuration as a tree of nodes: string-tagged
//! elements, reusable function components, and two reserved containers
//! (merge and list). The renderer evaluates the tree into a plain
//! [`serde_json::Value`], which a downstream serializer can turn into YAML,
//! JSON or any other document format.
//!
//! # Architecture
//!
//! - [`node`]: the node model, decided once at construction time
//! - [`graph`]: ordering of top-level declarations by explicit dependencies
//! - [`merge`]: deep merge of rendered objects
//! - [`render`]: the asynchronous tree renderer
//! - [`context`]: ancestor paths used to annotate errors
//! - [`batch`]: settle-all rendering of named declarations
//! - [`document`]: a JSON encoding of node trees
//!
//! # Example
//!
//! ```ignore
//! use tessera_render::{Node, Renderer};
//!
//! let node = Node::element("service", vec![
//!     Node::element("name", vec!["web".into()]),
//!     Node::element("port", vec!["8080".into()]),
//! ]);
//!
//! let value = pollster::block_on(Renderer::default().render_node(&node))?;
//! assert_eq!(value, serde_json::json!({"service": {"name": "web", "port": 8080}}));
//! ```

pub mod batch;
pub mod context;
pub mod document;
pub mod error;
pub mod graph;
pub mod merge;
pub mod node;
pub mod render;

pub use batch::{BatchOutcome, Fulfilled, Rejected, render_declarations};
pub use context::{ContextPath, DEFAULT_SEPARATOR};
pub use document::{ComponentRegistry, decode_declarations, decode_node};
pub use error::{DecodeError, GraphError, MergeConflict, RenderError};
pub use graph::{Declaration, Wrapped, declare, resolve};
pub use merge::{deep_merge, merge_all};
pub use node::{
    Component, ContainerKind, ContainerToken, Element, FnComponent, Node, NodeId, NodeKind, Props,
    Scalar, Tag, anonymous_fn, component_fn, make_node,
};
pub use render::{RenderOptions, Renderer, coerce_scalar};
