/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tree rendering.
//!
//! The [`Renderer`] turns a [`Node`] into a plain [`Value`]:
//!
//! - leaves become scalars (string leaves are coerced, see [`coerce_scalar`])
//! - components are invoked and their result rendered in their place
//! - a string tag with exactly one child becomes `{tag: child}`
//! - a list container becomes an array of its children, in order
//! - a merge container, or a string tag with any other number of children,
//!   deep-merges its children left to right (wrapped as `{tag: merged}` for
//!   string tags)
//!
//! Children are launched together and awaited together. Combining their
//! values happens afterwards, strictly left to right, so completion order
//! never changes a result or which merge conflict is reported. A failing
//! child does not interrupt its siblings; once they have all settled, the
//! parent reports the first failure in child order and skips combining.
//!
//! Every failure is annotated with the [`ContextPath`] of the node where it
//! happened.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, join_all};
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::context::{ContextPath, DEFAULT_SEPARATOR};
use crate::error::RenderError;
use crate::merge::merge_all;
use crate::node::{Component, ContainerKind, Element, Node, NodeKind, Props, Scalar, Tag};

/// Options controlling rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Separator used when displaying context paths in errors.
    pub separator: String,

    /// Coerce numeric and boolean looking string leaves.
    pub coerce_scalars: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            coerce_scalars: true,
        }
    }
}

impl RenderOptions {
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_coerce_scalars(mut self, coerce: bool) -> Self {
        self.coerce_scalars = coerce;
        self
    }
}

/// Renders nodes into plain values.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a top-level node.
    pub async fn render_node(&self, node: &Node) -> Result<Value, RenderError> {
        self.render(node, ContextPath::root()).await
    }

    /// Render `node` below the ancestors in `path`.
    ///
    /// The node's own segment is appended to `path` before anything is
    /// evaluated, and any failure is annotated with the result unless it
    /// already carries a deeper path.
    pub fn render<'a>(
        &'a self,
        node: &'a Node,
        path: ContextPath,
    ) -> BoxFuture<'a, Result<Value, RenderError>> {
        async move {
            let here = path.child(node.segment());
            self.render_here(node, &here)
                .await
                .map_err(|err| err.in_context(&here, &self.options.separator))
        }
        .boxed()
    }

    async fn render_here(&self, node: &Node, here: &ContextPath) -> Result<Value, RenderError> {
        match node.kind() {
            NodeKind::Leaf(scalar) => Ok(self.render_leaf(scalar)),
            NodeKind::Untagged(fields) => {
                let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
                warn!(path = %here, keys = ?keys, "Node has no tag");
                Err(RenderError::Validation {
                    message: format!("node has no tag (keys: [{}])", keys.join(", ")),
                })
            }
            NodeKind::Element(element) => match &element.tag {
                Tag::Component(component) => self.render_component(component, element, here).await,
                Tag::Name(name) => {
                    let value = match element.children.as_slice() {
                        [only] => self.render(only, here.clone()).await?,
                        children => self.render_merged(children, here).await?,
                    };
                    Ok(single_entry(name, value))
                }
                Tag::Container(token) => match token.kind() {
                    Some(ContainerKind::List) => self.render_list(&element.children, here).await,
                    Some(ContainerKind::Merge) => {
                        self.render_merged(&element.children, here).await
                    }
                    None => Err(RenderError::UnsupportedTag {
                        token: token.name().to_string(),
                    }),
                },
            },
        }
    }

    fn render_leaf(&self, scalar: &Scalar) -> Value {
        match scalar {
            Scalar::String(text) if self.options.coerce_scalars => coerce_scalar(text),
            other => other.to_value(),
        }
    }

    async fn render_component(
        &self,
        component: &Arc<dyn Component>,
        element: &Element,
        here: &ContextPath,
    ) -> Result<Value, RenderError> {
        let name = component.name().unwrap_or("unknown");
        let props = Props {
            properties: element.properties.clone(),
            children: element.children.clone(),
        };

        debug!(component = name, path = %here, "Invoking component");
        let returned = AssertUnwindSafe(component.render(props))
            .catch_unwind()
            .await
            .map_err(|payload| RenderError::Panicked {
                name: name.to_string(),
                message: panic_message(payload.as_ref()),
            })?
            .map_err(|source| RenderError::Component {
                name: name.to_string(),
                source,
            })?;

        self.render(&returned, here.clone()).await
    }

    async fn render_list(&self, children: &[Node], here: &ContextPath) -> Result<Value, RenderError> {
        let values = self.render_children(children, here).await?;
        Ok(Value::Array(values))
    }

    async fn render_merged(
        &self,
        children: &[Node],
        here: &ContextPath,
    ) -> Result<Value, RenderError> {
        let values = self.render_children(children, here).await?;
        Ok(merge_all(&values)?)
    }

    /// Launch every child, then wait for all of them to settle. Results
    /// keep the children's order; the first failure in that order wins.
    async fn render_children(
        &self,
        children: &[Node],
        here: &ContextPath,
    ) -> Result<Vec<Value>, RenderError> {
        join_all(children.iter().map(|child| self.render(child, here.clone())))
            .await
            .into_iter()
            .collect()
    }
}

fn single_entry(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Coerce a string leaf.
///
/// `"true"` and `"false"` become booleans. A string whose trimmed text is a
/// finite number (decimal, exponent, or a `0x`/`0o`/`0b` integer) becomes
/// that number, as an integer when it has no fractional part. Every number
/// goes through an `f64` first, so integers past 2^53 round to the nearest
/// double (`"9007199254740993"` becomes `9007199254740992`) and oversized
/// prefixed literals still convert. Everything else is returned unchanged,
/// including the empty string and whitespace-only strings, which are not
/// read as zero.
pub fn coerce_scalar(text: &str) -> Value {
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match parse_number(text) {
            Some(number) => Value::Number(number),
            None => Value::String(text.to_string()),
        },
    }
}

/// Integral doubles below this magnitude fit in an `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Rust also accepts "inf" and "NaN" here; neither is a plain value.
    let float = match parse_prefixed_integer(trimmed) {
        Some(float) => float,
        None => trimmed.parse::<f64>().ok()?,
    };
    if !float.is_finite() {
        return None;
    }
    if float.fract() == 0.0 && float.abs() < I64_LIMIT {
        return Some((float as i64).into());
    }
    Number::from_f64(float)
}

fn parse_prefixed_integer(text: &str) -> Option<f64> {
    let (digits, radix) = if let Some(rest) = text.strip_prefix("0x").or(text.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0o").or(text.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix("0b").or(text.strip_prefix("0B")) {
        (rest, 2)
    } else {
        return None;
    };

    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|digit| acc * f64::from(radix) + f64::from(digit))
    })
}
