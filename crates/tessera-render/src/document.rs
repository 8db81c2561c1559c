/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Decoding node trees from JSON.
//!
//! This is a small stand-in for a real syntax front end, so that node trees
//! can be written down as data. The encoding is:
//!
//! | JSON                                                   | Node                        |
//! |--------------------------------------------------------|-----------------------------|
//! | `null`, booleans, numbers, strings                     | leaves                      |
//! | `{"tag": "name", "props": {..}, "children": [..]}`     | string-tagged element       |
//! | `{"component": "Name", "props": {..}, "children": [..]}` | component from the registry |
//! | `{"merge": [..]}`                                      | merge container             |
//! | `{"list": [..]}`                                       | list container              |
//! | any other object                                       | untagged node               |
//!
//! A declaration document maps names to nodes. An entry may also be
//! `{"node": .., "after": ["name", ..]}`, which declares the node with the
//! named (earlier) declarations as dependencies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::graph::{Declaration, declare};
use crate::node::{Component, ContainerToken, Node, Scalar, Tag, make_node};

/// Components available to the decoder, by name.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, component: Arc<dyn Component>) {
        self.components.insert(name.into(), component);
    }

    /// Builder form of [`ComponentRegistry::register`].
    pub fn with(mut self, name: impl Into<String>, component: Arc<dyn Component>) -> Self {
        self.register(name, component);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Component>> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

/// Decode a single node.
pub fn decode_node(value: &Value, registry: &ComponentRegistry) -> Result<Node, DecodeError> {
    decode_at(value, registry, "")
}

/// Decode a declaration document.
///
/// Names keep document order. `after` may only name declarations that
/// appear earlier in the document.
pub fn decode_declarations(
    value: &Value,
    registry: &ComponentRegistry,
) -> Result<IndexMap<String, Declaration>, DecodeError> {
    let Value::Object(entries) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let mut declarations: IndexMap<String, Declaration> = IndexMap::new();
    for (name, entry) in entries {
        let pointer = format!("/{}", name);
        let declaration = match wrapped_entry(entry) {
            Some((node, after)) => {
                let node = decode_at(node, registry, &format!("{}/node", pointer))?;
                let dependencies = after
                    .iter()
                    .map(|dependency| lookup_dependency(&declarations, name, dependency))
                    .collect::<Result<Vec<_>, _>>()?;
                declare(dependencies, node)?
            }
            None => Declaration::Node(decode_at(entry, registry, &pointer)?),
        };
        declarations.insert(name.clone(), declaration);
    }
    Ok(declarations)
}

/// Split `{"node": .., "after": [..]}` into its parts.
fn wrapped_entry(entry: &Value) -> Option<(&Value, Vec<&Value>)> {
    let Value::Object(fields) = entry else {
        return None;
    };
    let node = fields.get("node")?;
    let after = match fields.get("after") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
        None => Vec::new(),
    };
    Some((node, after))
}

fn lookup_dependency(
    declarations: &IndexMap<String, Declaration>,
    name: &str,
    dependency: &Value,
) -> Result<Declaration, DecodeError> {
    let unknown = || DecodeError::UnknownDependency {
        name: name.to_string(),
        dependency: match dependency {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
    };
    let dependency = dependency.as_str().ok_or_else(unknown)?;
    declarations.get(dependency).cloned().ok_or_else(unknown)
}

fn decode_at(value: &Value, registry: &ComponentRegistry, pointer: &str) -> Result<Node, DecodeError> {
    match value {
        Value::Object(fields) => decode_object(fields, registry, pointer),
        Value::Array(_) => Err(invalid(
            pointer,
            "an array is not a node; use {\"list\": [..]} for sequences",
        )),
        scalar => match Scalar::from_value(scalar) {
            Some(scalar) => Ok(Node::leaf(scalar)),
            None => Err(invalid(pointer, "not a scalar")),
        },
    }
}

fn decode_object(
    fields: &Map<String, Value>,
    registry: &ComponentRegistry,
    pointer: &str,
) -> Result<Node, DecodeError> {
    if let Some(tag) = fields.get("tag") {
        let Value::String(tag) = tag else {
            return Err(invalid(pointer, "'tag' must be a string"));
        };
        let (properties, children) = decode_parts(fields, registry, pointer)?;
        return Ok(make_node(Tag::Name(tag.clone()), properties, children));
    }

    if let Some(name) = fields.get("component") {
        let Value::String(name) = name else {
            return Err(invalid(pointer, "'component' must be a string"));
        };
        let component = registry
            .get(name)
            .cloned()
            .ok_or_else(|| DecodeError::UnknownComponent {
                name: name.clone(),
                pointer: pointer.to_string(),
            })?;
        let (properties, children) = decode_parts(fields, registry, pointer)?;
        return Ok(make_node(component, properties, children));
    }

    if fields.len() == 1 {
        for (key, token) in [
            ("merge", ContainerToken::merge()),
            ("list", ContainerToken::list()),
        ] {
            if let Some(items) = fields.get(key) {
                let children = decode_children(items, registry, &format!("{}/{}", pointer, key))?;
                return Ok(make_node(token, Map::new(), children));
            }
        }
    }

    Ok(Node::untagged(fields.clone()))
}

fn decode_parts(
    fields: &Map<String, Value>,
    registry: &ComponentRegistry,
    pointer: &str,
) -> Result<(Map<String, Value>, Vec<Node>), DecodeError> {
    let properties = match fields.get("props") {
        Some(Value::Object(props)) => props.clone(),
        Some(_) => return Err(invalid(pointer, "'props' must be an object")),
        None => Map::new(),
    };
    let children = match fields.get("children") {
        Some(items) => decode_children(items, registry, &format!("{}/children", pointer))?,
        None => Vec::new(),
    };
    Ok((properties, children))
}

fn decode_children(
    items: &Value,
    registry: &ComponentRegistry,
    pointer: &str,
) -> Result<Vec<Node>, DecodeError> {
    let Value::Array(items) = items else {
        return Err(invalid(pointer, "children must be an array"));
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_at(item, registry, &format!("{}/{}", pointer, index)))
        .collect()
}

fn invalid(pointer: &str, message: &str) -> DecodeError {
    DecodeError::InvalidNode {
        pointer: pointer.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::render_declarations;
    use crate::node::{ContainerKind, NodeKind, component_fn};
    use crate::render::Renderer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_decode_shapes() {
        let registry = ComponentRegistry::new();
        let node = decode_node(
            &json!({"tag": "spec", "props": {"a": 1}, "children": ["x", {"list": [1, null]}]}),
            &registry,
        )
        .unwrap();

        let NodeKind::Element(element) = node.kind() else {
            panic!("expected element");
        };
        assert!(matches!(&element.tag, Tag::Name(name) if name == "spec"));
        assert_eq!(element.properties.get("a"), Some(&json!(1)));
        assert_eq!(element.children.len(), 2);

        let NodeKind::Element(list) = element.children[1].kind() else {
            panic!("expected list");
        };
        let Tag::Container(token) = &list.tag else {
            panic!("expected container");
        };
        assert_eq!(token.kind(), Some(ContainerKind::List));
    }

    #[test]
    fn test_untagged_object() {
        let node = decode_node(&json!({"name": "web", "merge": []}), &ComponentRegistry::new()).unwrap();
        assert!(matches!(node.kind(), NodeKind::Untagged(_)));
    }

    #[test]
    fn test_array_is_rejected() {
        let err = decode_node(&json!({"tag": "a", "children": [[1]]}), &ComponentRegistry::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidNode { ref pointer, .. } if pointer == "/children/0"
        ));
    }

    #[test]
    fn test_unknown_component() {
        let err = decode_node(&json!({"component": "Nope"}), &ComponentRegistry::new()).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownComponent { ref name, .. } if name == "Nope"));
    }

    #[test]
    fn test_registry_bookkeeping() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.is_empty());

        registry.register("Port", component_fn("Port", |_props| async { Ok(Node::null()) }));
        registry.register("Image", component_fn("Image", |_props| async { Ok(Node::null()) }));
        registry.register("Port", component_fn("Port", |_props| async { Ok(Node::null()) }));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Port"));
        assert!(!registry.contains("Volume"));
        assert_eq!(registry.names(), vec!["Image", "Port"]);
    }

    #[test]
    fn test_component_lookup() {
        let registry = ComponentRegistry::new().with(
            "Port",
            component_fn("Port", |props| async move {
                let number = props
                    .get("number")
                    .and_then(Scalar::from_value)
                    .unwrap_or(Scalar::Null);
                Ok(Node::element("port", vec![Node::leaf(number)]))
            }),
        );
        let node = decode_node(&json!({"component": "Port", "props": {"number": 80}}), &registry)
            .unwrap();
        let value = pollster::block_on(Renderer::default().render_node(&node)).unwrap();
        assert_eq!(value, json!({"port": 80}));
    }

    #[test]
    fn test_declaration_document() {
        let document = json!({
            "base": {"tag": "namespace", "children": ["prod"]},
            "app": {
                "node": {"tag": "deployment", "children": [{"tag": "replicas", "children": ["3"]}]},
                "after": ["base"]
            },
            "config": {"tag": "configmap", "children": [{"tag": "debug", "children": ["false"]}]}
        });
        let declarations = decode_declarations(&document, &ComponentRegistry::new()).unwrap();
        assert_eq!(declarations.len(), 3);
        assert_eq!(declarations["app"].dependencies().len(), 1);

        let outcome = pollster::block_on(render_declarations(&Renderer::default(), &declarations));
        assert_eq!(outcome.order, vec!["base", "app", "config"]);
        let values: Vec<(&str, &Value)> = outcome.ordered_values();
        assert_eq!(values[1], ("app", &json!({"deployment": {"replicas": 3}})));
        assert_eq!(values[2], ("config", &json!({"configmap": {"debug": false}})));
    }

    #[test]
    fn test_unknown_dependency() {
        let document = json!({
            "app": {"node": "x", "after": ["later"]},
            "later": "y"
        });
        let err = decode_declarations(&document, &ComponentRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownDependency { ref name, ref dependency }
                if name == "app" && dependency == "later"
        ));
    }

    #[test]
    fn test_document_must_be_object() {
        let err = decode_declarations(&json!([1, 2]), &ComponentRegistry::new()).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }
}
