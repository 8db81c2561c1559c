/*
 * graph.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Declaration ordering.
//!
//! A [`Declaration`] is either a bare node or a node wrapped with a list of
//! other declarations that must be ordered before it. [`resolve`] flattens a
//! set of declarations into a sequence where dependencies come first. The
//! ordering is bookkeeping only: no rendered value ever flows from a
//! dependency into its dependent.
//!
//! Cycle detection is deliberately shallow. [`declare`] rejects a wrapper
//! whose dependency is itself a wrapper around the very same node, and
//! nothing else. Longer chains are absorbed by the visited set in
//! [`resolve`] without an error.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::GraphError;
use crate::node::{Node, NodeId};

/// A node, optionally wrapped with dependencies.
#[derive(Debug, Clone)]
pub enum Declaration {
    Node(Node),
    Wrapped(Arc<Wrapped>),
}

/// A declaration with explicit ordering dependencies.
#[derive(Debug)]
pub struct Wrapped {
    id: NodeId,
    dependencies: Vec<Declaration>,
    node: Declaration,
}

impl Wrapped {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn dependencies(&self) -> &[Declaration] {
        &self.dependencies
    }

    /// The wrapped declaration (possibly another wrapper).
    pub fn node(&self) -> &Declaration {
        &self.node
    }
}

impl Declaration {
    /// Identity of this declaration: the node id, or the wrapper's own id.
    pub fn id(&self) -> NodeId {
        match self {
            Declaration::Node(node) => node.id(),
            Declaration::Wrapped(wrapped) => wrapped.id,
        }
    }

    /// The node at the bottom of the wrapper chain. This is what gets rendered.
    pub fn underlying(&self) -> &Node {
        match self {
            Declaration::Node(node) => node,
            Declaration::Wrapped(wrapped) => wrapped.node.underlying(),
        }
    }

    /// Direct dependencies; empty for a bare node.
    pub fn dependencies(&self) -> &[Declaration] {
        match self {
            Declaration::Node(_) => &[],
            Declaration::Wrapped(wrapped) => &wrapped.dependencies,
        }
    }
}

impl From<Node> for Declaration {
    fn from(node: Node) -> Self {
        Declaration::Node(node)
    }
}

/// Wrap `node` so that `dependencies` are ordered before it.
///
/// Fails with [`GraphError::CircularDependency`] when one of the
/// dependencies is a wrapper whose underlying node is the node being
/// wrapped. Bare-node dependencies are not checked.
pub fn declare(
    dependencies: Vec<Declaration>,
    node: impl Into<Declaration>,
) -> Result<Declaration, GraphError> {
    let node = node.into();
    let target = node.underlying().id();

    let wraps_target = dependencies.iter().any(|dependency| match dependency {
        Declaration::Wrapped(wrapped) => wrapped.node.underlying().id() == target,
        Declaration::Node(_) => false,
    });
    if wraps_target {
        return Err(GraphError::CircularDependency { node: target });
    }

    Ok(Declaration::Wrapped(Arc::new(Wrapped {
        id: NodeId::next(),
        dependencies,
        node,
    })))
}

/// Order the nodes behind `declarations` so that dependencies come first.
///
/// Declarations without a relative constraint keep the order in which they
/// were supplied. A node reached a second time is skipped.
pub fn resolve(declarations: &[Declaration]) -> Vec<Node> {
    let mut visited = HashSet::new();
    let mut ordered = Vec::new();
    for declaration in declarations {
        visit(declaration, &mut visited, &mut ordered);
    }
    debug!(
        declarations = declarations.len(),
        nodes = ordered.len(),
        "Resolved declaration order"
    );
    ordered
}

fn visit(declaration: &Declaration, visited: &mut HashSet<NodeId>, ordered: &mut Vec<Node>) {
    match declaration {
        Declaration::Wrapped(wrapped) => {
            if !visited.insert(wrapped.id) {
                trace!(id = %wrapped.id, "Wrapper already ordered");
                return;
            }
            for dependency in &wrapped.dependencies {
                visit(dependency, visited, ordered);
            }
            visit(&wrapped.node, visited, ordered);
        }
        Declaration::Node(node) => {
            if visited.insert(node.id()) {
                trace!(id = %node.id(), "Ordered node");
                ordered.push(node.clone());
            } else {
                trace!(id = %node.id(), "Node already ordered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(nodes: &[Node]) -> Vec<NodeId> {
        nodes.iter().map(Node::id).collect()
    }

    #[test]
    fn test_dependency_precedes_dependent() {
        let d1 = Node::element("d1", vec![]);
        let d2 = Node::element("d2", vec![]);

        let first: Declaration = d1.clone().into();
        let second = declare(vec![first.clone()], d2.clone()).unwrap();

        let order = resolve(&[second, first]);
        assert_eq!(ids(&order), vec![d1.id(), d2.id()]);
    }

    #[test]
    fn test_unrelated_keep_first_seen_order() {
        let a = Node::element("a", vec![]);
        let b = Node::element("b", vec![]);
        let c = Node::element("c", vec![]);

        let order = resolve(&[c.clone().into(), a.clone().into(), b.clone().into()]);
        assert_eq!(ids(&order), vec![c.id(), a.id(), b.id()]);
    }

    #[test]
    fn test_shared_dependency_ordered_once() {
        let base = Node::element("base", vec![]);
        let x = Node::element("x", vec![]);
        let y = Node::element("y", vec![]);

        let base_decl: Declaration = base.clone().into();
        let dx = declare(vec![base_decl.clone()], x.clone()).unwrap();
        let dy = declare(vec![base_decl.clone()], y.clone()).unwrap();

        let order = resolve(&[dx, dy, base_decl]);
        assert_eq!(ids(&order), vec![base.id(), x.id(), y.id()]);
    }

    #[test]
    fn test_structurally_identical_nodes_are_distinct() {
        let a = Node::element("x", vec!["hello".into()]);
        let b = Node::element("x", vec!["hello".into()]);
        let order = resolve(&[a.clone().into(), b.clone().into(), a.clone().into()]);
        assert_eq!(ids(&order), vec![a.id(), b.id()]);
    }

    #[test]
    fn test_one_hop_cycle_rejected_at_construction() {
        let x = Node::element("x", vec![]);
        let inner = declare(vec![], x.clone()).unwrap();
        let err = declare(vec![inner], x.clone()).unwrap_err();
        assert_eq!(err, GraphError::CircularDependency { node: x.id() });
    }

    #[test]
    fn test_cycle_check_follows_wrapper_chain() {
        let x = Node::element("x", vec![]);
        let inner = declare(vec![], declare(vec![], x.clone()).unwrap()).unwrap();
        assert!(declare(vec![inner], x.clone()).is_err());
    }

    #[test]
    fn test_bare_self_dependency_is_not_checked() {
        let x = Node::element("x", vec![]);
        let decl = declare(vec![x.clone().into()], x.clone()).unwrap();
        let order = resolve(&[decl]);
        assert_eq!(ids(&order), vec![x.id()]);
    }

    #[test]
    fn test_deeper_cycle_absorbed_by_visited_set() {
        let a = Node::element("a", vec![]);
        let b = Node::element("b", vec![]);

        // b is ordered after a wrapper of a, and a second wrapper of a lists
        // that b declaration: a -> b -> a, two hops.
        let a_first = declare(vec![], a.clone()).unwrap();
        let b_decl = declare(vec![a_first], b.clone()).unwrap();
        let a_again = declare(vec![b_decl], a.clone()).unwrap();

        let order = resolve(&[a_again]);
        assert_eq!(ids(&order), vec![a.id(), b.id()]);
    }

    #[test]
    fn test_underlying_follows_chain() {
        let x = Node::element("x", vec![]);
        let decl = declare(vec![], declare(vec![], x.clone()).unwrap()).unwrap();
        assert!(decl.underlying().same(&x));
        assert_ne!(decl.id(), x.id());
    }
}
