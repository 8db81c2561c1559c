/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Node model.
//!
//! A [`Node`] is an immutable, cheaply clonable handle onto one vertex of a
//! declarative tree. Every node receives a [`NodeId`] when it is constructed;
//! cloning the handle keeps the id, constructing a structurally identical
//! node does not. The dependency resolver keys on these ids.
//!
//! The shape of an element is decided once, at construction time, through
//! the closed [`Tag`] variant:
//!
//! - [`Tag::Name`]: a plain string tag, rendered as `{tag: ...}`
//! - [`Tag::Component`]: a function component invoked at render time
//! - [`Tag::Container`]: one of the reserved container tokens

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Number, Value};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a constructed node or wrapped declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate the next id from the process-wide counter.
    pub(crate) fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Convert a JSON value into a scalar. Objects and arrays are not scalars.
    pub fn from_value(value: &Value) -> Option<Scalar> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The plain value of this scalar, without any coercion.
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

const MERGE_TOKEN_ID: u64 = 0;
const LIST_TOKEN_ID: u64 = 1;

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(2);

/// The aggregation behavior selected by a reserved container token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Deep-merge children into one object.
    Merge,
    /// Collect children into an array, in order.
    List,
}

/// An identity token used as an element tag.
///
/// Tokens compare by identity only. The name is for diagnostics, so a token
/// minted with [`ContainerToken::new`]`("Merge")` is still not the merge
/// container.
#[derive(Debug, Clone)]
pub struct ContainerToken {
    id: u64,
    name: Cow<'static, str>,
}

impl ContainerToken {
    /// The reserved merge container.
    pub fn merge() -> Self {
        Self {
            id: MERGE_TOKEN_ID,
            name: Cow::Borrowed("Merge"),
        }
    }

    /// The reserved list container.
    pub fn list() -> Self {
        Self {
            id: LIST_TOKEN_ID,
            name: Cow::Borrowed("List"),
        }
    }

    /// Mint a new token distinct from every other token, including the
    /// reserved ones. The renderer does not know how to aggregate it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed),
            name: Cow::Owned(name.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which reserved container this is, if any.
    pub fn kind(&self) -> Option<ContainerKind> {
        match self.id {
            MERGE_TOKEN_ID => Some(ContainerKind::Merge),
            LIST_TOKEN_ID => Some(ContainerKind::List),
            _ => None,
        }
    }
}

impl PartialEq for ContainerToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContainerToken {}

/// What a component receives when it is invoked: the element's properties
/// together with its children.
#[derive(Debug, Clone, Default)]
pub struct Props {
    pub properties: Map<String, Value>,
    pub children: Vec<Node>,
}

impl Props {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Get a string-valued property.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// A function component.
///
/// Components are invoked by the renderer with the element's [`Props`] and
/// return the node to render in their place. The body may suspend (for
/// example on a network call); the renderer awaits it. Failures are
/// reported through `anyhow` and annotated with the render path.
#[async_trait]
pub trait Component: Send + Sync {
    /// Name used in error context paths. `None` renders as `"unknown"`.
    fn name(&self) -> Option<&str>;

    async fn render(&self, props: Props) -> anyhow::Result<Node>;
}

/// Adapter turning an async closure into a [`Component`].
pub struct FnComponent<F> {
    name: Option<String>,
    func: F,
}

#[async_trait]
impl<F, Fut> Component for FnComponent<F>
where
    F: Fn(Props) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Node>> + Send + 'static,
{
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn render(&self, props: Props) -> anyhow::Result<Node> {
        (self.func)(props).await
    }
}

/// Build a named component from an async closure.
pub fn component_fn<F, Fut>(name: impl Into<String>, func: F) -> Arc<dyn Component>
where
    F: Fn(Props) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Node>> + Send + 'static,
{
    Arc::new(FnComponent {
        name: Some(name.into()),
        func,
    })
}

/// Build a component without a name.
pub fn anonymous_fn<F, Fut>(func: F) -> Arc<dyn Component>
where
    F: Fn(Props) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Node>> + Send + 'static,
{
    Arc::new(FnComponent { name: None, func })
}

/// The tag of an element.
#[derive(Clone)]
pub enum Tag {
    Name(String),
    Component(Arc<dyn Component>),
    Container(ContainerToken),
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Tag::Component(component) => f
                .debug_tuple("Component")
                .field(&component.name().unwrap_or("unknown"))
                .finish(),
            Tag::Container(token) => f.debug_tuple("Container").field(token).finish(),
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::Name(name.to_string())
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::Name(name)
    }
}

impl From<ContainerToken> for Tag {
    fn from(token: ContainerToken) -> Self {
        Tag::Container(token)
    }
}

impl From<Arc<dyn Component>> for Tag {
    fn from(component: Arc<dyn Component>) -> Self {
        Tag::Component(component)
    }
}

/// A tagged element.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: Tag,
    /// Properties, never containing `children`.
    pub properties: Map<String, Value>,
    pub children: Vec<Node>,
}

/// The shape of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf(Scalar),
    Element(Element),
    /// An object handed over without any tag. Rendering it is an error.
    Untagged(Map<String, Value>),
}

struct NodeInner {
    id: NodeId,
    kind: NodeKind,
}

/// An immutable node handle.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    fn from_kind(kind: NodeKind) -> Self {
        Node(Arc::new(NodeInner {
            id: NodeId::next(),
            kind,
        }))
    }

    pub fn leaf(scalar: Scalar) -> Self {
        Self::from_kind(NodeKind::Leaf(scalar))
    }

    pub fn null() -> Self {
        Self::leaf(Scalar::Null)
    }

    /// A string-tagged element without properties.
    pub fn element(tag: impl Into<String>, children: Vec<Node>) -> Self {
        make_node(Tag::Name(tag.into()), Map::new(), children)
    }

    /// A merge container.
    pub fn merge(children: Vec<Node>) -> Self {
        make_node(ContainerToken::merge(), Map::new(), children)
    }

    /// A list container.
    pub fn list(children: Vec<Node>) -> Self {
        make_node(ContainerToken::list(), Map::new(), children)
    }

    /// A component element.
    pub fn component(
        component: Arc<dyn Component>,
        properties: Map<String, Value>,
        children: Vec<Node>,
    ) -> Self {
        make_node(component, properties, children)
    }

    pub fn untagged(fields: Map<String, Value>) -> Self {
        Self::from_kind(NodeKind::Untagged(fields))
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Whether two handles refer to the same constructed node.
    pub fn same(&self, other: &Node) -> bool {
        self.id() == other.id()
    }

    /// The identifier this node contributes to an error context path.
    pub fn segment(&self) -> String {
        match self.kind() {
            NodeKind::Leaf(scalar) => scalar.to_string(),
            NodeKind::Element(element) => match &element.tag {
                Tag::Name(name) => name.clone(),
                Tag::Component(component) => component.name().unwrap_or("unknown").to_string(),
                Tag::Container(token) => token.name().to_string(),
            },
            NodeKind::Untagged(_) => "unknown".to_string(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("kind", self.kind())
            .finish()
    }
}

/// Construct an element node.
///
/// This is the factory the syntax front end calls. A `children` entry in
/// `properties` is dropped; children are only ever taken from `children`.
pub fn make_node(
    tag: impl Into<Tag>,
    mut properties: Map<String, Value>,
    children: Vec<Node>,
) -> Node {
    properties.remove("children");
    Node::from_kind(NodeKind::Element(Element {
        tag: tag.into(),
        properties,
        children,
    }))
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::leaf(scalar)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::leaf(Scalar::String(text.to_string()))
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::leaf(Scalar::String(text))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::leaf(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::leaf(Scalar::Number(n.into()))
    }
}

impl From<f64> for Node {
    /// Non-finite numbers have no plain representation and become null.
    fn from(n: f64) -> Self {
        match Number::from_f64(n) {
            Some(number) => Node::leaf(Scalar::Number(number)),
            None => Node::null(),
        }
    }
}

impl From<()> for Node {
    fn from(_: ()) -> Self {
        Node::null()
    }
}
