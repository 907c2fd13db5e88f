//! Node factory capability consumed by the assembler and the value binder.
//!
//! The engine never talks to a concrete UI toolkit. Everything it needs from
//! one is expressed by [`NodeFactory`]; [`crate::document::Document`] is the
//! in-memory implementation used by the CLI, the JSON component and the tests.

use std::fmt;

use serde_json::Value;

/// Opaque handle to a node owned by a [`NodeFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tags treated as value-carrying controls.
pub const CONTROL_TAGS: [&str; 3] = ["input", "select", "textarea"];

/// Descendant query understood by [`NodeFactory::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Attribute { name: String, value: Option<String> },
    Not(Box<Selector>),
    All(Vec<Selector>),
    Any(Vec<Selector>),
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Selector::Tag(tag.to_string())
    }

    pub fn attr(name: &str, value: &str) -> Self {
        Selector::Attribute {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    pub fn has_attr(name: &str) -> Self {
        Selector::Attribute {
            name: name.to_string(),
            value: None,
        }
    }

    /// Any `input`, `select` or `textarea`.
    pub fn control() -> Self {
        Selector::Any(CONTROL_TAGS.iter().map(|tag| Selector::tag(tag)).collect())
    }

    pub fn and(self, other: Selector) -> Self {
        match self {
            Selector::All(mut parts) => {
                parts.push(other);
                Selector::All(parts)
            }
            first => Selector::All(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Selector::Not(Box::new(self))
    }

    pub fn matches<F: NodeFactory + ?Sized>(&self, factory: &F, node: NodeId) -> bool {
        match self {
            Selector::Tag(tag) => factory.tag(node) == Some(tag.as_str()),
            Selector::Attribute { name, value } => match (factory.attribute(node, name), value) {
                (Some(actual), Some(expected)) => &actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
            Selector::Not(inner) => !inner.matches(factory, node),
            Selector::All(parts) => parts.iter().all(|part| part.matches(factory, node)),
            Selector::Any(parts) => parts.iter().any(|part| part.matches(factory, node)),
        }
    }
}

/// Capability to build and mutate a tree of tagged UI nodes.
///
/// Nodes are created detached and attached with `append`/`prepend`/
/// `insert_after`. Handles stay valid after a node is detached.
pub trait NodeFactory {
    fn create_element(&mut self, tag: &str) -> NodeId;
    /// Node holding pre-rendered markup that the engine treats as opaque.
    fn create_markup(&mut self, markup: &str) -> NodeId;
    /// Element tag, `None` for markup nodes and unknown handles.
    fn tag(&self, node: NodeId) -> Option<&str>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Replaces the node's content with escaped text.
    fn set_text(&mut self, node: NodeId, text: &str);
    /// Replaces the node's content with raw markup.
    fn set_markup(&mut self, node: NodeId, markup: &str);

    fn append(&mut self, parent: NodeId, child: NodeId);
    fn prepend(&mut self, parent: NodeId, child: NodeId);
    /// Inserts `node` as the next sibling of `anchor`.
    fn insert_after(&mut self, anchor: NodeId, node: NodeId);
    /// Detaches the node from its parent.
    fn remove(&mut self, node: NodeId);
    fn clear_children(&mut self, node: NodeId);
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn value(&self, node: NodeId) -> Option<Value>;
    fn set_value(&mut self, node: NodeId, value: Value);

    /// Copies a node, and its subtree when `deep` is set. Implementations that
    /// attach behaviour (event handlers) to nodes copy it onto the clone.
    fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId;

    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Descendants of `root` (excluding `root`) matching `selector`, in
    /// document order.
    fn query(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if selector.matches(self, node) {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    fn query_first(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.query(root, selector).into_iter().next()
    }
}
