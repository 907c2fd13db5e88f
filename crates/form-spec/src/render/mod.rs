//! Node construction for a planned form.

pub mod buttons;
pub mod fields;
pub mod sections;

use serde_json::{Map, Value};

use crate::node::{NodeFactory, NodeId};
use crate::spec::field::{Content, value_to_display};

/// Copies descriptor keys onto a node.
///
/// `text` and `html` become the node's content, `false`/`null` values are
/// dropped and `true` renders as a bare boolean attribute.
pub(crate) fn apply_attributes<F: NodeFactory>(
    factory: &mut F,
    node: NodeId,
    attributes: &Map<String, Value>,
    reserved: &[&str],
) {
    for (key, value) in attributes {
        if reserved.contains(&key.as_str()) {
            continue;
        }
        match (key.as_str(), value) {
            (_, Value::Null) | (_, Value::Bool(false)) => {}
            ("text", value) => factory.set_text(node, &value_to_display(value)),
            ("html", value) => factory.set_markup(node, &value_to_display(value)),
            (key, Value::Bool(true)) => factory.set_attribute(node, key, key),
            (key, value) => factory.set_attribute(node, key, &value_to_display(value)),
        }
    }
}

pub(crate) fn set_content<F: NodeFactory>(factory: &mut F, node: NodeId, content: &Content) {
    match content {
        Content::Markup(markup) => factory.set_markup(node, markup),
        Content::Text(text) => factory.set_text(node, text),
    }
}
