//! In-memory node tree backing [`NodeFactory`].

use serde_json::{Map, Value, json};

use crate::node::{NodeFactory, NodeId};
use crate::spec::field::value_to_display;

const VOID_TAGS: [&str; 6] = ["input", "img", "br", "hr", "meta", "link"];

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Empty,
    Text(String),
    Markup(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    /// `None` marks an opaque markup node.
    tag: Option<String>,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    body: Body,
    value: Option<Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn element(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            attributes: Vec::new(),
            classes: Vec::new(),
            body: Body::Empty,
            value: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena of nodes addressed by stable [`NodeId`]s.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.get(node).and_then(|data| data.parent) else {
            return;
        };
        if let Some(parent_data) = self.get_mut(parent) {
            parent_data.children.retain(|child| *child != node);
        }
        if let Some(data) = self.get_mut(node) {
            data.parent = None;
        }
    }

    /// Text content of a node, ignoring its descendants.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.get(node).map(|data| &data.body) {
            Some(Body::Text(text)) | Some(Body::Markup(text)) => Some(text),
            _ => None,
        }
    }

    /// Serialises the subtree rooted at `node` as HTML.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        let Some(tag) = data.tag.as_deref() else {
            if let Body::Markup(markup) = &data.body {
                out.push_str(markup);
            }
            return;
        };

        out.push('<');
        out.push_str(tag);
        if !data.classes.is_empty() {
            push_attribute(out, "class", &data.classes.join(" "));
        }
        for (name, value) in &data.attributes {
            if name == "value" && data.value.is_some() && tag == "input" {
                continue;
            }
            push_attribute(out, name, value);
        }
        if tag == "input"
            && let Some(value) = &data.value
        {
            push_attribute(out, "value", &value_to_display(value));
        }
        if tag == "option" && self.option_selected(node) {
            out.push_str(" selected");
        }
        out.push('>');

        if VOID_TAGS.contains(&tag) {
            return;
        }

        match (&data.body, tag, &data.value) {
            (_, "textarea", Some(value)) => out.push_str(&escape(&value_to_display(value))),
            (Body::Text(text), _, _) => out.push_str(&escape(text)),
            (Body::Markup(markup), _, _) => out.push_str(markup),
            (Body::Empty, _, _) => {}
        }
        for child in &data.children {
            self.write_html(*child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn option_selected(&self, option: NodeId) -> bool {
        let Some(select) = self.get(option).and_then(|data| data.parent) else {
            return false;
        };
        let Some(selected) = self.get(select).and_then(|data| data.value.as_ref()) else {
            return false;
        };
        let own = self.attribute(option, "value").unwrap_or_default();
        match selected {
            Value::Array(values) => values.iter().any(|value| value_to_display(value) == own),
            value => value_to_display(value) == own,
        }
    }

    /// Exports the subtree rooted at `node` as a JSON structure.
    pub fn to_json(&self, node: NodeId) -> Value {
        let Some(data) = self.get(node) else {
            return Value::Null;
        };
        let mut map = Map::new();
        match &data.tag {
            Some(tag) => {
                map.insert("tag".into(), Value::String(tag.clone()));
            }
            None => {
                map.insert("markup".into(), Value::Bool(true));
            }
        }
        if !data.attributes.is_empty() {
            let attributes = data
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect::<Map<_, _>>();
            map.insert("attributes".into(), Value::Object(attributes));
        }
        if !data.classes.is_empty() {
            map.insert("classes".into(), json!(data.classes));
        }
        match &data.body {
            Body::Text(text) => {
                map.insert("text".into(), Value::String(text.clone()));
            }
            Body::Markup(markup) => {
                map.insert("html".into(), Value::String(markup.clone()));
            }
            Body::Empty => {}
        }
        if let Some(value) = &data.value {
            map.insert("value".into(), value.clone());
        }
        if !data.children.is_empty() {
            let children = data
                .children
                .iter()
                .map(|child| self.to_json(*child))
                .collect();
            map.insert("children".into(), Value::Array(children));
        }
        Value::Object(map)
    }
}

impl NodeFactory for Document {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::element(tag))
    }

    fn create_markup(&mut self, markup: &str) -> NodeId {
        let mut data = NodeData::element("");
        data.tag = None;
        data.body = Body::Markup(markup.to_string());
        self.alloc(data)
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.get(node).and_then(|data| data.tag.as_deref())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(data) = self.get_mut(node) else {
            return;
        };
        if name == "class" {
            data.classes = value.split_whitespace().map(str::to_string).collect();
            return;
        }
        match data.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(data) = self.get_mut(node) {
            if name == "class" {
                data.classes.clear();
            } else {
                data.attributes.retain(|(key, _)| key != name);
            }
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let data = self.get(node)?;
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(data) = self.get_mut(node) {
            data.body = Body::Text(text.to_string());
        }
    }

    fn set_markup(&mut self, node: NodeId, markup: &str) {
        if let Some(data) = self.get_mut(node) {
            data.body = Body::Markup(markup.to_string());
        }
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        if self.get(parent).is_none() || parent == child {
            return;
        }
        self.detach(child);
        if let Some(data) = self.get_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.get_mut(parent) {
            data.children.push(child);
        }
    }

    fn prepend(&mut self, parent: NodeId, child: NodeId) {
        if self.get(parent).is_none() || parent == child {
            return;
        }
        self.detach(child);
        if let Some(data) = self.get_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.get_mut(parent) {
            data.children.insert(0, child);
        }
    }

    fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        if anchor == node {
            return;
        }
        self.detach(node);
        if let Some(data) = self.get_mut(node) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.get_mut(parent) {
            let position = data
                .children
                .iter()
                .position(|child| *child == anchor)
                .map(|index| index + 1)
                .unwrap_or(data.children.len());
            data.children.insert(position, node);
        }
    }

    fn remove(&mut self, node: NodeId) {
        self.detach(node);
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = self.children(node);
        for child in children {
            self.detach(child);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn value(&self, node: NodeId) -> Option<Value> {
        self.get(node).and_then(|data| data.value.clone())
    }

    fn set_value(&mut self, node: NodeId, value: Value) {
        if let Some(data) = self.get_mut(node) {
            data.value = Some(value);
        }
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        let Some(mut data) = self.get(node).cloned() else {
            return self.create_element("div");
        };
        let children = std::mem::take(&mut data.children);
        data.parent = None;
        let copy = self.alloc(data);
        if deep {
            for child in children {
                let child_copy = self.clone_node(child, true);
                self.append(copy, child_copy);
            }
        }
        copy
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.get_mut(node)
            && !data.classes.iter().any(|existing| existing == class)
        {
            data.classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.get_mut(node) {
            data.classes.retain(|existing| existing != class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node)
            .map(|data| data.classes.iter().any(|existing| existing == class))
            .unwrap_or(false)
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
