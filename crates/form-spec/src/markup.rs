//! Parses rendered template markup into factory nodes.
//!
//! html5ever builds the fragment into a small scratch arena through
//! [`FragmentSink`]; the body's children are then replayed through a
//! [`NodeFactory`] so templated controls become ordinary nodes the binder can
//! query.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName};

use crate::document::escape;
use crate::node::{NodeFactory, NodeId};

static NO_NAME: QualName = QualName {
    prefix: None,
    ns: html5ever::ns!(),
    local: html5ever::local_name!(""),
};

#[derive(Debug)]
enum Piece {
    Document,
    Element {
        name: Rc<QualName>,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment,
}

#[derive(Debug)]
struct Entry {
    piece: Piece,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
struct Scratch {
    entries: Vec<Entry>,
}

impl Scratch {
    fn alloc(&mut self, piece: Piece) -> usize {
        self.entries.push(Entry {
            piece,
            parent: None,
            children: Vec::new(),
        });
        self.entries.len() - 1
    }

    fn detach(&mut self, node: usize) {
        let Some(parent) = self.entries.get(node).and_then(|entry| entry.parent) else {
            return;
        };
        if let Some(entry) = self.entries.get_mut(parent) {
            entry.children.retain(|child| *child != node);
        }
        if let Some(entry) = self.entries.get_mut(node) {
            entry.parent = None;
        }
    }

    fn insert(&mut self, parent: usize, position: Option<usize>, child: NodeOrText<FragmentHandle>) {
        let node = match child {
            NodeOrText::AppendNode(handle) => handle.index,
            NodeOrText::AppendText(text) => {
                let previous = match position {
                    Some(0) => None,
                    Some(position) => self.child_at(parent, position - 1),
                    None => self.entries.get(parent).and_then(|entry| entry.children.last().copied()),
                };
                if let Some(Entry {
                    piece: Piece::Text(existing),
                    ..
                }) = previous.and_then(|index| self.entries.get_mut(index))
                {
                    existing.push_str(&text);
                    return;
                }
                self.alloc(Piece::Text(text.to_string()))
            }
        };
        self.detach(node);
        let Some(entry) = self.entries.get_mut(parent) else {
            return;
        };
        match position {
            Some(position) if position <= entry.children.len() => {
                entry.children.insert(position, node)
            }
            _ => entry.children.push(node),
        }
        if let Some(entry) = self.entries.get_mut(node) {
            entry.parent = Some(parent);
        }
    }

    fn child_at(&self, parent: usize, position: usize) -> Option<usize> {
        self.entries
            .get(parent)
            .and_then(|entry| entry.children.get(position).copied())
    }

    fn local_name(&self, node: usize) -> Option<&str> {
        match self.entries.get(node).map(|entry| &entry.piece) {
            Some(Piece::Element { name, .. }) => Some(&*name.local),
            _ => None,
        }
    }

    fn find_element(&self, root: usize, local: &str) -> Option<usize> {
        if self.local_name(root) == Some(local) {
            return Some(root);
        }
        self.entries.get(root).and_then(|entry| {
            entry
                .children
                .iter()
                .find_map(|child| self.find_element(*child, local))
        })
    }
}

/// Handle into the scratch arena. Element handles carry their name so
/// `elem_name` can lend it without reaching through the `RefCell`.
#[derive(Debug, Clone)]
pub struct FragmentHandle {
    index: usize,
    name: Option<Rc<QualName>>,
}

/// `TreeSink` collecting a parsed template into a scratch arena.
#[derive(Debug)]
pub struct FragmentSink {
    scratch: RefCell<Scratch>,
}

impl Default for FragmentSink {
    fn default() -> Self {
        let mut scratch = Scratch::default();
        scratch.alloc(Piece::Document);
        Self {
            scratch: RefCell::new(scratch),
        }
    }
}

impl FragmentSink {
    fn handle(&self, index: usize) -> FragmentHandle {
        let name = match self.scratch.borrow().entries.get(index).map(|entry| &entry.piece) {
            Some(Piece::Element { name, .. }) => Some(Rc::clone(name)),
            _ => None,
        };
        FragmentHandle { index, name }
    }

    /// Replays the parsed body's children through `factory`, returning the
    /// new top-level nodes in order. Whitespace between top-level elements is
    /// dropped.
    pub fn replay<F: NodeFactory + ?Sized>(&self, factory: &mut F) -> Vec<NodeId> {
        let scratch = self.scratch.borrow();
        let Some(body) = scratch.find_element(0, "body") else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        for child in &scratch.entries[body].children {
            if is_blank_text(&scratch, *child) {
                continue;
            }
            nodes.extend(replay_node(&scratch, *child, factory));
        }
        nodes
    }
}

fn is_blank_text(scratch: &Scratch, index: usize) -> bool {
    matches!(
        scratch.entries.get(index).map(|entry| &entry.piece),
        Some(Piece::Text(text)) if text.trim().is_empty()
    )
}

fn replay_node<F: NodeFactory + ?Sized>(
    scratch: &Scratch,
    index: usize,
    factory: &mut F,
) -> Option<NodeId> {
    let entry = scratch.entries.get(index)?;
    match &entry.piece {
        Piece::Element { name, attributes } => {
            let node = factory.create_element(&name.local);
            for (attribute, value) in attributes {
                factory.set_attribute(node, attribute, value);
            }
            let texts_only = entry.children.iter().all(|child| {
                matches!(
                    scratch.entries.get(*child).map(|entry| &entry.piece),
                    Some(Piece::Text(_))
                )
            });
            if texts_only {
                let text = entry
                    .children
                    .iter()
                    .filter_map(|child| match scratch.entries.get(*child).map(|e| &e.piece) {
                        Some(Piece::Text(text)) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<String>();
                if !text.is_empty() {
                    factory.set_text(node, &text);
                }
            } else {
                for child in &entry.children {
                    if &*name.local == "select" && is_blank_text(scratch, *child) {
                        continue;
                    }
                    if let Some(child) = replay_node(scratch, *child, factory) {
                        factory.append(node, child);
                    }
                }
            }
            Some(node)
        }
        Piece::Text(text) => Some(factory.create_markup(&escape(text))),
        Piece::Document | Piece::Comment => None,
    }
}

impl TreeSink for FragmentSink {
    type Handle = FragmentHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {}

    fn get_document(&self) -> Self::Handle {
        self.handle(0)
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        target.name.as_deref().unwrap_or(&NO_NAME)
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let name = Rc::new(name);
        let attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        let index = self.scratch.borrow_mut().alloc(Piece::Element {
            name: Rc::clone(&name),
            attributes,
        });
        FragmentHandle {
            index,
            name: Some(name),
        }
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        let index = self.scratch.borrow_mut().alloc(Piece::Comment);
        self.handle(index)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.create_comment(StrTendril::new())
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.scratch.borrow_mut().insert(parent.index, None, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self
            .scratch
            .borrow()
            .entries
            .get(element.index)
            .and_then(|entry| entry.parent);
        match parent {
            Some(parent) => self.scratch.borrow_mut().insert(parent, None, child),
            None => self.append(prev_element, child),
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.index == y.index
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut scratch = self.scratch.borrow_mut();
        let Some(parent) = scratch
            .entries
            .get(sibling.index)
            .and_then(|entry| entry.parent)
        else {
            return;
        };
        if let NodeOrText::AppendNode(node) = &new_node {
            scratch.detach(node.index);
        }
        let position = scratch.entries[parent]
            .children
            .iter()
            .position(|child| *child == sibling.index);
        scratch.insert(parent, position, new_node);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut scratch = self.scratch.borrow_mut();
        if let Some(Entry {
            piece: Piece::Element { attributes, .. },
            ..
        }) = scratch.entries.get_mut(target.index)
        {
            for attr in attrs {
                let name: &str = &attr.name.local;
                if !attributes.iter().any(|(existing, _)| existing == name) {
                    attributes.push((name.to_string(), attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.scratch.borrow_mut().detach(target.index);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut scratch = self.scratch.borrow_mut();
        let children = scratch
            .entries
            .get_mut(node.index)
            .map(|entry| std::mem::take(&mut entry.children))
            .unwrap_or_default();
        for child in children {
            if let Some(entry) = scratch.entries.get_mut(child) {
                entry.parent = None;
            }
            scratch.insert(new_parent.index, None, NodeOrText::AppendNode(FragmentHandle {
                index: child,
                name: None,
            }));
        }
    }
}

/// Parses `html` as body content and builds it with `factory`, returning the
/// top-level nodes in document order. They are created detached.
pub fn build_fragment<F: NodeFactory + ?Sized>(factory: &mut F, html: &str) -> Vec<NodeId> {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{}</body></html>", html);
    let sink = parse_document(FragmentSink::default(), ParseOpts::default())
        .from_utf8()
        .one(wrapped.as_bytes());
    sink.replay(factory)
}
