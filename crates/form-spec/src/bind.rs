//! Value binding against an already built form.

use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;
use crate::node::{NodeFactory, NodeId, Selector};
use crate::render::fields::{IMAGE_FOR_ATTRIBUTE, IMAGE_SOURCE_ATTRIBUTE, option_node};
use crate::rendered::RenderedForm;
use crate::spec::field::{OptionConfig, value_to_display};

/// Marks image displays cloned from the original for extra values.
pub const IMAGE_CLONE_ATTRIBUTE: &str = "data-image-clone";

/// Select control addressed by name or by handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRef {
    ByName(String),
    ByHandle(NodeId),
}

impl From<&str> for ControlRef {
    fn from(name: &str) -> Self {
        ControlRef::ByName(name.to_string())
    }
}

impl From<NodeId> for ControlRef {
    fn from(node: NodeId) -> Self {
        ControlRef::ByHandle(node)
    }
}

impl<F: NodeFactory> RenderedForm<F> {
    /// Applies `{ <control name>: <value> }` to the form.
    ///
    /// A name can match plain controls and image displays at the same time;
    /// both are updated.
    pub fn apply_values(&mut self, values: &Value) -> Result<(), ConfigError> {
        let values = values.as_object().ok_or(ConfigError::ValuesNotRecord)?;
        for (name, value) in values {
            self.bind_controls(name, value);
            self.bind_images(name, value);
        }
        Ok(())
    }

    /// Replaces the options of a select control and returns how many option
    /// nodes it now holds. Empty input leaves the control untouched.
    pub fn populate_options(
        &mut self,
        control: ControlRef,
        options: &[OptionConfig],
        include_empty: bool,
    ) -> Result<usize, ConfigError> {
        let node = self.resolve_control(&control)?;
        if self.factory.tag(node) != Some("select") {
            return Err(ConfigError::NotASelect(node.to_string()));
        }
        Ok(populate_select(&mut self.factory, node, options, include_empty))
    }

    /// Points the form at a new submission target.
    pub fn set_submission_target(&mut self, target: &str) -> Result<(), ConfigError> {
        if target.trim().is_empty() {
            return Err(ConfigError::MissingAction);
        }
        self.factory.set_attribute(self.form, "action", target);
        Ok(())
    }

    /// Controls bound to `name`, excluding the hidden inputs owned by image
    /// displays.
    pub fn controls_named(&self, name: &str) -> Vec<NodeId> {
        let selector = Selector::control()
            .and(Selector::attr("name", name))
            .and(Selector::has_attr(IMAGE_SOURCE_ATTRIBUTE).negate());
        self.factory.query(self.form, &selector)
    }

    /// Image displays for `name`, clones included, in document order.
    pub fn images_named(&self, name: &str) -> Vec<NodeId> {
        let selector = Selector::tag("figure").and(Selector::attr(IMAGE_FOR_ATTRIBUTE, name));
        self.factory.query(self.form, &selector)
    }

    fn resolve_control(&self, control: &ControlRef) -> Result<NodeId, ConfigError> {
        match control {
            ControlRef::ByName(name) => self
                .controls_named(name)
                .into_iter()
                .next()
                .ok_or_else(|| ConfigError::UnknownControl(name.clone())),
            ControlRef::ByHandle(node) => match self.factory.tag(*node) {
                Some(_) => Ok(*node),
                None => Err(ConfigError::UnknownControl(node.to_string())),
            },
        }
    }

    fn bind_controls(&mut self, name: &str, value: &Value) {
        for control in self.controls_named(name) {
            let is_select = self.factory.tag(control) == Some("select");
            match value {
                Value::Array(items) if is_select => {
                    let options = items.iter().map(OptionConfig::from_value).collect::<Vec<_>>();
                    populate_select(&mut self.factory, control, &options, true);
                }
                _ => self.factory.set_value(control, value.clone()),
            }
        }
    }

    fn bind_images(&mut self, name: &str, value: &Value) {
        let sources = match value {
            Value::Array(items) => items.clone(),
            scalar => vec![scalar.clone()],
        };
        if sources.is_empty() {
            return;
        }

        let originals = self
            .images_named(name)
            .into_iter()
            .filter(|figure| self.factory.attribute(*figure, IMAGE_CLONE_ATTRIBUTE).is_none())
            .collect::<Vec<_>>();

        for original in originals {
            let existing = self.following_clones(original);
            let image = self.factory.query_first(original, &Selector::tag("img"));
            if let Some(image) = image {
                self.factory
                    .remove_class(image, &self.config.stop_image_class);
            }

            let mut current = original;
            for (index, source) in sources.iter().enumerate() {
                let figure = match index {
                    0 => original,
                    _ => match existing.get(index - 1) {
                        Some(clone) => *clone,
                        None => self.clone_image(current, name),
                    },
                };
                show_image(&mut self.factory, figure, source);
                current = figure;
            }

            for stale in existing.iter().skip(sources.len() - 1) {
                self.factory.remove(*stale);
            }
            debug!(field = name, images = sources.len(), "image values bound");
        }
    }

    /// Deep clone of `current`, inserted right after it.
    fn clone_image(&mut self, current: NodeId, name: &str) -> NodeId {
        let clone = self.factory.clone_node(current, true);
        self.factory.set_attribute(clone, IMAGE_CLONE_ATTRIBUTE, name);
        if let Some(image) = self.factory.query_first(clone, &Selector::tag("img")) {
            self.factory.remove_attribute(image, "id");
        }
        self.factory.insert_after(current, clone);
        clone
    }

    /// Clones left behind by an earlier binding, directly after `original`.
    fn following_clones(&self, original: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.factory.parent(original) else {
            return Vec::new();
        };
        self.factory
            .children(parent)
            .into_iter()
            .skip_while(|sibling| *sibling != original)
            .skip(1)
            .take_while(|sibling| {
                self.factory
                    .attribute(*sibling, IMAGE_CLONE_ATTRIBUTE)
                    .is_some()
            })
            .collect()
    }
}

fn show_image<F: NodeFactory>(factory: &mut F, figure: NodeId, source: &Value) {
    if let Some(image) = factory.query_first(figure, &Selector::tag("img")) {
        factory.set_attribute(image, "src", &value_to_display(source));
    }
    if let Some(hidden) = factory.query_first(figure, &Selector::has_attr(IMAGE_SOURCE_ATTRIBUTE)) {
        factory.set_value(hidden, source.clone());
    }
}

/// Swaps the select's options for `options`, optionally led by an empty
/// option shaped like the first one.
pub(crate) fn populate_select<F: NodeFactory>(
    factory: &mut F,
    select: NodeId,
    options: &[OptionConfig],
    include_empty: bool,
) -> usize {
    let Some(first) = options.first() else {
        debug!(select = %select, "no options to populate");
        return 0;
    };

    factory.clear_children(select);
    let mut count = 0;
    if include_empty {
        let empty = OptionConfig {
            value: Value::Null,
            text: Some(String::new()),
            html: None,
            attributes: first.attributes.clone(),
        };
        let node = option_node(factory, &empty);
        factory.append(select, node);
        count += 1;
    }
    for option in options {
        let node = option_node(factory, option);
        factory.append(select, node);
        count += 1;
    }
    count
}
