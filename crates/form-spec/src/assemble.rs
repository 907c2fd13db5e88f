use std::sync::Arc;

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::ConfigError;
use crate::node::NodeFactory;
use crate::plan::{Layout, RenderPlan};
use crate::render::{
    apply_attributes,
    buttons::attach_buttons,
    fields::{FieldContext, render_fields},
    sections::{ComposedSections, InitialVisibility, compose_sections},
    set_content,
};
use crate::rendered::RenderedForm;
use crate::spec::form::FormConfig;
use crate::template::TemplateFetcher;
use crate::validate::validate;

/// Id given to the parent node wrapping title, menu and form.
pub const ROOT_ID: &str = "formParent";

/// Routing hints in `form` that never become DOM attributes.
const FORM_RESERVED: [&str; 3] = ["fields", "labelAfter", "method"];

/// Compiles a [`FormConfig`] into a [`RenderedForm`].
pub struct FormAssembler<F: NodeFactory = Document> {
    factory: F,
    fetcher: Option<Arc<dyn TemplateFetcher>>,
}

impl FormAssembler<Document> {
    pub fn new() -> Self {
        Self::with_factory(Document::new())
    }
}

impl Default for FormAssembler<Document> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: NodeFactory> FormAssembler<F> {
    pub fn with_factory(factory: F) -> Self {
        Self {
            factory,
            fetcher: None,
        }
    }

    /// Fetcher used for templated fields; without one they stay pending.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn TemplateFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Validates the configuration, then builds the whole tree.
    ///
    /// The configuration is never modified; the returned form keeps its own
    /// snapshot.
    pub fn build(self, config: &FormConfig) -> Result<RenderedForm<F>, ConfigError> {
        validate(config)?;
        let plan = RenderPlan::from_config(config);
        let mut factory = self.factory;

        let root = factory.create_element("div");
        factory.set_attribute(root, "id", ROOT_ID);

        let title = factory.create_element("div");
        if let Some(title_config) = &config.title {
            if let Some(attributes) = title_config.attributes() {
                apply_attributes(&mut factory, title, attributes, &[]);
            }
            if let Some(content) = title_config.content() {
                set_content(&mut factory, title, &content);
            }
        }
        factory.append(root, title);

        let navigation = match plan.layout {
            Layout::Sections(_) => {
                let menu = factory.create_element("menu");
                factory.append(root, menu);
                Some(menu)
            }
            _ => None,
        };

        let form = factory.create_element("form");
        if let Some(attributes) = config.form_attributes() {
            apply_attributes(&mut factory, form, attributes, &FORM_RESERVED);
        }
        factory.set_attribute(form, "method", "POST");
        factory.append(root, form);

        let mut ctx = FieldContext {
            stop_image_class: &config.stop_image_class,
            fetcher: self.fetcher.as_deref(),
            tasks: Vec::new(),
            unavailable: Vec::new(),
        };

        let sections = match (&plan.layout, navigation) {
            (Layout::Sections(planned), Some(nav)) => {
                debug!(sections = planned.len(), "composing sectioned form");
                let visibility =
                    config
                        .visibility_classes()
                        .map(|(invisible_class, current_class)| InitialVisibility {
                            invisible_class,
                            current_class,
                            current: config.current_number,
                        });
                compose_sections(&mut factory, form, nav, planned, visibility, &mut ctx)
            }
            (Layout::Fields(planned), _) => {
                debug!(fields = planned.len(), "rendering flat field list");
                render_fields(&mut factory, form, planned, &mut ctx);
                ComposedSections::default()
            }
            _ => ComposedSections::default(),
        };

        attach_buttons(&mut factory, form, plan.buttons);

        let FieldContext {
            tasks, unavailable, ..
        } = ctx;
        if !unavailable.is_empty() {
            warn!(
                fields = unavailable.len(),
                "templated fields present but no template fetcher configured"
            );
        }

        Ok(RenderedForm {
            factory,
            config: config.clone(),
            root,
            title,
            navigation,
            form,
            sections,
            diagnostics: plan.diagnostics,
            templates: tasks,
            unavailable,
        })
    }
}

/// Builds a form into a fresh in-memory [`Document`].
pub fn build(config: &FormConfig) -> Result<RenderedForm<Document>, ConfigError> {
    FormAssembler::new().build(config)
}
