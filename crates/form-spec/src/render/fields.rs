use serde_json::{Map, Value};
use tracing::debug;

use crate::node::{NodeFactory, NodeId};
use crate::plan::{FieldPlan, FieldStrategy};
use crate::render::{apply_attributes, set_content};
use crate::spec::field::{OptionConfig, value_to_display};
use crate::template::{PENDING_ATTRIBUTE, TemplateFetcher, TemplateRequest, TemplateTask};

/// Marks the figure that displays images for a field name.
pub const IMAGE_FOR_ATTRIBUTE: &str = "data-image-for";
/// Marks the hidden input carrying an image source.
pub const IMAGE_SOURCE_ATTRIBUTE: &str = "data-image-source";
/// Marks the slot that receives a field's template markup.
pub const TEMPLATE_FOR_ATTRIBUTE: &str = "data-template-for";

/// Shared state threaded through field rendering.
pub(crate) struct FieldContext<'a> {
    pub stop_image_class: &'a str,
    pub fetcher: Option<&'a dyn TemplateFetcher>,
    pub tasks: Vec<TemplateTask>,
    /// Templated fields that could not be fetched for lack of a fetcher.
    pub unavailable: Vec<TemplateRequest>,
}

/// Renders every planned field into `container`, in order.
pub(crate) fn render_fields<F: NodeFactory>(
    factory: &mut F,
    container: NodeId,
    fields: &[FieldPlan<'_>],
    ctx: &mut FieldContext<'_>,
) {
    for field in fields {
        render_field(factory, container, field, ctx);
    }
}

fn render_field<F: NodeFactory>(
    factory: &mut F,
    container: NodeId,
    field: &FieldPlan<'_>,
    ctx: &mut FieldContext<'_>,
) {
    let wrapper = field.config.field_wrapper.as_ref().map(|attributes| {
        let wrapper = factory.create_element("div");
        apply_attributes(factory, wrapper, attributes, &[]);
        wrapper
    });

    if let FieldStrategy::Template { path } = &field.strategy {
        let slot = wrapper.unwrap_or_else(|| factory.create_element("div"));
        factory.set_attribute(slot, TEMPLATE_FOR_ATTRIBUTE, field.name);
        factory.set_attribute(slot, PENDING_ATTRIBUTE, path);
        factory.append(container, slot);

        let request = TemplateRequest {
            field: field.name.to_string(),
            path: path.clone(),
            slot,
            context: template_context(field),
        };
        match ctx.fetcher {
            Some(fetcher) => ctx.tasks.push(TemplateTask::issue(request, fetcher)),
            None => ctx.unavailable.push(request),
        }
        return;
    }

    let target = wrapper.unwrap_or(container);
    let control = render_control(factory, field, ctx.stop_image_class);
    let label = factory.create_element("label");
    factory.set_attribute(label, "for", field.control_id());
    set_content(factory, label, &field.label);

    if field.label_after {
        factory.append(target, control);
        factory.append(target, label);
    } else {
        factory.append(target, label);
        factory.append(target, control);
    }

    if let Some(wrapper) = wrapper {
        factory.append(container, wrapper);
    }
    debug!(field = field.name, "field rendered");
}

fn render_control<F: NodeFactory>(
    factory: &mut F,
    field: &FieldPlan<'_>,
    stop_image_class: &str,
) -> NodeId {
    match &field.strategy {
        FieldStrategy::Select { options } => {
            let select = named_control(factory, "select", field);
            for option in options {
                let node = option_node(factory, option);
                factory.append(select, node);
            }
            select
        }
        FieldStrategy::Textarea => named_control(factory, "textarea", field),
        FieldStrategy::Input { input_type } => {
            let input = named_control(factory, "input", field);
            factory.set_attribute(input, "type", input_type);
            input
        }
        FieldStrategy::Image => image_display(factory, field, stop_image_class),
        // Template fields never reach control rendering.
        FieldStrategy::Template { .. } => factory.create_element("div"),
    }
}

fn named_control<F: NodeFactory>(factory: &mut F, tag: &str, field: &FieldPlan<'_>) -> NodeId {
    let node = factory.create_element(tag);
    apply_attributes(factory, node, &field.config.attributes, &[]);
    factory.set_attribute(node, "name", field.name);
    factory.set_attribute(node, "id", field.control_id());
    node
}

/// `figure` holding the image and the hidden input that carries its source.
fn image_display<F: NodeFactory>(
    factory: &mut F,
    field: &FieldPlan<'_>,
    stop_image_class: &str,
) -> NodeId {
    let figure = factory.create_element("figure");
    factory.set_attribute(figure, IMAGE_FOR_ATTRIBUTE, field.name);

    let image = factory.create_element("img");
    apply_attributes(factory, image, &field.config.attributes, &[]);
    factory.set_attribute(image, "id", field.control_id());
    if !stop_image_class.is_empty() {
        factory.add_class(image, stop_image_class);
    }

    let source = factory.create_element("input");
    factory.set_attribute(source, "type", "hidden");
    factory.set_attribute(source, "name", field.name);
    factory.set_attribute(source, IMAGE_SOURCE_ATTRIBUTE, field.name);

    factory.append(figure, image);
    factory.append(figure, source);
    figure
}

/// Builds one `option` node; the label falls back to the option value.
pub(crate) fn option_node<F: NodeFactory>(factory: &mut F, option: &OptionConfig) -> NodeId {
    let node = factory.create_element("option");
    apply_attributes(factory, node, &option.attributes, &[]);
    factory.set_attribute(node, "value", &value_to_display(&option.value));
    factory.set_value(node, option.value.clone());
    set_content(factory, node, &option.label());
    node
}

fn template_context(field: &FieldPlan<'_>) -> Value {
    let mut context: Map<String, Value> = field.config.attributes.clone();
    let class = context
        .get("class")
        .map(value_to_display)
        .unwrap_or_default();
    context.insert("label".into(), Value::String(field.label.as_str().to_string()));
    context.insert("name".into(), Value::String(field.name.to_string()));
    context.insert("id".into(), Value::String(field.control_id().to_string()));
    context.insert("class".into(), Value::String(class));
    Value::Object(context)
}
