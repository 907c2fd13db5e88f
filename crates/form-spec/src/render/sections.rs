use tracing::{debug, warn};

use crate::node::{NodeFactory, NodeId};
use crate::plan::SectionPlan;
use crate::render::{
    apply_attributes,
    buttons::attach_buttons,
    fields::{FieldContext, render_fields},
};

/// Navigation entry attribute pointing at its section's anchor.
pub const TARGET_ATTRIBUTE: &str = "data-target";

/// Handles of the rendered sections and their navigation entries, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposedSections {
    pub sections: Vec<NodeId>,
    pub nav_entries: Vec<NodeId>,
}

/// Which section starts visible, and the classes marking the others.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InitialVisibility<'a> {
    pub invisible_class: &'a str,
    pub current_class: &'a str,
    pub current: usize,
}

pub(crate) fn compose_sections<F: NodeFactory>(
    factory: &mut F,
    form: NodeId,
    nav: NodeId,
    sections: &[SectionPlan<'_>],
    visibility: Option<InitialVisibility<'_>>,
    ctx: &mut FieldContext<'_>,
) -> ComposedSections {
    let mut composed = ComposedSections::default();

    for section in sections {
        let block = factory.create_element("section");
        factory.set_attribute(block, "id", section.id);
        render_fields(factory, block, &section.fields, ctx);
        if !section.buttons.is_empty() {
            attach_buttons(factory, block, section.buttons);
        }
        factory.append(form, block);

        let entry = factory.create_element("li");
        apply_attributes(factory, entry, section.nav_attributes, &["fields", "buttons", "id"]);
        factory.set_attribute(entry, TARGET_ATTRIBUTE, &format!("#{}", section.id));
        factory.append(nav, entry);

        debug!(section = section.id, fields = section.fields.len(), "section composed");
        composed.sections.push(block);
        composed.nav_entries.push(entry);
    }

    if let Some(visibility) = visibility {
        mark_initial_visibility(factory, &composed, visibility);
    }
    composed
}

fn mark_initial_visibility<F: NodeFactory>(
    factory: &mut F,
    composed: &ComposedSections,
    visibility: InitialVisibility<'_>,
) {
    if visibility.current >= composed.sections.len() {
        warn!(
            current = visibility.current,
            sections = composed.sections.len(),
            "current section index out of range; every section starts hidden"
        );
    }
    for (index, block) in composed.sections.iter().enumerate() {
        if index != visibility.current {
            factory.add_class(*block, visibility.invisible_class);
        }
    }
    if let Some(entry) = composed.nav_entries.get(visibility.current) {
        factory.add_class(*entry, visibility.current_class);
    }
}
