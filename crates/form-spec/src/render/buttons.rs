use crate::node::{NodeFactory, NodeId};
use crate::render::{apply_attributes, set_content};
use crate::spec::button::ButtonConfig;

/// Appends one `button` per descriptor. Buttons are never skipped, even
/// without a label.
pub fn attach_buttons<F: NodeFactory>(
    factory: &mut F,
    container: NodeId,
    buttons: &[ButtonConfig],
) -> Vec<NodeId> {
    buttons
        .iter()
        .map(|button| {
            let node = factory.create_element("button");
            factory.set_attribute(node, "type", button.kind_or_default());
            apply_attributes(factory, node, &button.attributes, &["type"]);
            if let Some(content) = button.content() {
                set_content(factory, node, &content);
            }
            factory.append(container, node);
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;

    #[test]
    fn missing_type_defaults_to_button_role() {
        let mut doc = Document::new();
        let form = doc.create_element("form");
        let buttons: Vec<ButtonConfig> = serde_json::from_value(json!([
            { "text": "Save", "type": "submit", "class": "primary" },
            { "class": "ghost" }
        ]))
        .expect("buttons");

        let nodes = attach_buttons(&mut doc, form, &buttons);
        assert_eq!(nodes.len(), 2);
        assert_eq!(doc.attribute(nodes[0], "type").as_deref(), Some("submit"));
        assert_eq!(doc.text(nodes[0]), Some("Save"));
        assert_eq!(doc.attribute(nodes[1], "type").as_deref(), Some("button"));
        assert!(doc.has_class(nodes[1], "ghost"));
    }
}
