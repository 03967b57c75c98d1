//! Internal form to element tree

use super::base::{ConverterConfig, Node, TaggedNode, ATTR_PREFIX, TAIL_KEY, TEXT_KEY};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::namespaces::Canonicalizer;

/// Build an element subtree from its internal form.
///
/// Fields are applied in their stored order: `@name` fields become
/// attributes, `#text` and `#tail` set the text slots, a list field expands
/// into one child per item and any other field becomes a single child.
pub fn internal_to_elem(
    tagged: &TaggedNode,
    canonicalizer: &mut dyn Canonicalizer,
    config: &ConverterConfig,
) -> Result<Element> {
    encode_element(&tagged.tag, &tagged.node, canonicalizer, config, 0)
}

fn encode_element(
    tag: &str,
    node: &Node,
    canonicalizer: &mut dyn Canonicalizer,
    config: &ConverterConfig,
    level: usize,
) -> Result<Element> {
    config.limits().check_xml_depth(level)?;
    let mut elem = Element::new(canonicalizer.decode(tag)?);

    match node {
        Node::Null => {}
        Node::Scalar(text) => elem.text = Some(text.clone()),
        Node::List(_) => {
            return Err(Error::structure(format!(
                "a list cannot be the value of element '{}'",
                tag
            )))
        }
        Node::Complex(fields) => {
            for (key, value) in fields {
                if let Some(name) = key.strip_prefix(ATTR_PREFIX) {
                    let value = scalar_field(tag, key, value)?.unwrap_or_default();
                    elem.attributes.insert(name.to_string(), value);
                } else if key == TEXT_KEY {
                    elem.text = scalar_field(tag, key, value)?;
                } else if key == TAIL_KEY {
                    elem.tail = scalar_field(tag, key, value)?;
                } else if let Node::List(items) = value {
                    for item in items {
                        if matches!(item, Node::List(_)) {
                            return Err(Error::structure(format!(
                                "nested list under '{}' in element '{}'",
                                key, tag
                            )));
                        }
                        elem.add_child(encode_element(key, item, canonicalizer, config, level + 1)?);
                    }
                } else {
                    elem.add_child(encode_element(key, value, canonicalizer, config, level + 1)?);
                }
            }
        }
    }

    Ok(elem)
}

/// Attribute, text and tail fields hold text or null
fn scalar_field(tag: &str, key: &str, value: &Node) -> Result<Option<String>> {
    match value {
        Node::Null => Ok(None),
        Node::Scalar(text) => Ok(Some(text.clone())),
        _ => Err(Error::structure(format!(
            "field '{}' of element '{}' must be text or null",
            key, tag
        ))),
    }
}
