//! Element tree to internal form
//!
//! Mapping, with whitespace trimming on:
//!
//! ```text
//! XML                              internal form
//! <e/>                             {"e": null}
//! <e>text</e>                      {"e": "text"}
//! <e name="value" />               {"e": {"@name": "value"}}
//! <e name="value">text</e>         {"e": {"@name": "value", "#text": "text"}}
//! <e> <a>text</a ><b>text</b> </e> {"e": {"a": "text", "b": "text"}}
//! <e> <a>text</a> <a>text</a> </e> {"e": {"a": ["text", "text"]}}
//! <e> text <a>text</a> </e>        {"e": {"a": "text", "#text": "text"}}
//! ```

use indexmap::map::Entry;
use indexmap::IndexMap;

use super::base::{ConverterConfig, Node, TaggedNode, ATTR_PREFIX, TAIL_KEY, TEXT_KEY};
use crate::documents::Element;
use crate::error::Result;
use crate::namespaces::Canonicalizer;

/// Convert an element subtree into its internal form.
///
/// The same canonicalizer is used for the whole subtree, so a namespace gets
/// one prefix everywhere it appears.
pub fn elem_to_internal(
    elem: &Element,
    canonicalizer: &mut dyn Canonicalizer,
    config: &ConverterConfig,
) -> Result<TaggedNode> {
    decode_element(elem, canonicalizer, config, 0)
}

fn decode_element(
    elem: &Element,
    canonicalizer: &mut dyn Canonicalizer,
    config: &ConverterConfig,
    level: usize,
) -> Result<TaggedNode> {
    config.limits().check_xml_depth(level)?;

    let mut fields: IndexMap<String, Node> = elem
        .attributes
        .iter()
        .map(|(name, value)| (format!("{}{}", ATTR_PREFIX, name), Node::Scalar(value.clone())))
        .collect();

    for child in &elem.children {
        let TaggedNode { tag, node } = decode_element(child, canonicalizer, config, level + 1)?;
        merge_child(&mut fields, tag, node);
    }

    if let Some(tail) = config.clean(elem.tail.as_deref()) {
        fields.insert(TAIL_KEY.to_string(), Node::scalar(tail));
    }

    let text = config.clean(elem.text.as_deref());
    let node = if fields.is_empty() {
        text.map_or(Node::Null, Node::scalar)
    } else {
        if let Some(text) = text {
            fields.insert(TEXT_KEY.to_string(), Node::scalar(text));
        }
        Node::Complex(fields)
    };

    // children first, so the innermost new namespace gets the lowest nsN
    let tag = canonicalizer.encode(&elem.tag);
    Ok(TaggedNode::new(tag, node))
}

/// A repeated tag turns the field into a list
fn merge_child(fields: &mut IndexMap<String, Node>, tag: String, value: Node) {
    match fields.entry(tag) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            Node::List(items) => items.push(value),
            existing => {
                let first = std::mem::take(existing);
                *existing = Node::List(vec![first, value]);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::namespaces::UsingPrefix;
    use serde_json::json;

    fn convert(xml: &str) -> serde_json::Value {
        let doc = Document::from_string(xml).unwrap();
        elem_to_internal(doc.root(), &mut UsingPrefix::new(), &ConverterConfig::default())
            .unwrap()
            .to_json()
    }

    fn convert_raw(xml: &str) -> serde_json::Value {
        let doc = Document::from_string(xml).unwrap();
        elem_to_internal(doc.root(), &mut UsingPrefix::new(), &ConverterConfig::raw())
            .unwrap()
            .to_json()
    }

    #[test]
    fn test_empty_element() {
        assert_eq!(convert("<e/>"), json!({"e": null}));
        assert_eq!(convert("<e>   </e>"), json!({"e": null}));
    }

    #[test]
    fn test_text_only() {
        assert_eq!(convert("<e> text </e>"), json!({"e": "text"}));
        assert_eq!(convert_raw("<e> text </e>"), json!({"e": " text "}));
    }

    #[test]
    fn test_raw_mode_keeps_whitespace_only_text() {
        assert_eq!(convert_raw("<e>  </e>"), json!({"e": "  "}));
    }

    #[test]
    fn test_attributes() {
        assert_eq!(convert(r#"<e name="v"/>"#), json!({"e": {"@name": "v"}}));
        assert_eq!(
            convert(r#"<e name="v">text</e>"#),
            json!({"e": {"@name": "v", "#text": "text"}})
        );
    }

    #[test]
    fn test_distinct_children() {
        assert_eq!(
            convert("<e> <a>1</a ><b>2</b> </e>"),
            json!({"e": {"a": "1", "b": "2"}})
        );
    }

    #[test]
    fn test_repeated_children_grouped() {
        assert_eq!(
            convert("<e><a>1</a><a>2</a></e>"),
            json!({"e": {"a": ["1", "2"]}})
        );
        assert_eq!(
            convert("<e><a>1</a><b/><a>2</a><a/></e>"),
            json!({"e": {"a": ["1", "2", null], "b": null}})
        );
    }

    #[test]
    fn test_mixed_text_and_children() {
        assert_eq!(
            convert("<e> text <a>x</a> </e>"),
            json!({"e": {"a": "x", "#text": "text"}})
        );
    }

    #[test]
    fn test_tail_recorded_on_child() {
        assert_eq!(
            convert("<e><a>x</a> after </e>"),
            json!({"e": {"a": {"#tail": "after", "#text": "x"}}})
        );
        assert_eq!(
            convert("<e><a/>after</e>"),
            json!({"e": {"a": {"#tail": "after"}}})
        );
    }

    #[test]
    fn test_field_order() {
        let value = convert(r#"<e id="1"><b/><a/>tail</e>"#);
        let keys: Vec<_> = value["e"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["@id", "b", "a"]);
    }

    #[test]
    fn test_namespaced_tags_get_prefixes_innermost_first() {
        let xml = r#"<r xmlns="urn:root" xmlns:b="urn:b" xmlns:c="urn:c"><b:x><c:y/></b:x></r>"#;
        assert_eq!(
            convert(xml),
            json!({"ns2:r": {"ns1:x": {"ns0:y": null}}})
        );
    }

    #[test]
    fn test_sibling_namespaces_numbered_in_order() {
        let xml = r#"<r xmlns:a="urn:a" xmlns:b="urn:b"><a:x/><b:y/><a:z/></r>"#;
        assert_eq!(
            convert(xml),
            json!({"r": {"ns0:x": null, "ns1:y": null, "ns0:z": null}})
        );
    }

    #[test]
    fn test_default_namespace_from_root() {
        let doc = Document::from_string(
            r#"<Report xmlns="urn:r" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><Name>n</Name><xsi:extra/></Report>"#,
        )
        .unwrap();
        let mut canon = UsingPrefix::for_root(doc.root());
        let tagged = elem_to_internal(doc.root(), &mut canon, &ConverterConfig::default()).unwrap();
        assert_eq!(
            tagged.to_json(),
            json!({"Report": {"Name": "n", "xsi:extra": null}})
        );
    }

    #[test]
    fn test_depth_limit() {
        let doc = Document::from_string("<a><b><c/></b></a>").unwrap();
        let config = ConverterConfig::new()
            .with_limits(crate::limits::Limits::new().with_max_xml_depth(1));
        assert!(matches!(
            elem_to_internal(doc.root(), &mut UsingPrefix::new(), &config),
            Err(crate::error::Error::LimitExceeded(_))
        ));
    }
}
