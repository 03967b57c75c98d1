//! XML <-> internal form converters
//!
//! The internal form is a JSON-compatible tree. Each element becomes a
//! [`TaggedNode`]: its canonicalized tag plus a [`Node`] value that is
//! `Null`, a `Scalar` text, or a `Complex` field map. A field holds a `List`
//! when two or more siblings share a tag.
//!
//! Tags are mapped through a [`Canonicalizer`](crate::namespaces::Canonicalizer);
//! attribute names are kept as they appear on the element.

mod base;
mod decode;
mod encode;

pub use base::{ConverterConfig, Node, TaggedNode, ATTR_PREFIX, TAIL_KEY, TEXT_KEY};
pub use decode::elem_to_internal;
pub use encode::internal_to_elem;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{Document, Element};
    use crate::namespaces::UsingPrefix;
    use serde_json::json;

    #[test]
    fn test_converter_config_defaults() {
        let config = ConverterConfig::default();
        assert!(config.strip());
        assert!(!ConverterConfig::raw().strip());
    }

    #[test]
    fn test_clean_modes() {
        let strip = ConverterConfig::default();
        assert_eq!(strip.clean(Some("  a  ")), Some("a"));
        assert_eq!(strip.clean(Some("   ")), None);
        assert_eq!(strip.clean(None), None);

        let raw = ConverterConfig::raw();
        assert_eq!(raw.clean(Some("  a  ")), Some("  a  "));
        assert_eq!(raw.clean(Some("")), None);
    }

    #[test]
    fn test_node_accessors() {
        let tagged = TaggedNode::from_json(&json!({
            "Error": {"@code": "7", "Message": "bad token", "#text": "t", "Item": ["a", "b"]}
        }))
        .unwrap();
        let node = &tagged.node;

        assert_eq!(node.attribute("code"), Some("7"));
        assert_eq!(node.field("Message").and_then(Node::text), Some("bad token"));
        assert_eq!(node.text(), Some("t"));
        assert_eq!(node.field("Item").map(|n| n.as_list().len()), Some(2));
        assert_eq!(node.field("Message").map(|n| n.as_list().len()), Some(1));
        assert!(node.field("Missing").is_none());
        assert!(Node::Null.is_null());
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let tagged = TaggedNode::new(
            "e",
            Node::Complex(
                [
                    ("@id".to_string(), Node::from("1")),
                    ("a".to_string(), Node::List(vec![Node::from("x"), Node::Null])),
                ]
                .into_iter()
                .collect(),
            ),
        );
        let text = serde_json::to_string(&tagged).unwrap();
        assert_eq!(text, r#"{"e":{"@id":"1","a":["x",null]}}"#);
        assert_eq!(serde_json::to_value(&tagged).unwrap(), tagged.to_json());

        let back: TaggedNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back, tagged);
    }

    #[test]
    fn test_deserialize_rejects_multiple_tags() {
        let result: Result<TaggedNode, _> = serde_json::from_str(r#"{"a":1,"b":2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_raw_mode() {
        let xml = r#"<root xmlns:x="urn:x" id="r">
  lead <x:item a="1">one</x:item> mid
  <x:item>two</x:item>
  <other/> end
</root>"#;
        let root = Document::from_string(xml).unwrap().into_root();
        let config = ConverterConfig::raw();
        let mut canon = UsingPrefix::new();

        let tagged = elem_to_internal(&root, &mut canon, &config).unwrap();
        let rebuilt = internal_to_elem(&tagged, &mut canon, &config).unwrap();
        assert_eq!(rebuilt, root);
    }

    #[test]
    fn test_round_trip_element_with_tail() {
        let elem = Element::new("e")
            .with_child(Element::new("a").with_text("x").with_tail("t"))
            .with_child(Element::new("b"));
        let config = ConverterConfig::raw();
        let mut canon = UsingPrefix::new();

        let tagged = elem_to_internal(&elem, &mut canon, &config).unwrap();
        assert_eq!(
            tagged.to_json(),
            json!({"e": {"a": {"#tail": "t", "#text": "x"}, "b": null}})
        );
        assert_eq!(internal_to_elem(&tagged, &mut canon, &config).unwrap(), elem);
    }
}
