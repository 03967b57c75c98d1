//! Base converter types
//!
//! This module provides the internal form shared by both conversion
//! directions, and the converter configuration.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::limits::Limits;

/// Prefix marking attribute fields
pub const ATTR_PREFIX: char = '@';

/// Field holding an element's own text
pub const TEXT_KEY: &str = "#text";

/// Field holding the text that follows an element's end tag
pub const TAIL_KEY: &str = "#tail";

/// Configuration for converters
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Whether to trim leading and trailing whitespace from text and tails
    strip: bool,
    /// Nesting limits
    limits: Limits,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            strip: true,
            limits: Limits::default(),
        }
    }
}

impl ConverterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that keeps whitespace exactly
    pub fn raw() -> Self {
        Self::default().with_strip(false)
    }

    /// Check if whitespace is trimmed
    pub fn strip(&self) -> bool {
        self.strip
    }

    /// Get the limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Set whitespace trimming
    pub fn with_strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    /// Set limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Apply the whitespace mode; empty text counts as absent
    pub(crate) fn clean<'a>(&self, text: Option<&'a str>) -> Option<&'a str> {
        let text = text?;
        let text = if self.strip { text.trim() } else { text };
        (!text.is_empty()).then_some(text)
    }
}

/// Value of one element in the internal form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Node {
    /// No attributes, no children, no text
    #[default]
    Null,
    /// Text only
    Scalar(String),
    /// Values of same-named siblings, in document order
    List(Vec<Node>),
    /// Attributes (`@name`), `#text`, `#tail` and child fields
    Complex(IndexMap<String, Node>),
}

impl Node {
    /// Create a scalar node
    pub fn scalar(text: impl Into<String>) -> Self {
        Self::Scalar(text.into())
    }

    /// Check for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get a field of a complex node
    pub fn field(&self, key: &str) -> Option<&Node> {
        match self {
            Self::Complex(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Get an attribute of a complex node
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self.field(&format!("{}{}", ATTR_PREFIX, name)) {
            Some(Self::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Get the element text: the scalar itself, or the `#text` field
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Scalar(text) => Some(text),
            Self::Complex(fields) => match fields.get(TEXT_KEY) {
                Some(Self::Scalar(text)) => Some(text),
                _ => None,
            },
            _ => None,
        }
    }

    /// View a field value as a sequence: a list as-is, anything else as one item
    pub fn as_list(&self) -> &[Node] {
        match self {
            Self::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Scalar(text) => JsonValue::String(text.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Node::to_json).collect()),
            Self::Complex(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Convert from a JSON value.
    ///
    /// Numbers and booleans become scalars holding their JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::String(text) => Self::Scalar(text.clone()),
            JsonValue::Bool(b) => Self::Scalar(b.to_string()),
            JsonValue::Number(n) => Self::Scalar(n.to_string()),
            JsonValue::Array(items) => Self::List(items.iter().map(Node::from_json).collect()),
            JsonValue::Object(fields) => Self::Complex(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), Node::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Self::Scalar(text.to_string())
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(text) => serializer.serialize_str(text),
            Self::List(items) => serializer.collect_seq(items),
            Self::Complex(fields) => serializer.collect_map(fields),
        }
    }
}

/// One element in the internal form: its display tag and its value
///
/// Serializes as the single-entry object `{tag: node}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedNode {
    /// Canonicalized tag
    pub tag: String,
    /// Element value
    pub node: Node,
}

impl TaggedNode {
    /// Create a new tagged node
    pub fn new(tag: impl Into<String>, node: Node) -> Self {
        Self {
            tag: tag.into(),
            node,
        }
    }

    /// Convert to the JSON object `{tag: node}`
    pub fn to_json(&self) -> JsonValue {
        let mut wrapper = Map::new();
        wrapper.insert(self.tag.clone(), self.node.to_json());
        JsonValue::Object(wrapper)
    }

    /// Convert from a JSON object with exactly one key
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let JsonValue::Object(fields) = value else {
            return Err(Error::structure(format!(
                "expected an object with a single tag, found {}",
                json_kind(value)
            )));
        };
        let mut entries = fields.iter();
        match (entries.next(), entries.next()) {
            (Some((tag, node)), None) => Ok(Self::new(tag.clone(), Node::from_json(node))),
            _ => Err(Error::structure(format!(
                "Illegal structure with {} top-level tags: {:?}",
                fields.len(),
                fields.keys().collect::<Vec<_>>()
            ))),
        }
    }
}

impl Serialize for TaggedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.tag, &self.node)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for TaggedNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json(&value).map_err(D::Error::custom)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
