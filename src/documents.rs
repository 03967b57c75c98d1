//! XML element trees
//!
//! This module provides the in-memory element tree the converters work on,
//! a namespace-resolving parser and a serializer, both built on quick-xml.
//!
//! Element and attribute names are stored in Clark notation
//! (`{namespaceURI}localName`). Text is kept the way it appears in the
//! source: `text` is the content before the first child and `tail` is the
//! content after the element's end tag, up to the next sibling.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{Canonicalizer, QName, UsingPrefix};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use std::io::Write;
use tracing::debug;

/// XML Element in the document tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element name in Clark notation
    pub tag: String,
    /// Attributes, names in Clark notation
    pub attributes: IndexMap<String, String>,
    /// Text before the first child (if any)
    pub text: Option<String>,
    /// Text after the end tag (if any)
    pub tail: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set tail text
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        match self.tag.strip_prefix('{').and_then(|rest| rest.rsplit_once('}')) {
            Some((_, local)) => local,
            None => &self.tag,
        }
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.tag
            .strip_prefix('{')
            .and_then(|rest| rest.rsplit_once('}'))
            .map(|(uri, _)| uri)
    }

    /// Get an attribute value by its Clark-notation name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Find child elements by Clark-notation tag
    pub fn find_children(&self, tag: &str) -> Vec<&Element> {
        self.children.iter().filter(|e| e.tag == tag).collect()
    }

    /// Find the first child with the given tag
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.tag == tag)
    }

    /// Check whether this element and all its descendants carry a namespace
    fn all_qualified(&self) -> bool {
        self.namespace().is_some() && self.children.iter().all(Element::all_qualified)
    }

    /// Serialize the element as a standalone XML document
    pub fn to_xml(&self, config: &WriterConfig) -> Result<Vec<u8>> {
        let mut names = NameTable::for_tree(self, config.root_default_namespace);
        let declarations = std::mem::take(&mut names.declarations);

        let mut writer = Writer::new(Vec::new());
        if config.xml_declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(Error::xml)?;
        }
        self.write_element(&mut writer, &mut names, &declarations)?;
        Ok(writer.into_inner())
    }

    /// Serialize the element as a standalone XML document string
    pub fn to_xml_string(&self, config: &WriterConfig) -> Result<String> {
        String::from_utf8(self.to_xml(config)?).map_err(Error::xml)
    }

    fn write_element<W: Write>(
        &self,
        writer: &mut Writer<W>,
        names: &mut NameTable,
        declarations: &[(String, String)],
    ) -> Result<()> {
        let name = names.element_name(&self.tag);
        let mut start = BytesStart::new(name.clone());
        for (attr, uri) in declarations {
            start.push_attribute((attr.as_str(), uri.as_str()));
        }
        for (key, value) in &self.attributes {
            let attr = names.attribute_name(key);
            start.push_attribute((attr.as_str(), value.as_str()));
        }

        let text = self.text.as_deref().filter(|t| !t.is_empty());
        if text.is_none() && self.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(Error::xml);
        }

        writer.write_event(Event::Start(start)).map_err(Error::xml)?;
        if let Some(text) = text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(Error::xml)?;
        }
        for child in &self.children {
            child.write_element(writer, names, &[])?;
            if let Some(tail) = child.tail.as_deref().filter(|t| !t.is_empty()) {
                writer
                    .write_event(Event::Text(BytesText::new(tail)))
                    .map_err(Error::xml)?;
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(Error::xml)
    }
}

/// Configuration for XML output
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Whether to emit an `<?xml ...?>` declaration
    pub xml_declaration: bool,
    /// Whether to declare the root's namespace as the default namespace
    pub root_default_namespace: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            xml_declaration: false,
            root_default_namespace: true,
        }
    }
}

impl WriterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to emit an XML declaration
    pub fn with_xml_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = declaration;
        self
    }

    /// Set whether the root namespace becomes the default namespace
    pub fn with_root_default_namespace(mut self, enabled: bool) -> Self {
        self.root_default_namespace = enabled;
        self
    }
}

/// Prefix assignment for one serialization
///
/// All namespace declarations are collected up front and emitted on the
/// root element.
struct NameTable {
    prefixes: UsingPrefix,
    default_namespace: Option<String>,
    declarations: Vec<(String, String)>,
}

impl NameTable {
    fn for_tree(root: &Element, use_default: bool) -> Self {
        let default_namespace = if use_default && root.all_qualified() {
            root.namespace().map(str::to_string)
        } else {
            if use_default && root.namespace().is_some() {
                debug!(root = %root.tag, "unqualified descendants, writing root namespace with a prefix");
            }
            None
        };
        let prefixes = match &default_namespace {
            Some(ns) => UsingPrefix::new().with_default_namespace(ns),
            None => UsingPrefix::new(),
        };
        let mut table = Self {
            prefixes,
            default_namespace,
            declarations: Vec::new(),
        };
        table.collect(root);
        table
    }

    fn collect(&mut self, elem: &Element) {
        if let Some(uri) = elem.namespace() {
            if self.default_namespace.as_deref() == Some(uri) {
                self.declare("xmlns".to_string(), uri);
            } else {
                self.declare_prefixed(uri);
            }
        }
        for name in elem.attributes.keys() {
            if let Some(uri) = QName::from_clark(name).namespace {
                self.declare_prefixed(&uri);
            }
        }
        for child in &elem.children {
            self.collect(child);
        }
    }

    fn declare_prefixed(&mut self, uri: &str) {
        let prefix = self.prefixes.prefix_for(uri);
        if uri != crate::XML_NAMESPACE {
            self.declare(format!("xmlns:{}", prefix), uri);
        }
    }

    fn declare(&mut self, attr: String, uri: &str) {
        if !self.declarations.iter().any(|(known, _)| *known == attr) {
            self.declarations.push((attr, uri.to_string()));
        }
    }

    fn element_name(&mut self, tag: &str) -> String {
        self.prefixes.encode(tag)
    }

    fn attribute_name(&mut self, name: &str) -> String {
        let qname = QName::from_clark(name);
        match qname.namespace {
            Some(uri) => format!("{}:{}", self.prefixes.prefix_for(&uri), qname.local_name),
            None => qname.local_name,
        }
    }
}

/// Parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Root element of the document
    pub root: Element,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes(), &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = NsReader::from_reader(xml);
        let mut root: Option<Element> = None;
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if root.is_some() {
                        return Err(Error::Xml("multiple root elements".to_string()));
                    }
                    limits.check_xml_depth(element_stack.len())?;
                    let element = Self::parse_element(&e, &reader, limits)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        Self::attach(&mut element_stack, &mut root, current);
                    }
                }
                Ok(Event::Empty(e)) => {
                    if root.is_some() {
                        return Err(Error::Xml("multiple root elements".to_string()));
                    }
                    limits.check_xml_depth(element_stack.len())?;
                    let element = Self::parse_element(&e, &reader, limits)?;
                    Self::attach(&mut element_stack, &mut root, element);
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    Self::append_text(&mut element_stack, &text);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    Self::append_text(&mut element_stack, &text);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| Error::Xml("XML document has no root element".to_string()))?;
        debug!(root = %root.tag, "parsed XML document");
        Ok(Self { root })
    }

    /// Put a finished element under its parent, or make it the root
    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
        match stack.last_mut() {
            Some(parent) => parent.add_child(element),
            None => *root = Some(element),
        }
    }

    /// Text goes to the open element, or to the tail of its last child.
    /// Text outside the root element is dropped.
    fn append_text(stack: &mut [Element], text: &str) {
        let Some(current) = stack.last_mut() else {
            return;
        };
        let slot = match current.children.last_mut() {
            Some(last) => &mut last.tail,
            None => &mut current.text,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart, reader: &NsReader<&[u8]>, limits: &Limits) -> Result<Element> {
        let (ns, local) = reader.resolve_element(start.name());
        let mut element = Element::new(Self::clark_name(ns, local.as_ref())?);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            // Namespace declarations are resolved by the reader
            let raw = attr.key.as_ref();
            if raw == b"xmlns" || raw.starts_with(b"xmlns:") {
                continue;
            }

            let (ns, local) = reader.resolve_attribute(attr.key);
            let name = Self::clark_name(ns, local.as_ref())?;
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .into_owned();
            element.attributes.insert(name, value);
        }
        limits.check_attributes(element.attributes.len())?;

        Ok(element)
    }

    fn clark_name(ns: ResolveResult<'_>, local: &[u8]) -> Result<String> {
        let local = std::str::from_utf8(local)
            .map_err(|e| Error::Xml(format!("Invalid name: {}", e)))?;
        match ns {
            ResolveResult::Bound(ns) if !ns.as_ref().is_empty() => {
                let uri = std::str::from_utf8(ns.as_ref())
                    .map_err(|e| Error::Xml(format!("Invalid namespace URI: {}", e)))?;
                Ok(QName::namespaced(uri, local).to_string())
            }
            ResolveResult::Unknown(prefix) => Err(Error::Namespace(format!(
                "Unbound prefix '{}' on '{}'",
                String::from_utf8_lossy(&prefix),
                local
            ))),
            _ => Ok(local.to_string()),
        }
    }

    /// Get the root element
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Take the root element
    pub fn into_root(self) -> Element {
        self.root
    }
}
