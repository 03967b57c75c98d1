//! Whole-document entry points
//!
//! These wrap parsing, conversion and serialization for callers that hold
//! complete XML or JSON buffers in memory.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::converters::{elem_to_internal, internal_to_elem, ConverterConfig, TaggedNode};
use crate::documents::{Document, WriterConfig};
use crate::error::Result;
use crate::limits::Limits;
use crate::namespaces::{Canonicalizer, UsingPrefix};

/// Nesting that fits comfortably on the caller's stack
const SHALLOW_JSON_DEPTH: usize = 128;
const STACK_BYTES_PER_LEVEL: usize = 8 * 1024;
const BASE_STACK_BYTES: usize = 1024 * 1024;

/// Configuration for document conversion
#[derive(Debug, Clone, Default)]
pub struct CodecConfig {
    /// Element conversion settings (whitespace mode, limits)
    pub converter: ConverterConfig,
    /// XML output settings
    pub writer: WriterConfig,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl CodecConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whitespace trimming
    pub fn with_strip(mut self, strip: bool) -> Self {
        self.converter = self.converter.with_strip(strip);
        self
    }

    /// Set the converter configuration
    pub fn with_converter(mut self, converter: ConverterConfig) -> Self {
        self.converter = converter;
        self
    }

    /// Set the writer configuration
    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    /// Set JSON pretty-printing
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Converts whole documents between XML, the internal form and JSON text
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Create a codec with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with configuration
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Parse an XML document into its internal form
    pub fn xml_to_internal(
        &self,
        xml: &[u8],
        canonicalizer: &mut dyn Canonicalizer,
    ) -> Result<TaggedNode> {
        let doc = Document::parse(xml, self.config.converter.limits())?;
        let tagged = elem_to_internal(doc.root(), canonicalizer, &self.config.converter)?;
        debug!(tag = %tagged.tag, strip = self.config.converter.strip(), "converted XML to internal form");
        Ok(tagged)
    }

    /// Render an internal form as an XML document
    pub fn internal_to_xml(
        &self,
        tagged: &TaggedNode,
        canonicalizer: &mut dyn Canonicalizer,
    ) -> Result<Vec<u8>> {
        let elem = internal_to_elem(tagged, canonicalizer, &self.config.converter)?;
        let xml = elem.to_xml(&self.config.writer)?;
        debug!(tag = %tagged.tag, bytes = xml.len(), "rendered internal form as XML");
        Ok(xml)
    }

    /// Convert an XML document to JSON text
    pub fn xml_to_json(&self, xml: &[u8], canonicalizer: &mut dyn Canonicalizer) -> Result<String> {
        let tagged = self.xml_to_internal(xml, canonicalizer)?;
        let text = if self.config.pretty {
            serde_json::to_string_pretty(&tagged)?
        } else {
            serde_json::to_string(&tagged)?
        };
        Ok(text)
    }

    /// Convert JSON text to an XML document.
    ///
    /// JSON nesting is bounded by the configured XML depth limit.
    pub fn json_to_xml(&self, json: &[u8], canonicalizer: &mut dyn Canonicalizer) -> Result<Vec<u8>> {
        let depth = check_json(json, self.config.converter.limits())?;
        with_stack_for(depth, || {
            let tagged = TaggedNode::from_json(&parse_json(json)?)?;
            self.internal_to_xml(&tagged, canonicalizer)
        })
    }
}

/// Parse JSON text, bounding its nesting by `limits` instead of serde_json's fixed cap
pub(crate) fn read_json(json: &[u8], limits: &Limits) -> Result<JsonValue> {
    let depth = check_json(json, limits)?;
    with_stack_for(depth, || parse_json(json))
}

/// Check size and nesting of JSON input, returning its depth
fn check_json(json: &[u8], limits: &Limits) -> Result<usize> {
    limits.check_xml_size(json.len())?;
    let depth = json_depth(json);
    limits.check_json_depth(depth)?;
    Ok(depth)
}

fn parse_json(json: &[u8]) -> Result<JsonValue> {
    let mut deserializer = serde_json::Deserializer::from_slice(json);
    deserializer.disable_recursion_limit();
    let value = JsonValue::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

/// Deepest `{`/`[` nesting in JSON text, ignoring brackets inside strings
fn json_depth(json: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for &byte in json {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

/// Run `f` on a stack sized for `depth` levels of recursion
fn with_stack_for<R>(depth: usize, f: impl FnOnce() -> R) -> R {
    if depth <= SHALLOW_JSON_DEPTH {
        f()
    } else {
        debug!(depth, "converting deeply nested JSON on a grown stack");
        stacker::grow(BASE_STACK_BYTES + depth * STACK_BYTES_PER_LEVEL, f)
    }
}

/// Parse an XML document into its internal form with a fresh canonicalizer
pub fn xml_to_internal(xml: &[u8], strip: bool) -> Result<TaggedNode> {
    Codec::with_config(CodecConfig::new().with_strip(strip))
        .xml_to_internal(xml, &mut UsingPrefix::new())
}

/// Render an internal form as XML with a fresh canonicalizer
pub fn internal_to_xml(tagged: &TaggedNode) -> Result<Vec<u8>> {
    Codec::new().internal_to_xml(tagged, &mut UsingPrefix::new())
}

/// Convert an XML document to JSON text with a fresh canonicalizer
pub fn xml_to_json(xml: &[u8], strip: bool) -> Result<String> {
    Codec::with_config(CodecConfig::new().with_strip(strip)).xml_to_json(xml, &mut UsingPrefix::new())
}

/// Convert JSON text to an XML document with a fresh canonicalizer
pub fn json_to_xml(json: &str) -> Result<Vec<u8>> {
    Codec::new().json_to_xml(json.as_bytes(), &mut UsingPrefix::new())
}
