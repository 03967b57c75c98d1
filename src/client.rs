//! Request and response bodies for XML/JSON web APIs
//!
//! An API client hands raw response bodies and their content type to
//! [`parse_response`], and builds XML request bodies with
//! [`render_request`]. Transport and authentication stay with the caller.

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::codec::{read_json, CodecConfig};
use crate::converters::{elem_to_internal, internal_to_elem, TaggedNode};
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::namespaces::UsingPrefix;

/// Payload key carrying the endpoint namespace in a request
pub const XMLNS_KEY: &str = "_xmlns";

/// Content type of XML request bodies
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Body format announced by a content-type header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Any `...xml...` content type
    Xml,
    /// Any `...json...` content type
    Json,
}

impl ContentKind {
    /// Classify a content-type header value
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("xml") {
            Ok(Self::Xml)
        } else if lowered.contains("json") {
            Ok(Self::Json)
        } else {
            Err(Error::Api(format!("unknown content-type: {}", content_type)))
        }
    }
}

/// Parsed response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// XML body in internal form, tags relative to the root's namespace
    Xml(TaggedNode),
    /// JSON body as sent
    Json(JsonValue),
}

impl ResponseBody {
    /// Get the content kind of the body
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Xml(_) => ContentKind::Xml,
            Self::Json(_) => ContentKind::Json,
        }
    }
}

/// Parse a response body according to its content type.
///
/// XML bodies are converted with the root element's namespace as default
/// namespace, so the API's own elements appear without prefixes. A root
/// element named `error` (any case) is reported as [`Error::Api`] carrying
/// the text of its `Message` child.
pub fn parse_response(content_type: &str, body: &[u8], config: &CodecConfig) -> Result<ResponseBody> {
    match ContentKind::from_content_type(content_type)? {
        ContentKind::Xml => {
            let doc = Document::parse(body, config.converter.limits())?;
            let mut canonicalizer = UsingPrefix::for_root(doc.root());
            let tagged = elem_to_internal(doc.root(), &mut canonicalizer, &config.converter)?;
            if tagged.tag.eq_ignore_ascii_case("error") {
                let message = tagged
                    .node
                    .field("Message")
                    .and_then(|m| m.text())
                    .unwrap_or("no message");
                warn!(%message, "API returned an error document");
                return Err(Error::Api(message.to_string()));
            }
            debug!(root = %tagged.tag, "parsed XML response");
            Ok(ResponseBody::Xml(tagged))
        }
        ContentKind::Json => Ok(ResponseBody::Json(read_json(body, config.converter.limits())?)),
    }
}

/// Rendered request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    /// Value for the content-type header
    pub content_type: &'static str,
    /// Complete XML document
    pub body: Vec<u8>,
}

/// Render an XML request body from a payload object.
///
/// The payload holds the endpoint namespace under `_xmlns` and exactly one
/// other entry, the root element in internal form. Unprefixed tags are
/// placed in the endpoint namespace, which becomes the document's default
/// namespace.
pub fn render_request(payload: &JsonValue, config: &CodecConfig) -> Result<RequestBody> {
    let JsonValue::Object(fields) = payload else {
        return Err(Error::structure("request payload must be an object"));
    };
    let namespace = match fields.get(XMLNS_KEY) {
        Some(JsonValue::String(ns)) => ns.as_str(),
        Some(_) => return Err(Error::structure(format!("'{}' must be a string", XMLNS_KEY))),
        None => return Err(Error::structure(format!("request payload has no '{}'", XMLNS_KEY))),
    };

    let root: Map<String, JsonValue> = fields
        .iter()
        .filter(|(key, _)| key.as_str() != XMLNS_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let tagged = TaggedNode::from_json(&JsonValue::Object(root))?;
    render_request_node(namespace, &tagged, config)
}

/// Render an XML request body for an internal-form root in `namespace`
pub fn render_request_node(
    namespace: &str,
    tagged: &TaggedNode,
    config: &CodecConfig,
) -> Result<RequestBody> {
    let mut canonicalizer = UsingPrefix::new().with_default_namespace(namespace);
    let elem = internal_to_elem(tagged, &mut canonicalizer, &config.converter)?;
    let body = elem.to_xml(&config.writer)?;
    debug!(root = %tagged.tag, %namespace, bytes = body.len(), "rendered XML request");
    Ok(RequestBody {
        content_type: XML_CONTENT_TYPE,
        body,
    })
}
