//! # xmljson
//!
//! A bidirectional structural codec between XML element trees and a
//! JSON-compatible internal form.
//!
//! ## Features
//!
//! - Attributes, text, tail text and element order preserved
//! - Same-named siblings grouped into lists
//! - Namespaces shown as short prefixes through a pluggable canonicalizer
//! - Default namespace injection for API endpoints
//! - Nesting and size limits for untrusted input
//!
//! ## Example
//!
//! ```rust
//! use xmljson::{json_to_xml, xml_to_json};
//!
//! let json = xml_to_json(b"<e><a>1</a><a>2</a></e>", true)?;
//! assert_eq!(json, r#"{"e":{"a":["1","2"]}}"#);
//!
//! let xml = json_to_xml(&json)?;
//! assert_eq!(xml, b"<e><a>1</a><a>2</a></e>");
//! # Ok::<(), xmljson::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and trees
pub mod namespaces;
pub mod documents;

// Conversion
pub mod converters;
pub mod codec;

// API boundary
pub mod client;

// Re-exports for convenience
pub use codec::{internal_to_xml, json_to_xml, xml_to_internal, xml_to_json, Codec, CodecConfig};
pub use converters::{elem_to_internal, internal_to_elem, ConverterConfig, Node, TaggedNode};
pub use documents::{Document, Element, WriterConfig};
pub use error::{Error, Result};
pub use namespaces::{Canonicalizer, StripNamespaces, UsingPrefix};

/// Version of the xmljson library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
