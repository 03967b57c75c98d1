//! XML namespace handling
//!
//! Qualified names travel through the library in Clark notation
//! (`{namespaceURI}localName`). A [`Canonicalizer`] maps them to short
//! display names for the internal form (`prefix:localName`, or a bare local
//! name for the default namespace) and back again.

use crate::documents::Element;
use crate::error::{Error, Result, ValidationError};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::trace;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Prefixes of this form are handed out automatically and cannot be registered
static RESERVED_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ns\d+$").unwrap());

/// Prefixes known without being registered, as (URI, prefix)
pub const WELL_KNOWN_NAMESPACES: &[(&str, &str)] = &[
    (crate::XML_NAMESPACE, "xml"),
    ("http://www.w3.org/1999/xhtml", "html"),
    ("http://www.w3.org/1999/02/22-rdf-syntax-ns#", "rdf"),
    ("http://schemas.xmlsoap.org/wsdl/", "wsdl"),
    // xml schema
    (crate::XSD_NAMESPACE, "xs"),
    (crate::XSI_NAMESPACE, "xsi"),
    // dublin core
    ("http://purl.org/dc/elements/1.1/", "dc"),
];

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Split a Clark-notation name into namespace and local name.
    ///
    /// A name without a leading `{` (or with no closing `}`) has no namespace.
    pub fn from_clark(name: &str) -> Self {
        name.strip_prefix('{')
            .and_then(|rest| rest.rsplit_once('}'))
            .map(|(uri, local)| Self::namespaced(uri, local))
            .unwrap_or_else(|| Self::local(name))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Two-way mapping between qualified names and display names.
///
/// Implementations may allocate state while encoding (new prefixes), so both
/// directions take `&mut self`. One instance is threaded through a whole
/// conversion so prefixes stay consistent across the subtree.
pub trait Canonicalizer {
    /// Map a Clark-notation name to its display form
    fn encode(&mut self, qname: &str) -> String;

    /// Map a display name back to Clark notation
    fn decode(&mut self, name: &str) -> Result<String>;
}

/// Canonicalizer that displays namespaces as short prefixes
///
/// Unknown namespaces are assigned `ns0`, `ns1`, ... in the order they are
/// first encoded. Names in the default namespace are displayed bare.
#[derive(Debug, Clone)]
pub struct UsingPrefix {
    separator: String,
    default_namespace: Option<NamespaceUri>,
    /// URI -> prefix, in insertion order
    namespace_map: IndexMap<NamespaceUri, Prefix>,
    namespace_count: usize,
}

impl Default for UsingPrefix {
    fn default() -> Self {
        Self::new()
    }
}

impl UsingPrefix {
    /// Create a canonicalizer with `:` as separator and no default namespace
    pub fn new() -> Self {
        Self {
            separator: ":".to_string(),
            default_namespace: None,
            namespace_map: WELL_KNOWN_NAMESPACES
                .iter()
                .map(|(uri, prefix)| (uri.to_string(), prefix.to_string()))
                .collect(),
            namespace_count: 0,
        }
    }

    /// Use a different prefix separator
    pub fn with_separator(mut self, separator: impl Into<String>) -> Result<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(ValidationError::new("Prefix separator must not be empty").into());
        }
        self.separator = separator;
        Ok(self)
    }

    /// Set the default namespace.
    ///
    /// Accepts a bare URI or a Clark-notation name, whose URI part is used.
    /// An empty string clears the default namespace.
    pub fn with_default_namespace(mut self, namespace: impl AsRef<str>) -> Self {
        let namespace = namespace.as_ref();
        let uri = if namespace.starts_with('{') {
            QName::from_clark(namespace).namespace
        } else {
            Some(namespace.to_string())
        };
        self.default_namespace = uri.filter(|uri| !uri.is_empty());
        self
    }

    /// Canonicalizer whose default namespace is the namespace of `root`
    pub fn for_root(root: &Element) -> Self {
        match root.namespace() {
            Some(ns) => Self::new().with_default_namespace(ns),
            None => Self::new(),
        }
    }

    /// Get the separator
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Get the default namespace
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Get the prefix bound to a namespace URI
    pub fn prefix(&self, uri: &str) -> Option<&str> {
        self.namespace_map.get(uri).map(|s| s.as_str())
    }

    /// Get the namespace URI bound to a prefix
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespace_map
            .iter()
            .find(|(_, p)| p.as_str() == prefix)
            .map(|(uri, _)| uri.as_str())
    }

    /// Bind `prefix` to `uri`, replacing any binding of either.
    pub fn register_prefix(&mut self, prefix: &str, uri: &str) -> Result<()> {
        if RESERVED_PREFIX.is_match(prefix) || prefix.contains(self.separator.as_str()) {
            return Err(ValidationError::new("Prefix format reserved for internal use")
                .with_value(prefix)
                .with_reason(format!("nsN prefixes and the separator '{}' are reserved", self.separator))
                .into());
        }
        self.namespace_map
            .retain(|known_uri, known_prefix| known_uri.as_str() != uri && known_prefix.as_str() != prefix);
        self.namespace_map.insert(uri.to_string(), prefix.to_string());
        Ok(())
    }

    /// Look up the prefix for `uri`, allocating `nsN` if it has none.
    ///
    /// The default namespace is not consulted.
    pub fn prefix_for(&mut self, uri: &str) -> String {
        if let Some(prefix) = self.namespace_map.get(uri) {
            return prefix.clone();
        }
        let prefix = format!("ns{}", self.namespace_count);
        self.namespace_count += 1;
        trace!(%uri, %prefix, "allocated namespace prefix");
        self.namespace_map.insert(uri.to_string(), prefix.clone());
        prefix
    }
}

impl Canonicalizer for UsingPrefix {
    fn encode(&mut self, qname: &str) -> String {
        let QName {
            namespace,
            local_name,
        } = QName::from_clark(qname);
        match namespace {
            None => qname.to_string(),
            Some(uri) if self.default_namespace.as_deref() == Some(uri.as_str()) => local_name,
            Some(uri) => {
                let prefix = self.prefix_for(&uri);
                format!("{}{}{}", prefix, self.separator, local_name)
            }
        }
    }

    fn decode(&mut self, name: &str) -> Result<String> {
        match name.split_once(self.separator.as_str()) {
            None => Ok(match &self.default_namespace {
                Some(ns) => QName::namespaced(ns.as_str(), name).to_string(),
                None => name.to_string(),
            }),
            Some((prefix, local)) => {
                let uri = self.namespace(prefix).ok_or_else(|| {
                    Error::Namespace(format!("Unknown prefix '{}' in '{}'", prefix, name))
                })?;
                Ok(QName::namespaced(uri, local).to_string())
            }
        }
    }
}

/// Canonicalizer that drops namespaces entirely
///
/// Encoding keeps only the local name; decoding returns names as they are.
/// Namespaced documents do not survive a round trip through it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripNamespaces;

impl Canonicalizer for StripNamespaces {
    fn encode(&mut self, qname: &str) -> String {
        QName::from_clark(qname).local_name
    }

    fn decode(&mut self, name: &str) -> Result<String> {
        Ok(name.to_string())
    }
}
