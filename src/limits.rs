//! Limits and constraints for document conversion
//!
//! Both converters recurse once per nesting level, so the depth limit bounds
//! stack usage on deeply nested or hostile input. The size and attribute
//! limits are enforced while parsing.

use crate::error::{Error, Result};

/// Limits applied while parsing and converting documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth (root is depth 0)
    pub max_xml_depth: usize,

    /// Maximum XML or JSON input size in bytes
    pub max_xml_size: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            max_xml_size: 100 * 1024 * 1024, // 100 MB
            max_attributes: 1000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 100,
            max_xml_size: 10 * 1024 * 1024, // 10 MB
            max_attributes: 100,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_xml_depth: 10000,
            max_xml_size: 1024 * 1024 * 1024, // 1 GB
            max_attributes: 10000,
        }
    }

    /// Set the maximum nesting depth
    pub fn with_max_xml_depth(mut self, depth: usize) -> Self {
        self.max_xml_depth = depth;
        self
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if JSON nesting can describe an element tree within the depth limit.
    ///
    /// An element level takes at most two JSON levels (a list of objects), plus
    /// the outer `{tag: ...}` object.
    pub fn check_json_depth(&self, depth: usize) -> Result<()> {
        let max = self.max_xml_depth.saturating_add(1).saturating_mul(2);
        if depth > max {
            Err(Error::LimitExceeded(format!(
                "JSON depth {} exceeds maximum {}",
                depth, max
            )))
        } else {
            Ok(())
        }
    }

    /// Check if input size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "input size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of attributes is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        if count > self.max_attributes {
            Err(Error::LimitExceeded(format!(
                "Attribute count {} exceeds maximum {}",
                count, self.max_attributes
            )))
        } else {
            Ok(())
        }
    }
}
