//! XML namespace handling
//!
//! Qualified names are the input alphabet of content models: every child
//! element handed to a validator is identified by its [`QName`].

use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

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

    /// Namespace URI as a string slice, `None` when absent
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_creation() {
        let qname = QName::namespaced("http://example.com", "foo");
        assert_eq!(qname.namespace(), Some("http://example.com"));
        assert_eq!(qname.local_name, "foo");

        let none: Option<String> = None;
        assert_eq!(QName::new(none, "bar"), QName::local("bar"));
    }

    #[test]
    fn test_qname_to_string() {
        let qname = QName::namespaced("http://example.com", "foo");
        assert_eq!(qname.to_string(), "{http://example.com}foo");

        let local = QName::local("bar");
        assert_eq!(local.to_string(), "bar");
    }

    #[test]
    fn test_qname_equality_includes_namespace() {
        assert_ne!(QName::local("a"), QName::namespaced("urn:x", "a"));
        assert_eq!(QName::namespaced("urn:x", "a"), QName::namespaced("urn:x", "a"));
    }
}
