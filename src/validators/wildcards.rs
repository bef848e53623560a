//! XSD Wildcard components
//!
//! This module implements element wildcards (`xs:any`) as they appear in
//! content models: a namespace constraint plus occurrence bounds.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Wildcards

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ParseError;
use crate::namespaces::QName;

use super::particles::{Occurs, Particle};

/// Coarse classification of a wildcard's namespace constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `##any`
    Any,
    /// `##other`: any qualified namespace except the target namespace
    AnyOther,
    /// `##local`: only unqualified names
    AnyLocal,
    /// An explicit list of namespaces
    AnyList,
    /// Every namespace except the listed ones (XSD 1.1 notNamespace)
    AnyNot,
}

/// Namespace constraint for wildcards
///
/// The empty string stands for "no namespace" inside the namespace sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces
    Enumeration(BTreeSet<String>),
    /// XSD 1.1: Set of disallowed namespaces (notNamespace)
    Not(BTreeSet<String>),
}

impl NamespaceConstraint {
    /// Create from namespace attribute value
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            value => Ok(Self::Enumeration(parse_namespace_list(
                value,
                target_namespace,
                "namespace",
            )?)),
        }
    }

    /// Create from notNamespace attribute (XSD 1.1)
    pub fn from_not_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        Ok(Self::Not(parse_namespace_list(
            value.trim(),
            target_namespace,
            "notNamespace",
        )?))
    }

    /// Constraint that only admits unqualified names (##local)
    pub fn local() -> Self {
        Self::Enumeration(BTreeSet::from([String::new()]))
    }

    /// Classify this constraint
    pub fn kind(&self) -> WildcardKind {
        match self {
            Self::Any => WildcardKind::Any,
            Self::Other { .. } => WildcardKind::AnyOther,
            Self::Enumeration(set) if set.len() == 1 && set.contains("") => WildcardKind::AnyLocal,
            Self::Enumeration(_) => WildcardKind::AnyList,
            Self::Not(_) => WildcardKind::AnyNot,
        }
    }

    /// Check if a namespace (None = no namespace) is allowed
    pub fn is_allowed(&self, namespace: Option<&str>) -> bool {
        let namespace = namespace.unwrap_or("");
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => {
                !namespace.is_empty() && target_namespace.as_deref() != Some(namespace)
            }
            Self::Enumeration(set) => set.contains(namespace),
            Self::Not(set) => !set.contains(namespace),
        }
    }

    /// Check whether this constraint admits no namespace at all
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Enumeration(set) if set.is_empty())
    }

    /// Check whether some namespace is allowed by both constraints
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, x) | (x, Self::Any) => !x.is_void(),

            // namespace space is infinite, two exclusions always share something
            (Self::Other { .. }, Self::Other { .. })
            | (Self::Other { .. }, Self::Not(_))
            | (Self::Not(_), Self::Other { .. })
            | (Self::Not(_), Self::Not(_)) => true,

            (Self::Other { .. }, Self::Enumeration(set))
            | (Self::Enumeration(set), Self::Other { .. }) => {
                let other = if matches!(self, Self::Other { .. }) { self } else { other };
                set.iter().any(|ns| other.is_allowed(Some(ns)))
            }

            (Self::Enumeration(a), Self::Enumeration(b)) => a.intersection(b).next().is_some(),

            (Self::Enumeration(set), Self::Not(excluded))
            | (Self::Not(excluded), Self::Enumeration(set)) => {
                set.iter().any(|ns| !excluded.contains(ns))
            }
        }
    }
}

fn parse_namespace_list(
    value: &str,
    target_namespace: Option<&str>,
    attribute: &str,
) -> Result<BTreeSet<String>, ParseError> {
    let mut namespaces = BTreeSet::new();
    for ns in value.split_whitespace() {
        match ns {
            "##local" => {
                namespaces.insert(String::new());
            }
            "##targetNamespace" => {
                namespaces.insert(target_namespace.unwrap_or("").to_string());
            }
            s if s.starts_with("##") => {
                return Err(ParseError::new(format!(
                    "wrong value '{}' in '{}' attribute",
                    s, attribute
                )));
            }
            uri => {
                namespaces.insert(uri.to_string());
            }
        }
    }
    Ok(namespaces)
}

impl fmt::Display for NamespaceConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |set: &BTreeSet<String>| {
            set.iter()
                .map(|ns| if ns.is_empty() { "##local" } else { ns.as_str() })
                .collect::<Vec<_>>()
                .join(" ")
        };
        match self {
            Self::Any => write!(f, "##any"),
            Self::Other { target_namespace: Some(tns) } => write!(f, "##other:{}", tns),
            Self::Other { target_namespace: None } => write!(f, "##other"),
            Self::Enumeration(set) => write!(f, "{}", list(set)),
            Self::Not(set) => write!(f, "not {}", list(set)),
        }
    }
}

/// XSD any element wildcard (xs:any)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdAnyElement {
    /// Namespace constraint
    pub namespace: NamespaceConstraint,
    /// Occurrence constraints
    occurs: Occurs,
}

impl XsdAnyElement {
    /// Create a wildcard with a namespace constraint and occurrence bounds
    pub fn new(namespace: NamespaceConstraint, occurs: Occurs) -> Self {
        Self { namespace, occurs }
    }

    /// Create a wildcard that allows any element (##any), zero or more times
    pub fn any() -> Self {
        Self::new(NamespaceConstraint::Any, Occurs::zero_or_more())
    }

    /// Replace the occurrence bounds
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Wildcard kind
    pub fn kind(&self) -> WildcardKind {
        self.namespace.kind()
    }

    /// Check if an element name matches this wildcard
    pub fn is_matching(&self, name: &QName) -> bool {
        self.namespace.is_allowed(name.namespace())
    }

    /// Check whether both wildcards could match the same element
    pub fn overlaps(&self, other: &XsdAnyElement) -> bool {
        self.namespace.overlaps(&other.namespace)
    }
}

impl Particle for XsdAnyElement {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}

impl fmt::Display for XsdAnyElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.namespace)
    }
}
