//! XSD Model Group components
//!
//! This module implements model groups for XSD content models:
//! - xs:sequence - ordered content
//! - xs:choice - alternative content
//! - xs:all - unordered content (elements and wildcards only)
//!
//! Groups are the input of the content model builder, which turns the
//! particle tree into a syntax tree and then into an automaton.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Model_Groups

use std::fmt;
use std::sync::Arc;

use crate::namespaces::QName;

use super::particles::{Occurs, Particle};
use super::wildcards::XsdAnyElement;

/// Model group compositor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelType {
    /// Ordered sequence of particles
    #[default]
    Sequence,
    /// One of multiple alternatives
    Choice,
    /// Unordered set of particles
    All,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// A particle in a model group (element, wildcard, or nested group)
#[derive(Debug, Clone)]
pub enum GroupParticle {
    /// Element declaration or reference
    Element(Arc<ElementParticle>),
    /// Wildcard (xs:any)
    Any(Arc<XsdAnyElement>),
    /// Nested model group
    Group(Arc<XsdGroup>),
}

impl GroupParticle {
    /// Get the occurrence constraints
    pub fn occurs(&self) -> Occurs {
        match self {
            Self::Element(e) => e.occurs,
            Self::Any(a) => a.occurs(),
            Self::Group(g) => g.occurs,
        }
    }

    /// Element or wildcard, as opposed to a model group
    pub fn is_term(&self) -> bool {
        !matches!(self, Self::Group(_))
    }
}

impl From<ElementParticle> for GroupParticle {
    fn from(element: ElementParticle) -> Self {
        Self::Element(Arc::new(element))
    }
}

impl From<XsdAnyElement> for GroupParticle {
    fn from(any: XsdAnyElement) -> Self {
        Self::Any(Arc::new(any))
    }
}

impl From<XsdGroup> for GroupParticle {
    fn from(group: XsdGroup) -> Self {
        Self::Group(Arc::new(group))
    }
}

/// Element particle in a model group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementParticle {
    /// Element name
    pub name: QName,
    /// Occurrence constraints
    pub occurs: Occurs,
}

impl ElementParticle {
    /// Create a new element particle
    pub fn new(name: QName, occurs: Occurs) -> Self {
        Self { name, occurs }
    }
}

impl Particle for ElementParticle {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}

/// XSD Model Group definition
#[derive(Debug, Clone)]
pub struct XsdGroup {
    /// Model type (sequence, choice, all)
    pub model: ModelType,
    /// Child particles
    pub particles: Vec<GroupParticle>,
    /// Occurrence constraints
    pub occurs: Occurs,
}

impl XsdGroup {
    /// Create a new anonymous group
    pub fn new(model: ModelType) -> Self {
        Self {
            model,
            particles: Vec::new(),
            occurs: Occurs::once(),
        }
    }

    /// Replace the occurrence bounds
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Add a particle to the group
    pub fn add_particle(&mut self, particle: GroupParticle) {
        self.particles.push(particle);
    }

    /// Add an element particle
    pub fn add_element(&mut self, name: QName, occurs: Occurs) {
        self.add_particle(ElementParticle::new(name, occurs).into());
    }

    /// Add a wildcard particle
    pub fn add_any(&mut self, any: XsdAnyElement) {
        self.add_particle(any.into());
    }

    /// Add a nested group
    pub fn add_group(&mut self, group: XsdGroup) {
        self.add_particle(group.into());
    }

    /// Check if the group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Iterate over child particles
    pub fn iter(&self) -> impl Iterator<Item = &GroupParticle> {
        self.particles.iter()
    }

    /// Number of child particles
    pub fn len(&self) -> usize {
        self.particles.len()
    }
}

impl Particle for XsdGroup {
    fn occurs(&self) -> Occurs {
        self.occurs
    }
}
