//! XML Schema components and content models
//!
//! The particle model (`particles`, `wildcards`, `groups`, `complex_types`)
//! is what a schema parser produces. `models` compiles it into automata.

pub mod complex_types;
pub mod groups;
pub mod models;
pub mod particles;
pub mod wildcards;

// Re-exports
pub use complex_types::{ContentTypeLabel, XsdComplexType};
pub use groups::{ElementParticle, GroupParticle, ModelType, XsdGroup};
pub use models::{
    AllContentModel, BitSet, CmBuilder, CmNode, CmState, ContentModel, DfaContentModel,
    EmptyContentModel, NodeFactory, SharedContentModel, Term, UpaChecker, ValidationResult,
};
pub use particles::{Occurs, Particle};
pub use wildcards::{NamespaceConstraint, WildcardKind, XsdAnyElement};
