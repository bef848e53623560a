//! XSD Content Model engine
//!
//! This module compiles particle trees into automata that validate the
//! sequence of child elements of a complex type:
//! - a syntax tree of numbered leaves ([`CmNode`]) built by [`CmBuilder`]
//! - a DFA by subset construction over follow positions ([`DfaContentModel`])
//! - a counting model for `all` groups ([`AllContentModel`])
//! - Unique Particle Attribution checking ([`UpaChecker`])
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#coss-particle

pub mod all;
pub mod bitset;
pub mod builder;
pub mod dfa;
pub mod factory;
pub mod nodes;
pub mod upa;
pub mod validator;

pub use all::{AllContentModel, AllMember};
pub use bitset::BitSet;
pub use builder::{CmBuilder, ContentModelTree};
pub use dfa::{DfaContentModel, ElementMapEntry, Occurrence};
pub use factory::NodeFactory;
pub use nodes::{BinaryOp, CmNode, Leaf, NodeKind, Term, UnaryOp};
pub use upa::UpaChecker;
pub use validator::{CmState, ContentModel, EmptyContentModel, SharedContentModel, ValidationResult};
