//! # xsd-content-model
//!
//! The content model engine of an XML Schema processor: it compiles particle
//! trees (sequences, choices, `all` groups, elements and wildcards with
//! occurrence ranges) into deterministic automata, validates sequences of
//! child element names against them, and checks Unique Particle Attribution.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xsd_content_model::namespaces::QName;
//! use xsd_content_model::reporter::LogReporter;
//! use xsd_content_model::validators::{
//!     CmBuilder, ModelType, Occurs, ValidationResult, XsdComplexType, XsdGroup,
//! };
//! use xsd_content_model::Settings;
//!
//! let settings = Settings::default();
//! let mut builder = CmBuilder::from_settings(&settings, Arc::new(LogReporter));
//!
//! let mut group = XsdGroup::new(ModelType::Sequence);
//! group.add_element(QName::local("title"), Occurs::once());
//! group.add_element(QName::local("para"), Occurs::new(1, Some(3)));
//! let ty = XsdComplexType::element_only(None, group);
//!
//! let model = ty.content_model(&mut builder, false)?.expect("element-only type");
//! let children = [QName::local("title"), QName::local("para")];
//! assert_eq!(model.validate(&children), ValidationResult::Valid);
//! # Ok::<(), xsd_content_model::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod error;
pub mod limits;
pub mod reporter;
pub mod settings;

// Utilities
pub mod namespaces;

// Schema components and content models
pub mod validators;

// Re-exports for convenience
pub use error::{Ambiguity, Error, ParseError, Result};
pub use limits::Limits;
pub use reporter::{CollectingReporter, Diagnostic, ErrorReporter, LogReporter, Severity};
pub use settings::Settings;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
