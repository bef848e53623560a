//! XSD Complex Type components
//!
//! Only the part of a complex type that matters for child element
//! validation is modelled here: its content type and its particle. The
//! compiled content models are cached on the type.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#Complex_Type_Definitions

use std::fmt;

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::namespaces::QName;

use super::groups::{GroupParticle, XsdGroup};
use super::models::{CmBuilder, SharedContentModel};

/// Content type label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentTypeLabel {
    /// No content allowed
    #[default]
    Empty,
    /// Simple content (text only)
    Simple,
    /// Element-only content
    ElementOnly,
    /// Mixed content (text and elements)
    Mixed,
}

impl ContentTypeLabel {
    /// Whether child elements are governed by a particle
    pub fn has_particles(&self) -> bool {
        matches!(self, Self::ElementOnly | Self::Mixed)
    }
}

impl fmt::Display for ContentTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Simple => write!(f, "simple"),
            Self::ElementOnly => write!(f, "element-only"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// XSD Complex Type definition
#[derive(Debug, Default)]
pub struct XsdComplexType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Content type
    pub content_type: ContentTypeLabel,
    /// Content particle
    pub particle: Option<GroupParticle>,
    model: OnceCell<Option<SharedContentModel>>,
    upa_model: OnceCell<Option<SharedContentModel>>,
}

impl XsdComplexType {
    /// Create a new complex type
    pub fn new(
        name: Option<QName>,
        content_type: ContentTypeLabel,
        particle: Option<GroupParticle>,
    ) -> Self {
        Self {
            name,
            content_type,
            particle,
            model: OnceCell::new(),
            upa_model: OnceCell::new(),
        }
    }

    /// Element-only type with a model group
    pub fn element_only(name: Option<QName>, group: XsdGroup) -> Self {
        Self::new(name, ContentTypeLabel::ElementOnly, Some(group.into()))
    }

    /// Mixed type with a model group
    pub fn mixed(name: Option<QName>, group: XsdGroup) -> Self {
        Self::new(name, ContentTypeLabel::Mixed, Some(group.into()))
    }

    /// Type with simple content
    pub fn simple(name: Option<QName>) -> Self {
        Self::new(name, ContentTypeLabel::Simple, None)
    }

    /// Type with empty content
    pub fn empty(name: Option<QName>) -> Self {
        Self::new(name, ContentTypeLabel::Empty, None)
    }

    /// Content model of this type, built on first use
    ///
    /// With `for_upa` the model used for the UPA check is returned. If that
    /// model was built without approximating occurrence ranges it is also
    /// cached as the validation model.
    pub fn content_model(
        &self,
        builder: &mut CmBuilder,
        for_upa: bool,
    ) -> Result<Option<SharedContentModel>> {
        if !for_upa {
            return self
                .model
                .get_or_try_init(|| builder.content_model(self, false))
                .cloned();
        }

        let model = self
            .upa_model
            .get_or_try_init(|| builder.content_model(self, true))?
            .clone();
        if model.as_ref().map_or(true, |m| !m.is_compacted_for_upa()) {
            let _ = self.model.set(model.clone());
        }
        Ok(model)
    }

    /// Validation model, if it was built already
    pub fn cached_content_model(&self) -> Option<&SharedContentModel> {
        self.model.get().and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::limits::Limits;
    use crate::reporter::CollectingReporter;
    use crate::validators::groups::ModelType;
    use crate::validators::models::ValidationResult;
    use crate::validators::particles::Occurs;

    fn builder() -> CmBuilder {
        CmBuilder::new(&Limits::default(), Arc::new(CollectingReporter::new()))
    }

    #[test]
    fn test_simple_and_empty_types_have_no_model() {
        let mut b = builder();
        assert!(XsdComplexType::simple(None).content_model(&mut b, false).unwrap().is_none());
        assert!(XsdComplexType::empty(None).content_model(&mut b, false).unwrap().is_none());
    }

    #[test]
    fn test_element_only_without_particle() {
        let mut b = builder();
        let ty = XsdComplexType::new(None, ContentTypeLabel::ElementOnly, None);
        let model = ty.content_model(&mut b, false).unwrap().unwrap();
        assert_eq!(model.validate(&[]), ValidationResult::Valid);
    }

    #[test]
    fn test_model_is_cached() {
        let mut b = builder();
        let mut group = XsdGroup::new(ModelType::Sequence);
        group.add_element(QName::local("a"), Occurs::once());
        let ty = XsdComplexType::element_only(Some(QName::local("t")), group);

        assert!(ty.cached_content_model().is_none());
        let first = ty.content_model(&mut b, false).unwrap().unwrap();
        let second = ty.content_model(&mut b, false).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_uncompacted_upa_model_is_reused() {
        let mut b = builder();
        let mut group = XsdGroup::new(ModelType::Sequence);
        group.add_element(QName::local("a"), Occurs::new(2, Some(5)));
        let ty = XsdComplexType::element_only(None, group);

        let upa = ty.content_model(&mut b, true).unwrap().unwrap();
        assert!(!upa.is_compacted_for_upa());
        let model = ty.cached_content_model().unwrap();
        assert!(Arc::ptr_eq(&upa, model));
    }

    #[test]
    fn test_compacted_upa_model_is_not_reused() {
        let mut b = builder();
        let mut inner = XsdGroup::new(ModelType::Sequence);
        inner.add_element(QName::local("a"), Occurs::once());
        inner.add_element(QName::local("b"), Occurs::once());
        let mut group = XsdGroup::new(ModelType::Sequence);
        group.add_group(inner.with_occurs(Occurs::new(3, Some(3))));
        let ty = XsdComplexType::mixed(None, group);

        let upa = ty.content_model(&mut b, true).unwrap().unwrap();
        assert!(upa.is_compacted_for_upa());
        assert!(ty.cached_content_model().is_none());

        let model = ty.content_model(&mut b, false).unwrap().unwrap();
        assert!(!model.is_compacted_for_upa());
        let children: Vec<QName> = ["a", "b", "a", "b", "a", "b"]
            .iter()
            .map(|n| QName::local(*n))
            .collect();
        assert_eq!(model.validate(&children), ValidationResult::Valid);
        assert_eq!(
            model.validate(&children[..4]),
            ValidationResult::Incomplete(4)
        );
    }
}
