//! Runtime interface of compiled content models

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::Ambiguity;
use crate::namespaces::QName;

use super::nodes::Term;

/// Shared, immutable content model
pub type SharedContentModel = Arc<dyn ContentModel>;

/// Outcome of validating a sequence of children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationResult {
    /// Every child was accepted and the content is complete
    Valid,
    /// The child at this index has no valid transition
    Invalid(usize),
    /// Every child was accepted but more are required; carries the length
    Incomplete(usize),
}

impl ValidationResult {
    /// Check for [`ValidationResult::Valid`]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid(index) => write!(f, "invalid child at index {}", index),
            Self::Incomplete(length) => write!(f, "content incomplete after {} children", length),
        }
    }
}

/// Per-instance validation state
///
/// Created by [`ContentModel::start`] and advanced by [`ContentModel::step`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CmState {
    pub(crate) current: usize,
    pub(crate) counter: u32,
    pub(crate) counts: Vec<u32>,
    pub(crate) failed: bool,
}

impl CmState {
    pub(crate) fn with_counts(members: usize) -> Self {
        Self {
            counts: vec![0; members],
            ..Self::default()
        }
    }

    /// Whether a child was rejected
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Automaton state, or the last good state after a rejection
    pub fn current_state(&self) -> usize {
        self.current
    }
}

/// A compiled content model
pub trait ContentModel: Send + Sync + fmt::Debug {
    /// Fresh validation state
    fn start(&self) -> CmState;

    /// Consume one child element, returning the matched term
    ///
    /// `None` means the child is not allowed here; the state is then failed
    /// and every later step returns `None` too.
    fn step<'a>(&'a self, state: &mut CmState, name: &QName) -> Option<&'a Term>;

    /// Whether the content may end in this state
    fn end(&self, state: &CmState) -> bool;

    /// Terms that could be accepted next
    fn expected(&self, state: &CmState) -> Vec<Term>;

    /// Whether occurrence ranges were approximated for the UPA check
    fn is_compacted_for_upa(&self) -> bool {
        false
    }

    /// Unique Particle Attribution violations of this model
    fn ambiguities(&self) -> Vec<Ambiguity>;

    /// Validate a complete sequence of children
    fn validate(&self, children: &[QName]) -> ValidationResult {
        let mut state = self.start();
        for (index, child) in children.iter().enumerate() {
            if self.step(&mut state, child).is_none() {
                return ValidationResult::Invalid(index);
            }
        }
        if self.end(&state) {
            ValidationResult::Valid
        } else {
            ValidationResult::Incomplete(children.len())
        }
    }

    /// Validate `children[offset..offset + length]`
    ///
    /// Indices in the result are relative to `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    fn validate_range(&self, children: &[QName], offset: usize, length: usize) -> ValidationResult {
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= children.len());
        match end {
            Some(end) => self.validate(&children[offset..end]),
            None => panic!(
                "range {}..{}+{} out of bounds for {} children",
                offset,
                offset,
                length,
                children.len()
            ),
        }
    }
}

static EMPTY_CONTENT_MODEL: Lazy<SharedContentModel> =
    Lazy::new(|| Arc::new(EmptyContentModel));

/// Model of a content type without particles; accepts no children
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContentModel;

impl EmptyContentModel {
    /// The process-wide instance
    pub fn shared() -> SharedContentModel {
        Arc::clone(&EMPTY_CONTENT_MODEL)
    }
}

impl ContentModel for EmptyContentModel {
    fn start(&self) -> CmState {
        CmState::default()
    }

    fn step<'a>(&'a self, state: &mut CmState, _name: &QName) -> Option<&'a Term> {
        state.failed = true;
        None
    }

    fn end(&self, state: &CmState) -> bool {
        !state.failed
    }

    fn expected(&self, _state: &CmState) -> Vec<Term> {
        Vec::new()
    }

    fn ambiguities(&self) -> Vec<Ambiguity> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_model() {
        let model = EmptyContentModel::shared();
        assert_eq!(model.validate(&[]), ValidationResult::Valid);
        assert_eq!(
            model.validate(&[QName::local("a")]),
            ValidationResult::Invalid(0)
        );
        assert!(model.expected(&model.start()).is_empty());
        assert!(Arc::ptr_eq(&model, &EmptyContentModel::shared()));
    }

    #[test]
    fn test_validate_range() {
        let model = EmptyContentModel::shared();
        let children = vec![QName::local("a"), QName::local("b")];
        assert_eq!(model.validate_range(&children, 1, 0), ValidationResult::Valid);
        assert_eq!(
            model.validate_range(&children, 1, 1),
            ValidationResult::Invalid(0)
        );
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_validate_range_out_of_bounds() {
        let model = EmptyContentModel::shared();
        model.validate_range(&[QName::local("a")], 1, 1);
    }

    #[test]
    fn test_result_display() {
        assert_eq!(ValidationResult::Valid.to_string(), "valid");
        assert_eq!(
            ValidationResult::Invalid(2).to_string(),
            "invalid child at index 2"
        );
        assert!(!ValidationResult::Incomplete(3).is_valid());
    }
}
