//! Unique Particle Attribution
//!
//! A content model violates UPA when some child element could be attributed
//! to two different particles without look-ahead. For an automaton this
//! means one state has transitions on two element map entries whose terms
//! overlap. For an `all` group any two overlapping members conflict.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#cos-nonambig

use std::sync::Arc;

use crate::error::{Ambiguity, Error, Result};
use crate::reporter::{Diagnostic, ErrorReporter, Severity, COS_NONAMBIG};
use crate::settings::Settings;
use crate::validators::complex_types::XsdComplexType;

use super::all::AllMember;
use super::builder::CmBuilder;
use super::dfa::{ElementMapEntry, Occurrence};
use super::nodes::Term;
use super::validator::ContentModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conflict {
    Unknown,
    Distinct,
    Overlap,
}

fn ambiguity(first: (&Term, usize), second: (&Term, usize)) -> Ambiguity {
    Ambiguity {
        first: first.0.to_string(),
        second: second.0.to_string(),
        first_particle: first.1,
        second_particle: second.1,
    }
}

/// Conflicting element map entries of an automaton
///
/// Each pair is decided in the first state where both entries have a
/// transition. In a counting state with `min == max`, a pair where exactly
/// one transition loops back is not a conflict: the counter decides.
pub(crate) fn dfa_conflicts(
    element_map: &[ElementMapEntry],
    transitions: &[Vec<Option<usize>>],
    counting_states: &[Option<Occurrence>],
) -> Vec<Ambiguity> {
    let size = element_map.len();
    let mut table = vec![vec![Conflict::Unknown; size]; size];

    for (state, row) in transitions.iter().enumerate() {
        for j in 0..size {
            let Some(target_j) = row[j] else { continue };
            for k in j + 1..size {
                let Some(target_k) = row[k] else { continue };
                if table[j][k] != Conflict::Unknown {
                    continue;
                }
                table[j][k] = if !element_map[j].term.overlaps(&element_map[k].term) {
                    Conflict::Distinct
                } else {
                    match counting_states[state] {
                        Some(occurrence)
                            if occurrence.max == Some(occurrence.min)
                                && ((target_j == state) ^ (target_k == state)) =>
                        {
                            Conflict::Distinct
                        }
                        _ => Conflict::Overlap,
                    }
                };
            }
        }
    }

    let mut conflicts = Vec::new();
    for j in 0..size {
        for k in j + 1..size {
            if table[j][k] == Conflict::Overlap {
                let (a, b) = (&element_map[j], &element_map[k]);
                conflicts.push(ambiguity((&a.term, a.particle_id), (&b.term, b.particle_id)));
            }
        }
    }
    conflicts
}

/// Overlapping members of an `all` group
pub(crate) fn all_conflicts(members: &[AllMember]) -> Vec<Ambiguity> {
    let mut conflicts = Vec::new();
    for (j, a) in members.iter().enumerate() {
        for b in &members[j + 1..] {
            if a.term.overlaps(&b.term) {
                conflicts.push(ambiguity((&a.term, a.particle_id), (&b.term, b.particle_id)));
            }
        }
    }
    conflicts
}

/// Checks complex types for Unique Particle Attribution
#[derive(Debug, Clone)]
pub struct UpaChecker {
    enabled: bool,
    severity: Severity,
    reporter: Arc<dyn ErrorReporter>,
}

impl UpaChecker {
    /// Create a checker reporting to `reporter`
    pub fn new(settings: &Settings, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            enabled: settings.upa_checking,
            severity: settings.upa_severity,
            reporter,
        }
    }

    /// Check the content model of a complex type
    ///
    /// Builds the type's UPA model if it is not cached yet. Returns `Ok(false)`
    /// if a violation was reported; errors only come from compilation.
    pub fn check(&self, ty: &XsdComplexType, builder: &mut CmBuilder) -> Result<bool> {
        if !self.enabled {
            return Ok(true);
        }
        match ty.content_model(builder, true)? {
            Some(model) => Ok(self.check_model(model.as_ref())),
            None => Ok(true),
        }
    }

    /// Check an already compiled model, reporting every violation
    pub fn check_model(&self, model: &dyn ContentModel) -> bool {
        if !self.enabled {
            return true;
        }
        let ambiguities = model.ambiguities();
        for ambiguity in &ambiguities {
            self.reporter.report(
                Diagnostic::new(COS_NONAMBIG, self.severity, ambiguity.to_string())
                    .with_component(ambiguity.first.clone())
                    .with_component(ambiguity.second.clone()),
            );
        }
        ambiguities.is_empty()
    }

    /// Fail with the first violation instead of reporting
    pub fn ensure_unambiguous(&self, model: &dyn ContentModel) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        match model.ambiguities().into_iter().next() {
            Some(ambiguity) => Err(Error::Ambiguous(ambiguity)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::QName;
    use crate::reporter::CollectingReporter;
    use crate::validators::models::validator::CmState;
    use crate::validators::particles::Occurs;
    use crate::validators::wildcards::{NamespaceConstraint, XsdAnyElement};

    fn element(name: &str, id: usize) -> ElementMapEntry {
        ElementMapEntry {
            term: Term::Element(QName::local(name)),
            particle_id: id,
            repeat: None,
        }
    }

    #[test]
    fn test_dfa_conflict_same_name() {
        let map = vec![element("a", 0), element("a", 1)];
        let transitions = vec![vec![Some(1), Some(2)], vec![None, None], vec![None, None]];
        let conflicts = dfa_conflicts(&map, &transitions, &[None, None, None]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].first_particle, 0);
        assert_eq!(conflicts[0].second_particle, 1);
    }

    #[test]
    fn test_dfa_no_conflict_in_different_states() {
        let map = vec![element("a", 0), element("a", 1)];
        let transitions = vec![vec![Some(1), None], vec![None, Some(2)], vec![None, None]];
        assert!(dfa_conflicts(&map, &transitions, &[None, None, None]).is_empty());
    }

    #[test]
    fn test_dfa_exact_counting_state() {
        let mut repeated = element("a", 0);
        repeated.repeat = Some(Occurs::new(2, Some(2)));
        let map = vec![repeated, element("a", 1)];
        let transitions = vec![vec![Some(1), None], vec![Some(1), Some(2)], vec![None, None]];
        let counting = vec![
            None,
            Some(Occurrence {
                min: 2,
                max: Some(2),
                elem_index: 0,
            }),
            None,
        ];
        assert!(dfa_conflicts(&map, &transitions, &counting).is_empty());
    }

    #[test]
    fn test_all_conflicts() {
        let any = Term::Wildcard(Arc::new(XsdAnyElement::new(
            NamespaceConstraint::Any,
            Occurs::once(),
        )));
        let members = vec![
            AllMember {
                term: Term::Element(QName::local("a")),
                particle_id: 0,
                occurs: Occurs::once(),
            },
            AllMember {
                term: any,
                particle_id: 1,
                occurs: Occurs::once(),
            },
        ];
        let conflicts = all_conflicts(&members);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].second, "(##any)");
    }

    #[derive(Debug)]
    struct Ambiguous;

    impl ContentModel for Ambiguous {
        fn start(&self) -> CmState {
            Default::default()
        }
        fn step<'a>(
            &'a self,
            _state: &mut CmState,
            _name: &QName,
        ) -> Option<&'a Term> {
            None
        }
        fn end(&self, _state: &CmState) -> bool {
            true
        }
        fn expected(&self, _state: &CmState) -> Vec<Term> {
            Vec::new()
        }
        fn ambiguities(&self) -> Vec<Ambiguity> {
            vec![ambiguity(
                (&Term::Element(QName::local("a")), 0),
                (&Term::Element(QName::local("a")), 1),
            )]
        }
    }

    #[test]
    fn test_checker_reports_with_severity() {
        let reporter = Arc::new(CollectingReporter::new());
        let settings = Settings {
            upa_severity: Severity::Warning,
            ..Settings::default()
        };
        let checker = UpaChecker::new(&settings, reporter.clone());
        assert!(!checker.check_model(&Ambiguous));

        let diagnostics = reporter.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].key, COS_NONAMBIG);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(matches!(
            checker.ensure_unambiguous(&Ambiguous),
            Err(Error::Ambiguous(_))
        ));
    }

    #[test]
    fn test_disabled_checker() {
        let reporter = Arc::new(CollectingReporter::new());
        let settings = Settings {
            upa_checking: false,
            ..Settings::default()
        };
        let checker = UpaChecker::new(&settings, reporter.clone());
        assert!(checker.check_model(&Ambiguous));
        assert!(checker.ensure_unambiguous(&Ambiguous).is_ok());
        assert!(reporter.diagnostics().is_empty());
    }
}
