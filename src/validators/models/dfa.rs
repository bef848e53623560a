//! Deterministic automaton for sequence and choice content
//!
//! The automaton is built from a numbered syntax tree by subset construction
//! over follow positions. Position `N` (one past the last leaf) marks the
//! end of content: it follows every last position of the tree, so a state
//! accepts exactly when it contains it.
//!
//! Repeating leaves loop on themselves. A state whose transition on such a
//! leaf leads back to itself is a *counting state*; the runtime counter then
//! enforces the leaf's `{min,max}` bounds instead of expanding the range
//! into copies.

use indexmap::IndexSet;

use crate::error::Ambiguity;
use crate::namespaces::QName;
use crate::validators::particles::Occurs;

use super::bitset::BitSet;
use super::nodes::{CmNode, Term};
use super::upa;
use super::validator::{CmState, ContentModel};

/// One input symbol class of the automaton
///
/// Every schema particle gets one entry; copies made while expanding an
/// occurrence range share the entry of their original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMapEntry {
    /// Matched element or wildcard
    pub term: Term,
    /// Particle the entry stands for
    pub particle_id: usize,
    /// Range of a repeating leaf
    pub repeat: Option<Occurs>,
}

/// Bounds enforced by a counting state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// Minimum loops before leaving
    pub min: u32,
    /// Maximum loops, `None` if unbounded
    pub max: Option<u32>,
    /// Element map entry that loops
    pub elem_index: usize,
}

/// Content model validated by a DFA
#[derive(Debug)]
pub struct DfaContentModel {
    element_map: Vec<ElementMapEntry>,
    transitions: Vec<Vec<Option<usize>>>,
    final_states: Vec<bool>,
    counting_states: Vec<Option<Occurrence>>,
    leaf_count: usize,
    compacted_for_upa: bool,
}

impl DfaContentModel {
    /// Build the automaton for a tree whose leaves are numbered `0..leaf_count`
    pub fn new(root: &CmNode, leaf_count: usize, compacted_for_upa: bool) -> Self {
        let end_of_content = leaf_count;
        let max_states = leaf_count + 1;

        let mut follow = vec![BitSet::new(max_states); max_states];
        root.calc_follow_pos(&mut follow, max_states);
        for position in root.last_pos(max_states) {
            follow[position].set(end_of_content);
        }

        let mut element_map: Vec<ElementMapEntry> = Vec::new();
        let mut leaf_sorter: Vec<Vec<usize>> = Vec::new();
        for (leaf, repeat) in root.leaves() {
            let index = match element_map
                .iter()
                .position(|e| e.particle_id == leaf.particle_id)
            {
                Some(index) => index,
                None => {
                    element_map.push(ElementMapEntry {
                        term: leaf.term.clone(),
                        particle_id: leaf.particle_id,
                        repeat,
                    });
                    leaf_sorter.push(Vec::new());
                    element_map.len() - 1
                }
            };
            leaf_sorter[index].push(leaf.position);
        }

        let mut initial = root.first_pos(max_states).clone();
        if root.is_nullable() {
            initial.set(end_of_content);
        }

        let mut states: IndexSet<BitSet> = IndexSet::new();
        states.insert(initial);
        let mut transitions: Vec<Vec<Option<usize>>> = Vec::new();

        let mut current = 0;
        while let Some(state) = states.get_index(current).cloned() {
            let mut row = vec![None; element_map.len()];
            for (elem_index, positions) in leaf_sorter.iter().enumerate() {
                let mut next = BitSet::new(max_states);
                let mut reachable = false;
                for &position in positions {
                    if state.get(position) {
                        next.union_with(&follow[position]);
                        reachable = true;
                    }
                }
                if reachable {
                    let (target, _) = states.insert_full(next);
                    row[elem_index] = Some(target);
                }
            }
            log::trace!("state {} {} -> {:?}", current, state, row);
            transitions.push(row);
            current += 1;
        }

        let final_states = states.iter().map(|s| s.get(end_of_content)).collect();
        let counting_states = transitions
            .iter()
            .enumerate()
            .map(|(index, row)| {
                row.iter().enumerate().find_map(|(elem_index, target)| {
                    match (target, element_map[elem_index].repeat) {
                        (Some(target), Some(occurs)) if *target == index => Some(Occurrence {
                            min: occurs.min,
                            max: occurs.max,
                            elem_index,
                        }),
                        _ => None,
                    }
                })
            })
            .collect();

        log::debug!(
            "built content model automaton: {} positions, {} symbols, {} states",
            leaf_count,
            element_map.len(),
            transitions.len()
        );

        Self {
            element_map,
            transitions,
            final_states,
            counting_states,
            leaf_count,
            compacted_for_upa,
        }
    }

    /// Input symbol classes
    pub fn element_map(&self) -> &[ElementMapEntry] {
        &self.element_map
    }

    /// Transition table, one row per state and one column per element map entry
    pub fn transitions(&self) -> &[Vec<Option<usize>>] {
        &self.transitions
    }

    /// Counting bounds per state
    pub fn counting_states(&self) -> &[Option<Occurrence>] {
        &self.counting_states
    }

    /// Number of states
    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// Number of leaf positions
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Whether a state accepts end of content
    pub fn is_final(&self, state: usize) -> bool {
        self.final_states.get(state).copied().unwrap_or(false)
    }

    fn enter(&self, state: &mut CmState, next: usize, elem_index: usize) {
        state.current = next;
        if let Some(occurrence) = self.counting_states[next] {
            state.counter = u32::from(elem_index == occurrence.elem_index);
        }
    }

    fn find_alternative(&self, state: &mut CmState, name: &QName, after: usize) -> Option<usize> {
        let row = &self.transitions[state.current];
        let (elem_index, next) = (after + 1..self.element_map.len()).find_map(|i| {
            row[i]
                .filter(|_| self.element_map[i].term.matches(name))
                .map(|next| (i, next))
        })?;
        self.enter(state, next, elem_index);
        Some(elem_index)
    }
}

impl ContentModel for DfaContentModel {
    fn start(&self) -> CmState {
        CmState::default()
    }

    fn step<'a>(&'a self, state: &mut CmState, name: &QName) -> Option<&'a Term> {
        if state.failed {
            return None;
        }
        let row = &self.transitions[state.current];
        let matched = self
            .element_map
            .iter()
            .enumerate()
            .find_map(|(i, entry)| row[i].filter(|_| entry.term.matches(name)).map(|next| (i, next)));

        let Some((elem_index, next)) = matched else {
            state.failed = true;
            return None;
        };

        match self.counting_states[state.current] {
            Some(occurrence) if next == state.current => {
                state.counter += 1;
                if occurrence.max.is_some_and(|max| state.counter > max) {
                    return match self.find_alternative(state, name, elem_index) {
                        Some(i) => Some(&self.element_map[i].term),
                        None => {
                            state.failed = true;
                            None
                        }
                    };
                }
            }
            Some(occurrence) if state.counter < occurrence.min => {
                state.failed = true;
                return None;
            }
            _ => self.enter(state, next, elem_index),
        }
        Some(&self.element_map[elem_index].term)
    }

    fn end(&self, state: &CmState) -> bool {
        if state.failed || !self.is_final(state.current) {
            return false;
        }
        match self.counting_states[state.current] {
            Some(occurrence) => state.counter >= occurrence.min,
            None => true,
        }
    }

    fn expected(&self, state: &CmState) -> Vec<Term> {
        let occurrence = self.counting_states[state.current];
        self.transitions[state.current]
            .iter()
            .enumerate()
            .filter_map(|(i, target)| {
                let next = (*target)?;
                if let Some(occurrence) = occurrence {
                    if next == state.current {
                        if occurrence.max.is_some_and(|max| state.counter >= max) {
                            return None;
                        }
                    } else if state.counter < occurrence.min {
                        return None;
                    }
                }
                Some(self.element_map[i].term.clone())
            })
            .collect()
    }

    fn is_compacted_for_upa(&self) -> bool {
        self.compacted_for_upa
    }

    fn ambiguities(&self) -> Vec<Ambiguity> {
        upa::dfa_conflicts(&self.element_map, &self.transitions, &self.counting_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::models::nodes::{BinaryOp, Leaf, NodeKind, UnaryOp};
    use crate::validators::models::validator::ValidationResult;

    fn leaf(name: &str, id: usize) -> CmNode {
        CmNode::new(NodeKind::Leaf(Leaf {
            term: Term::Element(QName::local(name)),
            particle_id: id,
            position: 0,
        }))
    }

    fn repeating(name: &str, id: usize, occurs: Occurs) -> CmNode {
        CmNode::new(NodeKind::RepeatingLeaf {
            leaf: Leaf {
                term: Term::Element(QName::local(name)),
                particle_id: id,
                position: 0,
            },
            occurs,
        })
    }

    fn seq(left: CmNode, right: CmNode) -> CmNode {
        CmNode::new(NodeKind::Binary {
            op: BinaryOp::Sequence,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn star(child: CmNode) -> CmNode {
        CmNode::new(NodeKind::Unary {
            op: UnaryOp::ZeroOrMore,
            child: Box::new(child),
        })
    }

    fn compile(mut root: CmNode) -> DfaContentModel {
        let mut count = 0;
        root.number_positions(&mut count);
        DfaContentModel::new(&root, count, false)
    }

    fn names(list: &[&str]) -> Vec<QName> {
        list.iter().map(|n| QName::local(*n)).collect()
    }

    #[test]
    fn test_sequence() {
        let model = compile(seq(leaf("a", 0), leaf("b", 1)));
        assert_eq!(model.leaf_count(), 2);
        assert_eq!(model.state_count(), 3);
        assert_eq!(model.validate(&names(&["a", "b"])), ValidationResult::Valid);
        assert_eq!(model.validate(&names(&["a"])), ValidationResult::Incomplete(1));
        assert_eq!(model.validate(&names(&["b"])), ValidationResult::Invalid(0));
        assert_eq!(model.validate(&names(&["a", "b", "b"])), ValidationResult::Invalid(2));
    }

    #[test]
    fn test_star_accepts_empty() {
        let model = compile(star(seq(leaf("a", 0), leaf("b", 1))));
        assert!(model.is_final(0));
        assert_eq!(model.validate(&[]), ValidationResult::Valid);
        assert_eq!(
            model.validate(&names(&["a", "b", "a", "b"])),
            ValidationResult::Valid
        );
    }

    #[test]
    fn test_counting_state() {
        let model = compile(repeating("a", 0, Occurs::new(2, Some(4))));
        assert!(model.counting_states().iter().any(|c| c.is_some()));
        assert_eq!(model.validate(&names(&["a"])), ValidationResult::Incomplete(1));
        assert_eq!(model.validate(&names(&["a", "a"])), ValidationResult::Valid);
        assert_eq!(model.validate(&names(&["a"; 4])), ValidationResult::Valid);
        assert_eq!(model.validate(&names(&["a"; 5])), ValidationResult::Invalid(4));
    }

    #[test]
    fn test_leaving_counting_state_early() {
        let model = compile(seq(
            repeating("a", 0, Occurs::new(2, Some(3))),
            leaf("b", 1),
        ));
        assert_eq!(model.validate(&names(&["a", "b"])), ValidationResult::Invalid(1));
        assert_eq!(model.validate(&names(&["a", "a", "b"])), ValidationResult::Valid);
    }

    #[test]
    fn test_expected() {
        let model = compile(seq(
            repeating("a", 0, Occurs::new(2, Some(2))),
            leaf("b", 1),
        ));
        let mut state = model.start();
        assert_eq!(model.expected(&state), vec![Term::Element(QName::local("a"))]);

        model.step(&mut state, &QName::local("a")).unwrap();
        // one more `a` required before `b`
        assert_eq!(model.expected(&state), vec![Term::Element(QName::local("a"))]);

        model.step(&mut state, &QName::local("a")).unwrap();
        assert_eq!(model.expected(&state), vec![Term::Element(QName::local("b"))]);
    }

    #[test]
    fn test_failed_state_is_sticky() {
        let model = compile(leaf("a", 0));
        let mut state = model.start();
        assert!(model.step(&mut state, &QName::local("x")).is_none());
        assert!(state.is_failed());
        assert!(model.step(&mut state, &QName::local("a")).is_none());
        assert!(!model.end(&state));
    }
}
