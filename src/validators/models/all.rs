//! Order-insensitive model of an `all` group

use crate::error::Ambiguity;
use crate::namespaces::QName;
use crate::validators::particles::Occurs;

use super::nodes::{CmNode, NodeKind, Term};
use super::upa;
use super::validator::{CmState, ContentModel};

/// A member of an `all` group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllMember {
    /// Matched element or wildcard
    pub term: Term,
    /// Particle id
    pub particle_id: usize,
    /// Allowed occurrences of the member
    pub occurs: Occurs,
}

/// Content model of an `all` group
///
/// Children may come in any order. Each one is counted against the first
/// member that matches it and still has room.
#[derive(Debug)]
pub struct AllContentModel {
    members: Vec<AllMember>,
    nullable: bool,
}

impl AllContentModel {
    /// Build from an `all` node whose children are (repeating) leaves
    pub fn new(node: CmNode) -> Self {
        let nullable = node.is_nullable();
        let children = match node.into_kind() {
            NodeKind::All { children, .. } => children,
            other => vec![CmNode::new(other)],
        };
        let members = children
            .into_iter()
            .filter_map(|child| match child.into_kind() {
                NodeKind::Leaf(leaf) => Some(AllMember {
                    term: leaf.term,
                    particle_id: leaf.particle_id,
                    occurs: Occurs::once(),
                }),
                NodeKind::RepeatingLeaf { leaf, occurs } => Some(AllMember {
                    term: leaf.term,
                    particle_id: leaf.particle_id,
                    occurs,
                }),
                _ => None,
            })
            .collect::<Vec<_>>();
        log::debug!("built all-group content model with {} members", members.len());
        Self { members, nullable }
    }

    /// Group members in declaration order
    pub fn members(&self) -> &[AllMember] {
        &self.members
    }

    /// Whether the group as a whole may be absent
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl ContentModel for AllContentModel {
    fn start(&self) -> CmState {
        CmState::with_counts(self.members.len())
    }

    fn step<'a>(&'a self, state: &mut CmState, name: &QName) -> Option<&'a Term> {
        if state.failed {
            return None;
        }
        let found = self
            .members
            .iter()
            .enumerate()
            .find(|(i, m)| m.term.matches(name) && !m.occurs.is_over(state.counts[*i]));
        match found {
            Some((i, member)) => {
                state.counts[i] += 1;
                state.current += 1;
                Some(&member.term)
            }
            None => {
                state.failed = true;
                None
            }
        }
    }

    fn end(&self, state: &CmState) -> bool {
        if state.failed {
            return false;
        }
        if self.nullable && state.counts.iter().all(|c| *c == 0) {
            return true;
        }
        self.members
            .iter()
            .zip(&state.counts)
            .all(|(member, count)| !member.occurs.is_missing(*count))
    }

    fn expected(&self, state: &CmState) -> Vec<Term> {
        self.members
            .iter()
            .zip(&state.counts)
            .filter(|(member, count)| !member.occurs.is_over(**count))
            .map(|(member, _)| member.term.clone())
            .collect()
    }

    fn ambiguities(&self) -> Vec<Ambiguity> {
        upa::all_conflicts(&self.members)
    }
}
