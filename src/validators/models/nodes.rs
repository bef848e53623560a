//! Content model syntax tree
//!
//! Leaves are numbered positions of a Berry-Sethi position automaton. Every
//! node lazily computes and caches its first and last position sets; the
//! caches are dropped whenever positions are renumbered.

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::namespaces::QName;
use crate::validators::particles::Occurs;
use crate::validators::wildcards::{WildcardKind, XsdAnyElement};

use super::bitset::BitSet;

/// Input symbol class of a leaf: one element name or a wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Element particle, matched by qualified name
    Element(QName),
    /// Wildcard particle, matched by namespace
    Wildcard(Arc<XsdAnyElement>),
}

impl Term {
    /// Check whether a child element name is accepted by this term
    pub fn matches(&self, name: &QName) -> bool {
        match self {
            Self::Element(qname) => qname == name,
            Self::Wildcard(any) => any.is_matching(name),
        }
    }

    /// Check whether some element name is accepted by both terms
    pub fn overlaps(&self, other: &Term) -> bool {
        match (self, other) {
            (Self::Element(a), Self::Element(b)) => a == b,
            (Self::Element(name), Self::Wildcard(any))
            | (Self::Wildcard(any), Self::Element(name)) => any.is_matching(name),
            (Self::Wildcard(a), Self::Wildcard(b)) => a.overlaps(b),
        }
    }

    /// Wildcard kind, `None` for element terms
    pub fn wildcard_kind(&self) -> Option<WildcardKind> {
        match self {
            Self::Element(_) => None,
            Self::Wildcard(any) => Some(any.kind()),
        }
    }

    /// Element name, `None` for wildcards
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::Element(qname) => Some(qname),
            Self::Wildcard(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(qname) => write!(f, "{}", qname),
            Self::Wildcard(any) => write!(f, "{}", any),
        }
    }
}

/// A numbered leaf of the syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Element or wildcard matched at this position
    pub term: Term,
    /// Id of the schema particle; copies of one particle share it
    pub particle_id: usize,
    /// Automaton position
    pub position: usize,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `|`
    Choice,
    /// `,`
    Sequence,
}

/// Node variants
#[derive(Debug)]
pub enum NodeKind {
    /// Matches only the empty sequence; has no position
    Epsilon,
    /// Single element or wildcard
    Leaf(Leaf),
    /// Leaf with a `{min,max}` range folded in
    RepeatingLeaf {
        /// The repeated leaf
        leaf: Leaf,
        /// Allowed repetitions
        occurs: Occurs,
    },
    /// `?`, `*` or `+` applied to a subtree
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        child: Box<CmNode>,
    },
    /// Choice or sequence of two subtrees
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<CmNode>,
        /// Right operand
        right: Box<CmNode>,
    },
    /// Order-insensitive `all` group
    All {
        /// Group members
        children: Vec<CmNode>,
        /// Occurrence bounds of the group itself
        occurs: Occurs,
    },
}

/// Syntax tree node with cached position sets
#[derive(Debug)]
pub struct CmNode {
    kind: NodeKind,
    first_pos: OnceCell<BitSet>,
    last_pos: OnceCell<BitSet>,
}

impl CmNode {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            first_pos: OnceCell::new(),
            last_pos: OnceCell::new(),
        }
    }

    /// Node variant
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Consume the node, returning its variant
    pub fn into_kind(self) -> NodeKind {
        self.kind
    }

    /// Whether the subtree matches the empty sequence
    pub fn is_nullable(&self) -> bool {
        match &self.kind {
            NodeKind::Epsilon => true,
            NodeKind::Leaf(_) => false,
            NodeKind::RepeatingLeaf { occurs, .. } => occurs.min == 0,
            NodeKind::Unary { op, child } => match op {
                UnaryOp::ZeroOrOne | UnaryOp::ZeroOrMore => true,
                UnaryOp::OneOrMore => child.is_nullable(),
            },
            NodeKind::Binary { op, left, right } => match op {
                BinaryOp::Choice => left.is_nullable() || right.is_nullable(),
                BinaryOp::Sequence => left.is_nullable() && right.is_nullable(),
            },
            NodeKind::All { children, occurs } => {
                occurs.min == 0 || children.iter().all(|c| c.is_nullable())
            }
        }
    }

    /// Positions that can match the first child of the subtree
    ///
    /// `max_states` must stay the same until the positions are renumbered.
    pub fn first_pos(&self, max_states: usize) -> &BitSet {
        self.first_pos
            .get_or_init(|| self.calc_first_pos(max_states))
    }

    /// Positions that can match the last child of the subtree
    pub fn last_pos(&self, max_states: usize) -> &BitSet {
        self.last_pos.get_or_init(|| self.calc_last_pos(max_states))
    }

    fn calc_first_pos(&self, max_states: usize) -> BitSet {
        let mut set = BitSet::new(max_states);
        match &self.kind {
            NodeKind::Epsilon => {}
            NodeKind::Leaf(leaf) | NodeKind::RepeatingLeaf { leaf, .. } => set.set(leaf.position),
            NodeKind::Unary { child, .. } => set.set_to(child.first_pos(max_states)),
            NodeKind::Binary { op, left, right } => {
                set.set_to(left.first_pos(max_states));
                if *op == BinaryOp::Choice || left.is_nullable() {
                    set.union_with(right.first_pos(max_states));
                }
            }
            NodeKind::All { children, .. } => {
                for child in children {
                    set.union_with(child.first_pos(max_states));
                }
            }
        }
        set
    }

    fn calc_last_pos(&self, max_states: usize) -> BitSet {
        let mut set = BitSet::new(max_states);
        match &self.kind {
            NodeKind::Epsilon => {}
            NodeKind::Leaf(leaf) | NodeKind::RepeatingLeaf { leaf, .. } => set.set(leaf.position),
            NodeKind::Unary { child, .. } => set.set_to(child.last_pos(max_states)),
            NodeKind::Binary { op, left, right } => {
                set.set_to(right.last_pos(max_states));
                if *op == BinaryOp::Choice || right.is_nullable() {
                    set.union_with(left.last_pos(max_states));
                }
            }
            NodeKind::All { children, .. } => {
                for child in children {
                    set.union_with(child.last_pos(max_states));
                }
            }
        }
        set
    }

    /// Add the follow positions contributed by this subtree
    ///
    /// `follow` holds one set per position, each of capacity `max_states`.
    pub fn calc_follow_pos(&self, follow: &mut [BitSet], max_states: usize) {
        match &self.kind {
            NodeKind::Epsilon | NodeKind::Leaf(_) => {}
            NodeKind::RepeatingLeaf { leaf, occurs } => {
                if occurs.max != Some(1) {
                    follow[leaf.position].set(leaf.position);
                }
            }
            NodeKind::Unary { op, child } => {
                child.calc_follow_pos(follow, max_states);
                if *op != UnaryOp::ZeroOrOne {
                    add_follow(follow, child.last_pos(max_states), child.first_pos(max_states));
                }
            }
            NodeKind::Binary { op, left, right } => {
                left.calc_follow_pos(follow, max_states);
                right.calc_follow_pos(follow, max_states);
                if *op == BinaryOp::Sequence {
                    add_follow(follow, left.last_pos(max_states), right.first_pos(max_states));
                }
            }
            NodeKind::All { children, .. } => {
                // members may come in any order
                let first = self.first_pos(max_states);
                for child in children {
                    child.calc_follow_pos(follow, max_states);
                    add_follow(follow, child.last_pos(max_states), first);
                }
            }
        }
    }

    /// Renumber leaves left to right starting at `next`
    pub fn number_positions(&mut self, next: &mut usize) {
        self.first_pos = OnceCell::new();
        self.last_pos = OnceCell::new();
        match &mut self.kind {
            NodeKind::Epsilon => {}
            NodeKind::Leaf(leaf) | NodeKind::RepeatingLeaf { leaf, .. } => {
                leaf.position = *next;
                *next += 1;
            }
            NodeKind::Unary { child, .. } => child.number_positions(next),
            NodeKind::Binary { left, right, .. } => {
                left.number_positions(next);
                right.number_positions(next);
            }
            NodeKind::All { children, .. } => {
                for child in children {
                    child.number_positions(next);
                }
            }
        }
    }

    /// Leaves in left-to-right order, with the range of repeating leaves
    pub fn leaves(&self) -> Vec<(&Leaf, Option<Occurs>)> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<(&'a Leaf, Option<Occurs>)>) {
        match &self.kind {
            NodeKind::Epsilon => {}
            NodeKind::Leaf(leaf) => leaves.push((leaf, None)),
            NodeKind::RepeatingLeaf { leaf, occurs } => leaves.push((leaf, Some(*occurs))),
            NodeKind::Unary { child, .. } => child.collect_leaves(leaves),
            NodeKind::Binary { left, right, .. } => {
                left.collect_leaves(leaves);
                right.collect_leaves(leaves);
            }
            NodeKind::All { children, .. } => {
                for child in children {
                    child.collect_leaves(leaves);
                }
            }
        }
    }
}

fn add_follow(follow: &mut [BitSet], from: &BitSet, to: &BitSet) {
    for position in from {
        follow[position].union_with(to);
    }
}

impl fmt::Display for CmNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Epsilon => write!(f, "()"),
            NodeKind::Leaf(leaf) => write!(f, "{}", leaf.term),
            NodeKind::RepeatingLeaf { leaf, occurs } => write!(f, "{}{}", leaf.term, occurs),
            NodeKind::Unary { op, child } => {
                let symbol = match op {
                    UnaryOp::ZeroOrOne => '?',
                    UnaryOp::ZeroOrMore => '*',
                    UnaryOp::OneOrMore => '+',
                };
                write!(f, "{}{}", child, symbol)
            }
            NodeKind::Binary { op, left, right } => {
                let symbol = match op {
                    BinaryOp::Choice => '|',
                    BinaryOp::Sequence => ',',
                };
                write!(f, "({} {} {})", left, symbol, right)
            }
            NodeKind::All { children, .. } => {
                write!(f, "all(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
