//! Content model builder
//!
//! Turns a particle tree into a syntax tree and compiles it. Two shapes of
//! tree are produced:
//!
//! - the *compact* tree, used when every repeated particle is a single
//!   element or wildcard: a `{n,m}` range becomes one repeating leaf whose
//!   bounds are enforced by a counting state at runtime;
//! - the *expanded* tree, which spells ranges out as copies
//!   (`e{2,3}` becomes `e, e, e?`).
//!
//! When building for the UPA check the expanded tree approximates large
//! ranges (at most two copies), and the resulting model is flagged as
//! compacted so it is never used for validation.

use std::sync::Arc;

use crate::error::{ParseError, Result};
use crate::limits::Limits;
use crate::reporter::ErrorReporter;
use crate::settings::Settings;
use crate::validators::complex_types::XsdComplexType;
use crate::validators::groups::{GroupParticle, ModelType, XsdGroup};
use crate::validators::particles::Occurs;

use super::all::AllContentModel;
use super::dfa::DfaContentModel;
use super::factory::NodeFactory;
use super::nodes::{BinaryOp, CmNode, NodeKind, Term, UnaryOp};
use super::validator::{EmptyContentModel, SharedContentModel};

/// A numbered syntax tree ready for automaton construction
#[derive(Debug)]
pub struct ContentModelTree {
    /// Root node, `None` when the particle matches nothing but the empty sequence
    pub root: Option<CmNode>,
    /// Number of leaf positions
    pub leaf_count: usize,
    /// Whether occurrence ranges were approximated for the UPA check
    pub compacted_for_upa: bool,
}

/// Builds content models for complex types
#[derive(Debug)]
pub struct CmBuilder {
    factory: NodeFactory,
    limits: Limits,
    particle_count: usize,
}

impl CmBuilder {
    /// Create a builder with the given limits
    pub fn new(limits: &Limits, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            factory: NodeFactory::new(limits, reporter),
            limits: limits.clone(),
            particle_count: 0,
        }
    }

    /// Create a builder from settings
    pub fn from_settings(settings: &Settings, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self::new(&settings.limits, reporter)
    }

    /// The node factory
    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    /// Current limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Apply new limits, e.g. between schema compilations
    pub fn set_limits(&mut self, limits: &Limits) {
        self.limits = limits.clone();
        self.factory.reset(limits);
    }

    /// Content model of a complex type
    ///
    /// Types with simple or empty content have no model. Element-only and
    /// mixed types without a particle get the shared empty model.
    pub fn content_model(
        &mut self,
        ty: &XsdComplexType,
        for_upa: bool,
    ) -> Result<Option<SharedContentModel>> {
        if !ty.content_type.has_particles() {
            return Ok(None);
        }
        match &ty.particle {
            Some(particle) => self.build(particle, for_upa).map(Some),
            None => Ok(Some(EmptyContentModel::shared())),
        }
    }

    /// Compile a particle into a content model
    pub fn build(&mut self, particle: &GroupParticle, for_upa: bool) -> Result<SharedContentModel> {
        let result = self.compile(particle, for_upa);
        self.factory.reset_node_count();
        if let Err(err) = &result {
            log::debug!("content model compilation failed: {}", err);
        }
        result
    }

    /// Build the numbered syntax tree of a particle without compiling it
    pub fn build_tree(&mut self, particle: &GroupParticle, for_upa: bool) -> Result<ContentModelTree> {
        let result = self.syntax_tree(particle, for_upa);
        self.factory.reset_node_count();
        result
    }

    fn compile(&mut self, particle: &GroupParticle, for_upa: bool) -> Result<SharedContentModel> {
        if let GroupParticle::Group(group) = particle {
            if group.model == ModelType::All {
                return self.create_all_cm(group);
            }
        }
        let tree = self.syntax_tree(particle, for_upa)?;
        Ok(match tree.root {
            Some(root) => Arc::new(DfaContentModel::new(
                &root,
                tree.leaf_count,
                tree.compacted_for_upa,
            )),
            None => EmptyContentModel::shared(),
        })
    }

    fn syntax_tree(&mut self, particle: &GroupParticle, for_upa: bool) -> Result<ContentModelTree> {
        self.particle_count = 0;
        let (root, compacted_for_upa) = if self.use_repeating_leaf_nodes(particle) {
            (self.build_compact_syntax_tree(particle, 1)?, false)
        } else {
            match self.build_syntax_tree(particle, for_upa, 1)? {
                Some((node, compacted)) => (Some(node), compacted),
                None => (None, false),
            }
        };

        let mut leaf_count = 0;
        let mut root = root;
        if let Some(node) = root.as_mut() {
            node.number_positions(&mut leaf_count);
        }
        if compacted_for_upa {
            log::debug!("occurrence ranges approximated for the UPA check");
        }
        log::debug!(
            "content model tree: {} positions, {} nodes",
            leaf_count,
            self.factory.node_count()
        );
        Ok(ContentModelTree {
            root,
            leaf_count,
            compacted_for_upa,
        })
    }

    fn create_all_cm(&mut self, group: &XsdGroup) -> Result<SharedContentModel> {
        if checked_occurs(&group.occurs)?.is_empty() {
            return Ok(EmptyContentModel::shared());
        }
        self.particle_count = 0;
        let mut children = Vec::with_capacity(group.len());
        for particle in group.iter() {
            let term = particle_term(particle).ok_or_else(|| {
                ParseError::new("an 'all' group can only contain elements and wildcards")
            })?;
            let occurs = checked_occurs(&particle.occurs())?;
            if occurs.is_empty() {
                continue;
            }
            let id = self.next_particle_id();
            children.push(self.factory.repeating_leaf(term, id, occurs)?);
        }
        let node = self.factory.all(children, group.occurs)?;
        Ok(Arc::new(AllContentModel::new(node)))
    }

    /// Whether every repeated particle can be a repeating leaf
    ///
    /// A choice with a vanished branch must not hold a counted leaf: the
    /// state skipping the choice would equal the leaf's own loop state.
    fn use_repeating_leaf_nodes(&self, particle: &GroupParticle) -> bool {
        let GroupParticle::Group(group) = particle else {
            return true;
        };
        if !group.occurs.is_once() {
            return match group.particles.as_slice() {
                [] => true,
                [only] => only.is_term() && only.occurs().is_once(),
                _ => false,
            };
        }
        if group.model == ModelType::Choice
            && group.iter().any(vanishes)
            && group.iter().any(has_counted_leaf)
        {
            return false;
        }
        group.iter().all(|p| self.use_repeating_leaf_nodes(p))
    }

    fn build_compact_syntax_tree(
        &mut self,
        particle: &GroupParticle,
        depth: usize,
    ) -> Result<Option<CmNode>> {
        self.limits.check_model_depth(depth)?;
        let occurs = checked_occurs(&particle.occurs())?;
        if occurs.is_empty() {
            return Ok(None);
        }
        let group = match particle {
            GroupParticle::Group(group) => group,
            _ => return self.compact_leaf(particle, occurs).map(Some),
        };
        check_nested_all(group)?;

        if let [only] = group.particles.as_slice() {
            if !occurs.is_once() {
                return self.compact_leaf(only, occurs).map(Some);
            }
        }
        let mut children = Vec::with_capacity(group.len());
        for child in group.iter() {
            if let Some(node) = self.build_compact_syntax_tree(child, depth + 1)? {
                children.push(node);
            }
        }
        self.combine(group, children)
    }

    fn compact_leaf(&mut self, particle: &GroupParticle, occurs: Occurs) -> Result<CmNode> {
        let term = particle_term(particle)
            .ok_or_else(|| ParseError::new("repeated model group cannot be folded into a leaf"))?;
        let id = self.next_particle_id();
        match (occurs.min, occurs.max) {
            (1, Some(1)) => self.factory.leaf(term, id),
            (0, Some(1)) => {
                let leaf = self.factory.leaf(term, id)?;
                self.factory.unary(UnaryOp::ZeroOrOne, leaf)
            }
            (0, None) => {
                let leaf = self.factory.leaf(term, id)?;
                self.factory.unary(UnaryOp::ZeroOrMore, leaf)
            }
            (1, None) => {
                let leaf = self.factory.leaf(term, id)?;
                self.factory.unary(UnaryOp::OneOrMore, leaf)
            }
            _ => self.factory.repeating_leaf(term, id, occurs),
        }
    }

    fn build_syntax_tree(
        &mut self,
        particle: &GroupParticle,
        for_upa: bool,
        depth: usize,
    ) -> Result<Option<(CmNode, bool)>> {
        self.limits.check_model_depth(depth)?;
        let mut occurs = checked_occurs(&particle.occurs())?;
        if occurs.is_empty() {
            return Ok(None);
        }

        let mut compacted = false;
        if for_upa {
            if occurs.min > 1 {
                occurs = match occurs.max {
                    Some(max) if max == occurs.min => Occurs::new(2, Some(2)),
                    max => Occurs::new(1, max),
                };
                compacted = true;
            }
            if occurs.max.is_some_and(|max| max > 1) {
                occurs.max = Some(2);
                compacted = true;
            }
        }

        let node = match particle {
            GroupParticle::Group(group) => {
                check_nested_all(group)?;
                let mut children = Vec::with_capacity(group.len());
                for child in group.iter() {
                    if let Some((node, child_compacted)) =
                        self.build_syntax_tree(child, for_upa, depth + 1)?
                    {
                        compacted |= child_compacted;
                        children.push(node);
                    }
                }
                match self.combine(group, children)? {
                    Some(node) => node,
                    None => return Ok(None),
                }
            }
            _ => {
                let term = particle_term(particle)
                    .ok_or_else(|| ParseError::new("particle has no term"))?;
                let id = self.next_particle_id();
                self.factory.leaf(term, id)?
            }
        };

        let node = self.expand_content_model(node, occurs, for_upa && particle.is_term())?;
        Ok(Some((node, compacted)))
    }

    /// Join built children with the group's compositor
    fn combine(&mut self, group: &XsdGroup, children: Vec<CmNode>) -> Result<Option<CmNode>> {
        let built = children.len();
        let op = match group.model {
            ModelType::Choice => BinaryOp::Choice,
            ModelType::Sequence | ModelType::All => BinaryOp::Sequence,
        };
        let mut children = children.into_iter();
        let Some(mut node) = children.next() else {
            return Ok(None);
        };
        for child in children {
            node = self.factory.binary(op, node, child)?;
        }
        // a vanished branch of a choice matches the empty sequence
        if group.model == ModelType::Choice && built < group.len() {
            let epsilon = self.factory.epsilon()?;
            node = self.factory.binary(BinaryOp::Choice, node, epsilon)?;
        }
        Ok(Some(node))
    }

    fn expand_content_model(
        &mut self,
        node: CmNode,
        occurs: Occurs,
        approximate_leaf: bool,
    ) -> Result<CmNode> {
        match (occurs.min, occurs.max) {
            (1, Some(1)) => Ok(node),
            (0, Some(1)) => self.factory.unary(UnaryOp::ZeroOrOne, node),
            (0, None) => self.factory.unary(UnaryOp::ZeroOrMore, node),
            (1, None) => self.factory.unary(UnaryOp::OneOrMore, node),
            (min, _) if approximate_leaf => {
                let op = if min == 0 {
                    UnaryOp::ZeroOrMore
                } else {
                    UnaryOp::OneOrMore
                };
                self.factory.unary(op, node)
            }
            // e{n,} => e, ..., e, e+
            (min, None) => {
                let copy = self.copy_node(&node)?;
                let tail = self.factory.unary(UnaryOp::OneOrMore, copy)?;
                let head = self.multi_nodes(node, min - 1)?;
                self.factory.binary(BinaryOp::Sequence, head, tail)
            }
            // e{0,m} => e?, ..., e?
            (0, Some(max)) => {
                let optional = self.factory.unary(UnaryOp::ZeroOrOne, node)?;
                self.multi_nodes(optional, max)
            }
            (min, Some(max)) if min == max => self.multi_nodes(node, min),
            // e{n,m} => e, ..., e, e?, ..., e?
            (min, Some(max)) => {
                let copy = self.copy_node(&node)?;
                let optional = self.factory.unary(UnaryOp::ZeroOrOne, copy)?;
                let tail = self.multi_nodes(optional, max - min)?;
                let head = self.multi_nodes(node, min)?;
                self.factory.binary(BinaryOp::Sequence, head, tail)
            }
        }
    }

    /// Balanced sequence of `count` instances; the first is `node` itself
    fn multi_nodes(&mut self, node: CmNode, count: u32) -> Result<CmNode> {
        if count <= 1 {
            return Ok(node);
        }
        let half = count / 2;
        let right = self.multi_copies(&node, count - half)?;
        let left = self.multi_nodes(node, half)?;
        self.factory.binary(BinaryOp::Sequence, left, right)
    }

    /// Balanced sequence of `count` copies of `template`
    fn multi_copies(&mut self, template: &CmNode, count: u32) -> Result<CmNode> {
        if count <= 1 {
            return self.copy_node(template);
        }
        let half = count / 2;
        let left = self.multi_copies(template, half)?;
        let right = self.multi_copies(template, count - half)?;
        self.factory.binary(BinaryOp::Sequence, left, right)
    }

    /// Deep copy with fresh positions; particle ids are kept
    fn copy_node(&mut self, node: &CmNode) -> Result<CmNode> {
        match node.kind() {
            NodeKind::Epsilon => self.factory.epsilon(),
            NodeKind::Leaf(leaf) => self.factory.leaf(leaf.term.clone(), leaf.particle_id),
            NodeKind::RepeatingLeaf { leaf, occurs } => {
                self.factory
                    .repeating_leaf(leaf.term.clone(), leaf.particle_id, *occurs)
            }
            NodeKind::Unary { op, child } => {
                let child = self.copy_node(child)?;
                self.factory.unary(*op, child)
            }
            NodeKind::Binary { op, left, right } => {
                let left = self.copy_node(left)?;
                let right = self.copy_node(right)?;
                self.factory.binary(*op, left, right)
            }
            NodeKind::All { children, occurs } => {
                let children = children
                    .iter()
                    .map(|child| self.copy_node(child))
                    .collect::<Result<Vec<_>>>()?;
                self.factory.all(children, *occurs)
            }
        }
    }

    fn next_particle_id(&mut self) -> usize {
        let id = self.particle_count;
        self.particle_count += 1;
        id
    }
}

fn checked_occurs(occurs: &Occurs) -> Result<Occurs> {
    Occurs::checked(occurs.min, occurs.max)
}

/// Whether the particle builds to no node at all
fn vanishes(particle: &GroupParticle) -> bool {
    match particle {
        _ if particle.occurs().is_empty() => true,
        GroupParticle::Group(group) => group.iter().all(vanishes),
        _ => false,
    }
}

/// Whether the compact tree would hold a repeating leaf with `min > 0`
fn has_counted_leaf(particle: &GroupParticle) -> bool {
    let counted = |occurs: Occurs| {
        occurs.min > 0 && !matches!((occurs.min, occurs.max), (1, Some(1)) | (1, None))
    };
    match particle {
        GroupParticle::Group(group) => {
            (group.len() == 1 && counted(group.occurs)) || group.iter().any(has_counted_leaf)
        }
        _ => counted(particle.occurs()),
    }
}

fn particle_term(particle: &GroupParticle) -> Option<Term> {
    match particle {
        GroupParticle::Element(element) => Some(Term::Element(element.name.clone())),
        GroupParticle::Any(any) => Some(Term::Wildcard(Arc::clone(any))),
        GroupParticle::Group(_) => None,
    }
}

fn check_nested_all(group: &XsdGroup) -> Result<()> {
    if group.model == ModelType::All {
        return Err(ParseError::new(
            "an 'all' group must be the only model group of a content type",
        )
        .into());
    }
    Ok(())
}
