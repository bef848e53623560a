//! Node factory with a per-model node budget

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::reporter::{Diagnostic, ErrorReporter, Severity, MAX_OCCUR_LIMIT};
use crate::validators::particles::Occurs;

use super::nodes::{BinaryOp, CmNode, Leaf, NodeKind, Term, UnaryOp};

/// Creates syntax tree nodes and counts them against the node limit.
///
/// Leaves receive increasing positions as they are created; the builder
/// renumbers them left to right once the tree is complete.
#[derive(Debug)]
pub struct NodeFactory {
    max_node_limit: Option<usize>,
    node_count: usize,
    next_position: usize,
    reporter: Arc<dyn ErrorReporter>,
}

impl NodeFactory {
    /// Create a factory for the given limits
    pub fn new(limits: &Limits, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            max_node_limit: limits.max_node_limit(),
            node_count: 0,
            next_position: 0,
            reporter,
        }
    }

    /// Apply new limits and start counting from zero
    pub fn reset(&mut self, limits: &Limits) {
        self.max_node_limit = limits.max_node_limit();
        self.reset_node_count();
    }

    /// Start counting from zero
    pub fn reset_node_count(&mut self) {
        self.node_count = 0;
        self.next_position = 0;
    }

    /// Nodes created since the last reset
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Node budget, `None` when unlimited
    pub fn max_node_limit(&self) -> Option<usize> {
        self.max_node_limit
    }

    /// The reporter diagnostics are sent to
    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.reporter
    }

    /// Empty-sequence node, used for a vanished choice branch
    pub fn epsilon(&mut self) -> Result<CmNode> {
        self.node_count_check()?;
        Ok(CmNode::new(NodeKind::Epsilon))
    }

    /// Leaf matching one element or wildcard
    pub fn leaf(&mut self, term: Term, particle_id: usize) -> Result<CmNode> {
        self.node_count_check()?;
        let leaf = self.new_leaf(term, particle_id);
        Ok(CmNode::new(NodeKind::Leaf(leaf)))
    }

    /// Leaf repeated within `occurs`
    pub fn repeating_leaf(
        &mut self,
        term: Term,
        particle_id: usize,
        occurs: Occurs,
    ) -> Result<CmNode> {
        self.node_count_check()?;
        let leaf = self.new_leaf(term, particle_id);
        Ok(CmNode::new(NodeKind::RepeatingLeaf { leaf, occurs }))
    }

    /// `?`, `*` or `+` node
    pub fn unary(&mut self, op: UnaryOp, child: CmNode) -> Result<CmNode> {
        self.node_count_check()?;
        Ok(CmNode::new(NodeKind::Unary {
            op,
            child: Box::new(child),
        }))
    }

    /// Choice or sequence node
    pub fn binary(&mut self, op: BinaryOp, left: CmNode, right: CmNode) -> Result<CmNode> {
        self.node_count_check()?;
        Ok(CmNode::new(NodeKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// `all` group node
    pub fn all(&mut self, children: Vec<CmNode>, occurs: Occurs) -> Result<CmNode> {
        self.node_count_check()?;
        Ok(CmNode::new(NodeKind::All { children, occurs }))
    }

    fn new_leaf(&mut self, term: Term, particle_id: usize) -> Leaf {
        let position = self.next_position;
        self.next_position += 1;
        Leaf {
            term,
            particle_id,
            position,
        }
    }

    /// Count one more node against the budget
    ///
    /// The budget is inclusive: a limit of `L` admits exactly `L` nodes and
    /// the node numbered `L + 1` fails. Counting after the comparison, as a
    /// post-increment check would, lets one extra node through.
    fn node_count_check(&mut self) -> Result<()> {
        self.node_count += 1;
        match self.max_node_limit {
            Some(limit) if self.node_count > limit => {
                log::warn!(
                    "content model node limit of {} exceeded, compilation aborted",
                    limit
                );
                self.reporter.report(
                    Diagnostic::new(
                        MAX_OCCUR_LIMIT,
                        Severity::FatalError,
                        format!(
                            "Current configuration of the parser doesn't allow the expansion \
                             of a content model for a complex type to contain more than {} nodes",
                            limit
                        ),
                    )
                    .with_component(limit.to_string()),
                );
                self.reset_node_count();
                Err(Error::LimitExceeded(format!(
                    "content model exceeds the limit of {} nodes",
                    limit
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::QName;
    use crate::reporter::CollectingReporter;

    fn term(name: &str) -> Term {
        Term::Element(QName::local(name))
    }

    #[test]
    fn test_counts_nodes_and_positions() {
        let mut factory = NodeFactory::new(&Limits::default(), Arc::new(CollectingReporter::new()));
        let a = factory.leaf(term("a"), 0).unwrap();
        let b = factory.leaf(term("b"), 1).unwrap();
        let seq = factory.binary(BinaryOp::Sequence, a, b).unwrap();
        assert_eq!(factory.node_count(), 3);

        match seq.kind() {
            NodeKind::Binary { left, right, .. } => {
                assert!(matches!(left.kind(), NodeKind::Leaf(l) if l.position == 0));
                assert!(matches!(right.kind(), NodeKind::Leaf(l) if l.position == 1));
            }
            other => panic!("unexpected node {:?}", other),
        }

        // epsilon nodes count but take no position
        let epsilon = factory.epsilon().unwrap();
        assert!(epsilon.is_nullable());
        assert_eq!(factory.node_count(), 4);
        let c = factory.leaf(term("c"), 2).unwrap();
        assert!(matches!(c.kind(), NodeKind::Leaf(l) if l.position == 2));
    }

    #[test]
    fn test_limit_exceeded_reports_and_resets() {
        let reporter = Arc::new(CollectingReporter::new());
        let limits = Limits {
            max_occur_node_limit: Some(2),
            ..Limits::default()
        };
        let mut factory = NodeFactory::new(&limits, reporter.clone());

        factory.leaf(term("a"), 0).unwrap();
        factory.leaf(term("b"), 1).unwrap();
        let err = factory.leaf(term("c"), 2).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
        assert_eq!(factory.node_count(), 0);

        let diagnostics = reporter.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].key, MAX_OCCUR_LIMIT);
        assert_eq!(diagnostics[0].severity, Severity::FatalError);

        // counter was reset, so the next model starts fresh
        assert!(factory.leaf(term("d"), 0).is_ok());
    }

    #[test]
    fn test_unlimited() {
        let mut factory = NodeFactory::new(&Limits::unlimited(), Arc::new(CollectingReporter::new()));
        for i in 0..10_000 {
            factory.leaf(term("a"), i).unwrap();
        }
        assert_eq!(factory.node_count(), 10_000);
        assert_eq!(factory.max_node_limit(), None);
    }

    #[test]
    fn test_reset_applies_new_limits() {
        let mut factory = NodeFactory::new(&Limits::default(), Arc::new(CollectingReporter::new()));
        factory.leaf(term("a"), 0).unwrap();
        factory.reset(&Limits::strict());
        assert_eq!(factory.node_count(), 0);
        assert_eq!(factory.max_node_limit(), Some(500));
    }
}
