//! Graph-wide queries

use std::collections::VecDeque;

use crate::error::GraphError;
use crate::pattern::Pattern;
use crate::{IrGraph, NodeId};

impl IrGraph {
    /// Ids of nodes matching `pattern`, in creation order
    pub fn find_all<P: Pattern + ?Sized>(&self, pattern: &P) -> Vec<NodeId> {
        self.nodes()
            .filter(|node| pattern.matches(self, node))
            .map(|node| node.id())
            .collect()
    }

    /// First node in creation order matching `pattern`
    pub fn find_first<P: Pattern + ?Sized>(&self, pattern: &P) -> Option<NodeId> {
        self.nodes()
            .find(|node| pattern.matches(self, node))
            .map(|node| node.id())
    }

    pub fn count<P: Pattern + ?Sized>(&self, pattern: &P) -> usize {
        self.nodes().filter(|node| pattern.matches(self, node)).count()
    }

    /// Operators without parents
    pub fn sources(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|node| node.as_operator().is_some_and(|op| op.parents().is_empty()))
            .map(|node| node.id())
            .collect()
    }

    /// Operators without children
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|node| node.as_operator().is_some_and(|op| op.children().is_empty()))
            .map(|node| node.id())
            .collect()
    }

    /// Operators ordered so that every parent precedes its children, ties
    /// broken by creation order
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let operators = self.operator_ids();
        let mut in_degree = vec![0usize; self.id_bound()];
        for &id in &operators {
            in_degree[id.index()] = self.operator(id)?.parents().len();
        }

        let mut ready: VecDeque<NodeId> = operators
            .iter()
            .copied()
            .filter(|id| in_degree[id.index()] == 0)
            .collect();
        let mut order: Vec<NodeId> = Vec::with_capacity(operators.len());

        while let Some(id) = ready.pop_front() {
            order.push(id);
            let mut newly_ready = Vec::new();
            for &child in self.operator(id)?.children() {
                let degree = &mut in_degree[child.index()];
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    newly_ready.push(child);
                }
            }
            newly_ready.sort();
            ready.extend(newly_ready);
        }

        if let Some(stuck) = operators.into_iter().find(|id| !order.contains(id)) {
            let parent = self.operator(stuck)?.parents().first().copied().unwrap_or(stuck);
            return Err(GraphError::Cycle { parent, child: stuck });
        }
        Ok(order)
    }

    /// Every operator upstream of `op`
    pub fn ancestors(&self, op: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut out = Vec::new();
        let mut seen = vec![false; self.id_bound()];
        let mut queue: VecDeque<NodeId> = self.operator(op)?.parents().iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            out.push(id);
            queue.extend(self.operator(id)?.parents().iter().copied());
        }
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{MemorySink, MemorySource, OperatorKind};
    use crate::pattern::{memory_source, sink};
    use pretty_assertions::assert_eq;
    use pxl_diagnostics::SourcePosition;

    fn diamond() -> (IrGraph, [NodeId; 5]) {
        let mut g = IrGraph::new();
        let p = SourcePosition::default();
        let sink_op = OperatorKind::MemorySink(MemorySink { name: "out".into() });
        let a = g
            .add_operator(p, OperatorKind::MemorySource(MemorySource::new("a")), &[])
            .unwrap();
        let b = g
            .add_operator(p, OperatorKind::MemorySource(MemorySource::new("b")), &[])
            .unwrap();
        let u = g.add_operator(p, OperatorKind::Union, &[b, a]).unwrap();
        let s = g.add_operator(p, OperatorKind::Stream, &[a]).unwrap();
        let out = g.add_operator(p, sink_op, &[u]).unwrap();
        (g, [a, b, u, s, out])
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let (g, [a, b, u, s, out]) = diamond();
        assert_eq!(g.topological_order().unwrap(), vec![a, b, s, u, out]);
    }

    #[test]
    fn test_find_and_count() {
        let (g, [a, b, _, s, out]) = diamond();
        assert_eq!(g.find_all(&memory_source()), vec![a, b]);
        assert_eq!(g.find_first(&sink()), Some(out));
        assert_eq!(g.count(&sink()), 1);
        assert_eq!(g.sources(), vec![a, b]);
        assert_eq!(g.sinks(), vec![s, out]);
    }

    #[test]
    fn test_ancestors() {
        let (g, [a, b, u, _, out]) = diamond();
        assert_eq!(g.ancestors(out).unwrap(), vec![a, b, u]);
        assert!(g.ancestors(a).unwrap().is_empty());
    }
}
