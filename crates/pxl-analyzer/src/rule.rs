//! The rule abstraction
//!
//! A rule pairs a pattern with a local edit. The batch drives every rule
//! over every node; the rule decides whether the node is its business and
//! reports whether it changed the graph.

use log::trace;
use pxl_diagnostics::{CompilerError, CompilerErrorGroup};
use pxl_ir::{IrGraph, NodeId};

use crate::CompilerState;

/// Result type returned by [`Rule::apply`]
pub type RuleResult = Result<bool, CompilerError>;

/// One graph rewrite or check
pub trait Rule {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Apply to one node. Returns whether the graph changed.
    ///
    /// Nodes the rule does not care about must return `Ok(false)`.
    fn apply(&self, graph: &mut IrGraph, node: NodeId, state: &CompilerState<'_>) -> RuleResult;

    /// Apply to every live node in creation order, including nodes created
    /// while the pass is running.
    ///
    /// Errors are recorded with the position of the node that triggered them
    /// and do not stop the pass.
    fn execute(&self, graph: &mut IrGraph, state: &CompilerState<'_>, errors: &mut CompilerErrorGroup) -> bool {
        let mut changed = false;
        let mut index = 0;
        while index < graph.id_bound() {
            if let Some(id) = graph.id_at(index) {
                match self.apply(graph, id, state) {
                    Ok(true) => {
                        trace!("{} changed node {}", self.name(), id);
                        changed = true;
                    }
                    Ok(false) => {}
                    Err(err) => errors.push(err.at(graph.position(id))),
                }
            }
            index += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;
    use pxl_diagnostics::{PXL0100, SourcePosition};

    /// Appends one literal the first time it sees each original literal and
    /// errors on negative ones
    struct Echo;

    impl Rule for Echo {
        fn name(&self) -> &'static str {
            "Echo"
        }

        fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
            let Some(value) = graph
                .expression(node)
                .ok()
                .and_then(|e| e.as_data())
                .and_then(|v| v.as_i64())
            else {
                return Ok(false);
            };
            if value < 0 {
                return Err(CompilerError::lookup(PXL0100, "negative"));
            }
            if value >= 100 {
                return Ok(false);
            }
            graph.add_int(SourcePosition::new(9, 9), value + 100);
            Ok(true)
        }
    }

    #[test]
    fn test_execute_visits_appended_nodes_and_collects_errors() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        g.add_int(SourcePosition::new(1, 1), 1);
        g.add_int(SourcePosition::new(2, 4), -1);
        g.add_int(SourcePosition::new(3, 1), 2);

        let mut errors = CompilerErrorGroup::new();
        assert!(Echo.execute(&mut g, &fx.state(), &mut errors));

        assert_eq!(g.len(), 5);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].position, Some(SourcePosition::new(2, 4)));
    }
}
