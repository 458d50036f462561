//! Ordered execution of rule batches

use log::debug;
use pxl_diagnostics::CompilerErrorGroup;
use pxl_ir::IrGraph;

use crate::{CompilerState, RuleBatch};

/// Runs batches strictly in order and stops at the first one that fails,
/// so no batch ever sees a graph an earlier one rejected.
#[derive(Debug, Default)]
pub struct RuleExecutor {
    batches: Vec<RuleBatch>,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, batch: RuleBatch) -> Self {
        self.batches.push(batch);
        self
    }

    pub fn add_batch(&mut self, batch: RuleBatch) {
        self.batches.push(batch);
    }

    pub fn batches(&self) -> &[RuleBatch] {
        &self.batches
    }

    /// Run every batch against the graph, editing it in place
    pub fn execute(&self, graph: &mut IrGraph, state: &CompilerState<'_>) -> Result<(), CompilerErrorGroup> {
        for batch in &self.batches {
            debug!("running rule batch '{}'", batch.name());
            match batch.execute(graph, state) {
                Ok(passes) => debug!("rule batch '{}' converged after {} pass(es)", batch.name(), passes),
                Err(errors) => {
                    debug!("rule batch '{}' failed with {} error(s)", batch.name(), errors.len());
                    return Err(errors);
                }
            }
        }
        Ok(())
    }
}
