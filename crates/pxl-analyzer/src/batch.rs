//! Rule batches: a named rule list driven to a fixed point

use log::{trace, warn};
use pxl_diagnostics::{CompilerError, CompilerErrorGroup};
use pxl_ir::IrGraph;

use crate::{CompilerState, Rule};

/// A named, ordered list of rules run until a pass changes nothing.
///
/// The pass count is bounded by `max_iterations`. Reaching the bound while
/// the graph is still changing fails the batch even when no rule reported a
/// problem.
pub struct RuleBatch {
    name: String,
    max_iterations: usize,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleBatch {
    pub fn new(name: impl Into<String>, max_iterations: usize) -> Self {
        Self {
            name: name.into(),
            max_iterations,
            rules: Vec::new(),
        }
    }

    /// Append a rule; rules run in the order they were added
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Rule names in execution order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run passes until one makes no change. Returns the number of passes.
    ///
    /// A pass always runs every rule before the batch looks at the
    /// diagnostics it produced, so one failing run reports as much as it can.
    pub fn execute(&self, graph: &mut IrGraph, state: &CompilerState<'_>) -> Result<usize, CompilerErrorGroup> {
        let mut passes = 0;
        loop {
            if passes >= self.max_iterations {
                warn!(
                    "rule batch '{}' still changing after {} passes",
                    self.name, self.max_iterations
                );
                return Err(CompilerError::convergence(self.name.as_str(), self.max_iterations).into());
            }
            passes += 1;
            trace!("rule batch '{}' pass {}", self.name, passes);

            let mut errors = CompilerErrorGroup::new();
            let mut changed = false;
            for rule in &self.rules {
                changed |= rule.execute(graph, state, &mut errors);
            }

            if !errors.is_empty() {
                return Err(errors);
            }
            if !changed {
                return Ok(passes);
            }
        }
    }
}

impl std::fmt::Debug for RuleBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBatch")
            .field("name", &self.name)
            .field("max_iterations", &self.max_iterations)
            .field("rules", &self.rule_names())
            .finish()
    }
}
