//! Expression data types

use pxl_diagnostics::{CompilerError, PXL0102, PXL0104, PXL0202};
use pxl_ir::pattern::{Pattern, unresolved_expression};
use pxl_ir::{ExpressionKind, IrGraph, NodeId};
use pxl_types::{DataType, RegistryError};

use super::parent_relation;
use crate::{CompilerState, Rule, RuleResult};

/// Resolves expression types bottom-up.
///
/// Literals are typed on creation. A column takes its type from the
/// relation of the parent it refers to, a metadata key from the reserved
/// column it materializes into, and a function from the registry once all
/// of its arguments are typed. Anything whose inputs are not ready yet is
/// left for a later pass.
#[derive(Debug, Clone)]
pub struct DataTypeRule {
    prefix: String,
}

impl DataTypeRule {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Look up `name` in parent `idx` of `owner`; `None` while that parent
    /// has no relation
    fn column_in_parent(
        graph: &IrGraph,
        owner: NodeId,
        idx: usize,
        name: &str,
    ) -> Result<Option<(usize, DataType)>, CompilerError> {
        let Some(relation) = parent_relation(graph, owner, idx)? else {
            return Ok(None);
        };
        match (relation.column_index(name), relation.column_type(name)) {
            (Some(index), Some(data_type)) => Ok(Some((index, data_type))),
            _ => Err(CompilerError::lookup(
                PXL0102,
                format!("Column '{}' not found in parent dataframe", name),
            )),
        }
    }
}

impl Rule for DataTypeRule {
    fn name(&self) -> &'static str {
        "DataTypeRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, state: &CompilerState<'_>) -> RuleResult {
        if !graph.node(node).is_some_and(|n| unresolved_expression().matches(graph, n)) {
            return Ok(false);
        }
        let expr = graph.expression(node)?;
        let owner = expr.owner();

        let resolved = match expr.kind() {
            ExpressionKind::Column(col) => {
                let Some(owner) = owner else {
                    return Ok(false);
                };
                match Self::column_in_parent(graph, owner, col.parent_op_idx, &col.name)? {
                    Some((index, data_type)) => {
                        if let ExpressionKind::Column(col) = graph.expression_mut(node)?.kind_mut() {
                            col.index = Some(index);
                        }
                        data_type
                    }
                    None => return Ok(false),
                }
            }
            ExpressionKind::Metadata(md) => {
                let (Some(owner), Some(property)) = (owner, md.property.as_ref()) else {
                    return Ok(false);
                };
                let column = property.prefixed_name(&self.prefix);
                match Self::column_in_parent(graph, owner, md.parent_op_idx, &column)? {
                    Some((_, data_type)) => data_type,
                    None => return Ok(false),
                }
            }
            ExpressionKind::MetadataLiteral(lit) => match graph.expression(lit.literal)?.data_type() {
                Some(data_type) => data_type,
                None => return Ok(false),
            },
            ExpressionKind::Func(func) => {
                let arg_types: Option<Vec<DataType>> = func
                    .args
                    .iter()
                    .map(|&arg| graph.expression(arg).ok().and_then(|e| e.data_type()))
                    .collect();
                let Some(arg_types) = arg_types else {
                    return Ok(false);
                };
                let signature = state.functions.lookup(&func.name, &arg_types).map_err(|e| match e {
                    RegistryError::NoMatchingOverload { .. } => CompilerError::type_error(PXL0202, e.to_string()),
                    _ => CompilerError::lookup(PXL0104, e.to_string()),
                })?;
                let (data_type, kind, supports_partial) =
                    (signature.return_type, signature.kind, signature.supports_partial);
                if let ExpressionKind::Func(func) = graph.expression_mut(node)?.kind_mut() {
                    func.function_kind = Some(kind);
                    func.supports_partial = supports_partial;
                }
                data_type
            }
            ExpressionKind::Data(_) | ExpressionKind::Lambda(_) | ExpressionKind::List(_) | ExpressionKind::Tuple(_) => {
                return Ok(false);
            }
        };
        Ok(graph.resolve_expression(node, resolved)?)
    }
}
