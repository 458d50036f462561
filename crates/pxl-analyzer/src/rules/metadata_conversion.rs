//! Lowering of MetadataResolver markers into executable Maps

use pxl_diagnostics::{CompilerError, PXL0104, PXL0106, PXL0505, SourcePosition};
use pxl_ir::operator::{ColumnExpression, Map};
use pxl_ir::{ExpressionKind, IrGraph, IrNode, NodeId, OperatorKind};
use pxl_types::{MetadataProperty, Relation};

use super::{MetadataSource, metadata_source, parent_at};
use crate::{CompilerState, Rule, RuleResult};

/// Replaces each MetadataResolver with a Map that passes its input through
/// and computes every metadata column it promised, either by copying a
/// column of the same name or by calling the property's conversion
/// function on a key column.
#[derive(Debug, Clone)]
pub struct MetadataResolverConversionRule {
    prefix: String,
}

impl MetadataResolverConversionRule {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Resolved reference to column `name` of the map's only parent
    fn input_column(
        graph: &mut IrGraph,
        position: SourcePosition,
        input: &Relation,
        name: &str,
    ) -> Result<NodeId, CompilerError> {
        let (Some(index), Some(data_type)) = (input.column_index(name), input.column_type(name)) else {
            return Err(CompilerError::structural(
                PXL0505,
                format!("Column '{}' disappeared from the metadata input", name),
            ));
        };
        let id = graph.add_column(position, name, 0);
        if let ExpressionKind::Column(col) = graph.expression_mut(id)?.kind_mut() {
            col.index = Some(index);
        }
        graph.resolve_expression(id, data_type)?;
        Ok(id)
    }

    fn property_expression(
        &self,
        graph: &mut IrGraph,
        position: SourcePosition,
        input: &Relation,
        property: &MetadataProperty,
        state: &CompilerState<'_>,
    ) -> Result<Option<NodeId>, CompilerError> {
        match metadata_source(property, input, &self.prefix) {
            Some(MetadataSource::Materialized) => Ok(None),
            Some(MetadataSource::Copy(name)) => Self::input_column(graph, position, input, name).map(Some),
            Some(MetadataSource::Convert(conversion)) => {
                let key = Self::input_column(graph, position, input, &conversion.key_column)?;
                let key_type = graph.expression(key)?.data_type();
                let signature = state
                    .functions
                    .lookup(&conversion.function, key_type.as_slice())
                    .map_err(|e| CompilerError::lookup(PXL0104, e.to_string()))?;
                let (return_type, kind) = (signature.return_type, signature.kind);

                let func = graph.add_func(position, conversion.function.as_str(), &[key])?;
                if let ExpressionKind::Func(f) = graph.expression_mut(func)?.kind_mut() {
                    f.function_kind = Some(kind);
                }
                graph.resolve_expression(func, return_type)?;
                Ok(Some(func))
            }
            None => Err(CompilerError::lookup(
                PXL0106,
                format!("Cannot derive '{}' from parent columns.", property.name),
            )),
        }
    }
}

impl Rule for MetadataResolverConversionRule {
    fn name(&self) -> &'static str {
        "MetadataResolverConversionRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, state: &CompilerState<'_>) -> RuleResult {
        let Some(op) = graph.node(node).and_then(IrNode::as_operator) else {
            return Ok(false);
        };
        let OperatorKind::MetadataResolver(resolver) = op.kind() else {
            return Ok(false);
        };
        let properties: Vec<MetadataProperty> = resolver.properties.values().cloned().collect();
        let Some(output) = op.relation().cloned() else {
            return Err(CompilerError::structural(
                PXL0505,
                "MetadataResolver reached conversion without a relation",
            ));
        };
        let parent = parent_at(graph, node, 0)?;
        let Some(input) = graph.operator(parent)?.relation().cloned() else {
            return Err(CompilerError::structural(
                PXL0505,
                "MetadataResolver input reached conversion without a relation",
            ));
        };
        let position = graph.position(node);

        let mut col_exprs = Vec::with_capacity(output.len());
        for (name, _) in input.iter() {
            let col = Self::input_column(graph, position, &input, name)?;
            col_exprs.push(ColumnExpression::new(name, col));
        }
        for property in &properties {
            if let Some(expr) = self.property_expression(graph, position, &input, property, state)? {
                col_exprs.push(ColumnExpression::new(property.prefixed_name(&self.prefix), expr));
            }
        }

        let map = graph.add_operator_with_relation(
            position,
            OperatorKind::Map(Map {
                col_exprs,
                keep_input_columns: false,
            }),
            &[parent],
            output,
        )?;
        graph.redirect_children(node, map)?;
        graph.delete_node(node)?;
        Ok(true)
    }
}
