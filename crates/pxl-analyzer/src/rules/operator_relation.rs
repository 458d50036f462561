//! Operator output relations

use pxl_diagnostics::{CompilerError, PXL0106, PXL0200, PXL0204, PXL0205, PXL0302, PXL0307, PXL0504};
use pxl_ir::operator::{BlockingAgg, Join, Map, MetadataResolver};
use pxl_ir::pattern::{Pattern, unresolved_ready_op};
use pxl_ir::{Expression, ExpressionKind, IrGraph, NodeId, OperatorKind};
use pxl_types::{DataType, Relation};

use super::{MetadataSource, metadata_source, parent_at, parent_relation};
use crate::{CompilerState, Rule, RuleResult};

/// Type of a resolved expression, `None` while it is unresolved
fn type_of(graph: &IrGraph, id: NodeId) -> Result<Option<DataType>, CompilerError> {
    Ok(graph.expression(id)?.data_type())
}

/// Append an output column; a name clash is reported at `at`
fn add_output(
    graph: &IrGraph,
    relation: &mut Relation,
    name: impl Into<String>,
    data_type: DataType,
    at: NodeId,
) -> Result<(), CompilerError> {
    relation
        .try_add_column(name, data_type)
        .map_err(|e| CompilerError::argument(PXL0307, e.to_string()).at(graph.position(at)))
}

/// Computes an operator's output relation once all of its parents have one
/// and every expression it owns is typed.
///
/// Sources are left to [`SourceRelationRule`](crate::rules::SourceRelationRule).
#[derive(Debug, Clone)]
pub struct OperatorRelationRule {
    prefix: String,
}

impl OperatorRelationRule {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn relation_of(&self, graph: &IrGraph, node: NodeId) -> Result<Option<Relation>, CompilerError> {
        let op = graph.operator(node)?;
        match op.kind() {
            OperatorKind::Map(map) => Self::map_relation(graph, node, map),
            OperatorKind::BlockingAgg(agg) => self.agg_relation(graph, node, agg),
            OperatorKind::Join(join) => Self::join_relation(graph, node, join),
            OperatorKind::Union => Self::union_relation(graph, node),
            OperatorKind::MetadataResolver(resolver) => self.resolver_relation(graph, node, resolver),
            OperatorKind::Filter(_)
            | OperatorKind::Limit(_)
            | OperatorKind::GroupBy(_)
            | OperatorKind::Rolling(_)
            | OperatorKind::Stream
            | OperatorKind::Range(_)
            | OperatorKind::MemorySink(_)
            | OperatorKind::RemoteSink(_) => Ok(parent_relation(graph, node, 0)?.cloned()),
            OperatorKind::MemorySource(_) | OperatorKind::UdtfSource(_) | OperatorKind::RemoteSource(_) => Ok(None),
        }
    }

    fn map_relation(graph: &IrGraph, node: NodeId, map: &Map) -> Result<Option<Relation>, CompilerError> {
        let Some(parent) = parent_relation(graph, node, 0)? else {
            return Ok(None);
        };
        let mut relation = Relation::new();
        if map.keep_input_columns {
            for (name, data_type) in parent.iter() {
                if !map.col_exprs.iter().any(|c| c.name == name) {
                    relation.add_column(name, data_type);
                }
            }
        }
        for col in &map.col_exprs {
            let Some(data_type) = type_of(graph, col.expr)? else {
                return Ok(None);
            };
            add_output(graph, &mut relation, col.name.as_str(), data_type, col.expr)?;
        }
        Ok(Some(relation))
    }

    /// Output name of a grouping expression
    fn group_name(&self, graph: &IrGraph, group: NodeId) -> Result<String, CompilerError> {
        let expr = graph.expression(group)?;
        match expr.kind() {
            ExpressionKind::Column(col) => Ok(col.name.clone()),
            ExpressionKind::Metadata(md) => match &md.property {
                Some(property) => Ok(property.prefixed_name(&self.prefix)),
                None => Ok(md.key.clone()),
            },
            other => Err(CompilerError::structural(
                PXL0504,
                format!("Groups must be columns, found {}.", other.node_type()),
            )
            .at(graph.position(group))),
        }
    }

    fn agg_relation(&self, graph: &IrGraph, node: NodeId, agg: &BlockingAgg) -> Result<Option<Relation>, CompilerError> {
        // Until the group-by is merged in, its groups still live on the parent
        let groups = if agg.groups.is_empty() {
            let parent = parent_at(graph, node, 0)?;
            match graph.operator(parent)?.kind() {
                OperatorKind::GroupBy(group_by) => group_by.groups.clone(),
                _ => Vec::new(),
            }
        } else {
            agg.groups.clone()
        };

        let mut relation = Relation::new();
        for group in groups {
            let Some(data_type) = type_of(graph, group)? else {
                return Ok(None);
            };
            add_output(graph, &mut relation, self.group_name(graph, group)?, data_type, group)?;
        }
        for col in &agg.aggregate_exprs {
            let expr = graph.expression(col.expr)?;
            if !expr.as_func().is_some_and(|f| f.is_aggregate()) {
                return Err(CompilerError::type_error(
                    PXL0205,
                    format!(
                        "Expected an aggregate function for '{}', got {}.",
                        col.name,
                        expr.kind().node_type()
                    ),
                )
                .at(graph.position(col.expr)));
            }
            let Some(data_type) = expr.data_type() else {
                return Ok(None);
            };
            add_output(graph, &mut relation, col.name.as_str(), data_type, col.expr)?;
        }
        Ok(Some(relation))
    }

    fn join_relation(graph: &IrGraph, node: NodeId, join: &Join) -> Result<Option<Relation>, CompilerError> {
        let (Some(left), Some(right)) = (parent_relation(graph, node, 0)?, parent_relation(graph, node, 1)?) else {
            return Ok(None);
        };
        if join.left_on.len() != join.right_on.len() {
            return Err(CompilerError::argument(
                PXL0302,
                format!(
                    "Join needs the same number of keys on both sides, got {} left and {} right.",
                    join.left_on.len(),
                    join.right_on.len()
                ),
            ));
        }
        for (&l, &r) in join.left_on.iter().zip(&join.right_on) {
            let (Some(lt), Some(rt)) = (type_of(graph, l)?, type_of(graph, r)?) else {
                return Ok(None);
            };
            if lt != rt {
                return Err(CompilerError::type_error(
                    PXL0200,
                    format!("Join keys have mismatched types {} and {}.", lt, rt),
                )
                .at(graph.position(l)));
            }
        }

        if join.output_columns.is_empty() {
            let mut relation = Relation::new();
            for (name, data_type) in left.iter() {
                let suffix = if right.has_column(name) { "_x" } else { "" };
                add_output(graph, &mut relation, format!("{}{}", name, suffix), data_type, node)?;
            }
            for (name, data_type) in right.iter() {
                let suffix = if left.has_column(name) { "_y" } else { "" };
                add_output(graph, &mut relation, format!("{}{}", name, suffix), data_type, node)?;
            }
            return Ok(Some(relation));
        }

        let mut relation = Relation::new();
        for col in &join.output_columns {
            let Some(data_type) = type_of(graph, col.expr)? else {
                return Ok(None);
            };
            add_output(graph, &mut relation, col.name.as_str(), data_type, col.expr)?;
        }
        Ok(Some(relation))
    }

    fn union_relation(graph: &IrGraph, node: NodeId) -> Result<Option<Relation>, CompilerError> {
        let mut relations = Vec::new();
        for idx in 0..graph.operator(node)?.parents().len() {
            match parent_relation(graph, node, idx)? {
                Some(relation) => relations.push(relation),
                None => return Ok(None),
            }
        }
        let Some((first, rest)) = relations.split_first() else {
            return Ok(None);
        };
        if let Some((idx, other)) = rest.iter().enumerate().find(|(_, r)| *r != first) {
            return Err(CompilerError::type_error(
                PXL0204,
                format!(
                    "Union inputs must share one schema. Input 0 is {} but input {} is {}.",
                    first,
                    idx + 1,
                    other
                ),
            ));
        }
        Ok(Some((*first).clone()))
    }

    fn resolver_relation(
        &self,
        graph: &IrGraph,
        node: NodeId,
        resolver: &MetadataResolver,
    ) -> Result<Option<Relation>, CompilerError> {
        let Some(parent) = parent_relation(graph, node, 0)? else {
            return Ok(None);
        };
        let mut relation = parent.clone();
        for property in resolver.properties.values() {
            match metadata_source(property, parent, &self.prefix) {
                Some(MetadataSource::Materialized) => {}
                Some(_) => relation.add_column(property.prefixed_name(&self.prefix), property.column_type),
                None => {
                    let keys: Vec<&str> = property.key_columns().collect();
                    return Err(CompilerError::lookup(
                        PXL0106,
                        format!(
                            "Cannot derive '{}' from parent columns. Needs one of [{}].",
                            property.name,
                            keys.join(", ")
                        ),
                    ));
                }
            }
        }
        Ok(Some(relation))
    }
}

impl Rule for OperatorRelationRule {
    fn name(&self) -> &'static str {
        "OperatorRelationRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        if !graph.node(node).is_some_and(|n| unresolved_ready_op().matches(graph, n)) {
            return Ok(false);
        }
        let slots = graph.operator(node)?.kind().expression_slots();
        if !slots
            .iter()
            .all(|&id| graph.expression(id).is_ok_and(Expression::is_resolved))
        {
            return Ok(false);
        }
        match self.relation_of(graph, node)? {
            Some(relation) => Ok(graph.set_relation(node, relation)?),
            None => Ok(false),
        }
    }
}
