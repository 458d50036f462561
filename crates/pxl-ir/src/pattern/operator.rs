//! Operator patterns: relation readiness, aggregation stage and
//! per-kind payload checks

use super::{Pattern, Value};
use crate::operator::{JoinType, OperatorKind, SinkDestination};
use crate::{IrGraph, IrNode};

/// Source operator whose relation is (or is not yet) set
#[derive(Debug, Clone, Copy)]
pub struct SourceRelationMatch {
    resolved: bool,
}

impl Pattern for SourceRelationMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.as_operator()
            .is_some_and(|op| op.is_source() && op.is_relation_init() == self.resolved)
    }
}

pub fn resolved_source() -> SourceRelationMatch {
    SourceRelationMatch { resolved: true }
}

pub fn unresolved_source() -> SourceRelationMatch {
    SourceRelationMatch { resolved: false }
}

/// Operator with an unset relation all of whose parents have theirs
#[derive(Debug, Clone, Copy)]
pub struct UnresolvedReadyMatch<P> {
    inner: P,
}

impl<P: Pattern> Pattern for UnresolvedReadyMatch<P> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(op) = node.as_operator() else {
            return false;
        };
        !op.is_relation_init()
            && !op.parents().is_empty()
            && op
                .parents()
                .iter()
                .all(|&p| graph.operator(p).is_ok_and(|parent| parent.is_relation_init()))
            && self.inner.matches(graph, node)
    }
}

/// Any operator ready to have its relation computed
pub fn unresolved_ready_op() -> UnresolvedReadyMatch<Value> {
    UnresolvedReadyMatch { inner: Value }
}

/// Operator matching `inner` that is ready to have its relation computed
pub fn unresolved_ready<P: Pattern>(inner: P) -> UnresolvedReadyMatch<P> {
    UnresolvedReadyMatch { inner }
}

/// Blocking aggregate in one distributed stage
#[derive(Debug, Clone, Copy)]
pub struct AggStageMatch {
    partial: bool,
    finalize: bool,
}

impl Pattern for AggStageMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        matches!(
            node.operator_kind(),
            Some(OperatorKind::BlockingAgg(agg))
                if agg.partial_agg == self.partial && agg.finalize_results == self.finalize
        )
    }
}

/// Aggregate that only computes partial state
pub fn partial_agg() -> AggStageMatch {
    AggStageMatch {
        partial: true,
        finalize: false,
    }
}

/// Aggregate that only merges partial state into results
pub fn finalize_agg() -> AggStageMatch {
    AggStageMatch {
        partial: false,
        finalize: true,
    }
}

/// Aggregate doing both stages at once
pub fn full_agg() -> AggStageMatch {
    AggStageMatch {
        partial: true,
        finalize: true,
    }
}

/// Filter whose predicate matches
#[derive(Debug, Clone, Copy)]
pub struct FilterMatch<P> {
    predicate: P,
}

impl<P: Pattern> Pattern for FilterMatch<P> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(OperatorKind::Filter(filter)) = node.operator_kind() else {
            return false;
        };
        graph
            .node(filter.predicate)
            .is_some_and(|pred| self.predicate.matches(graph, pred))
    }
}

pub fn filter_with<P: Pattern>(predicate: P) -> FilterMatch<P> {
    FilterMatch { predicate }
}

/// Operator consuming its whole input before emitting
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingOperatorMatch;

impl Pattern for BlockingOperatorMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.as_operator().is_some_and(|op| op.is_blocking())
    }
}

pub fn blocking_operator() -> BlockingOperatorMatch {
    BlockingOperatorMatch
}

/// Join by normalized type or output-column state
#[derive(Debug, Clone, Copy)]
pub enum JoinMatch {
    /// Normalized to this type
    OfType(JoinType),
    /// Declared type not normalized yet
    Unnormalized,
    /// Output columns not set yet
    UnsetOutputColumns,
}

impl Pattern for JoinMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        let Some(OperatorKind::Join(join)) = node.operator_kind() else {
            return false;
        };
        match self {
            Self::OfType(ty) => join.join_type == Some(*ty),
            Self::Unnormalized => join.join_type.is_none(),
            Self::UnsetOutputColumns => join.output_columns.is_empty(),
        }
    }
}

pub fn join_of_type(join_type: JoinType) -> JoinMatch {
    JoinMatch::OfType(join_type)
}

pub fn right_join() -> JoinMatch {
    JoinMatch::OfType(JoinType::Right)
}

pub fn unnormalized_join() -> JoinMatch {
    JoinMatch::Unnormalized
}

pub fn unset_output_columns_join() -> JoinMatch {
    JoinMatch::UnsetOutputColumns
}

/// Limit with a specific row count
#[derive(Debug, Clone, Copy)]
pub struct LimitValueMatch(i64);

impl Pattern for LimitValueMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        matches!(node.operator_kind(), Some(OperatorKind::Limit(l)) if l.limit == self.0)
    }
}

pub fn limit_value(limit: i64) -> LimitValueMatch {
    LimitValueMatch(limit)
}

/// Memory source reading a specific table
#[derive(Debug, Clone)]
pub struct MemorySourceTableMatch(String);

impl Pattern for MemorySourceTableMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        matches!(node.operator_kind(), Some(OperatorKind::MemorySource(src)) if src.table == self.0)
    }
}

pub fn memory_source_table(table: impl Into<String>) -> MemorySourceTableMatch {
    MemorySourceTableMatch(table.into())
}

/// Remote sink by destination
#[derive(Debug, Clone, Copy)]
pub enum RemoteSinkMatch {
    /// Internal stream with this id
    Destination(i64),
    /// Any internal stream
    Internal,
    /// Any named result
    External,
}

impl Pattern for RemoteSinkMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        let Some(OperatorKind::RemoteSink(sink)) = node.operator_kind() else {
            return false;
        };
        match (self, &sink.destination) {
            (Self::Destination(expected), SinkDestination::Internal(id)) => id == expected,
            (Self::Internal, SinkDestination::Internal(_)) => true,
            (Self::External, SinkDestination::External(_)) => true,
            _ => false,
        }
    }
}

pub fn remote_sink_to(destination_id: i64) -> RemoteSinkMatch {
    RemoteSinkMatch::Destination(destination_id)
}

pub fn internal_remote_sink() -> RemoteSinkMatch {
    RemoteSinkMatch::Internal
}

pub fn external_remote_sink() -> RemoteSinkMatch {
    RemoteSinkMatch::External
}
