//! Common test utilities for end-to-end analysis
//!
//! - registries matching a small slice of the standard schemas
//! - a query builder producing graphs the way the front end does: every
//!   expression is created before the operator that owns it

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pxl::CompilerState;
use pxl::diagnostics::SourcePosition;
use pxl::ir::operator::{BlockingAgg, ColumnExpression, Filter, GroupBy, Join, Map, MemorySink, MemorySource, Range};
use pxl::ir::{IrGraph, NodeId, Opcode, OperatorKind};
use pxl::types::{DataType, FunctionRegistry, MetadataRegistry, Relation, RelationMap};

/// Reference time of every test compilation
pub const NOW_NS: i64 = 1_700_000_000_000_000_000;

pub fn pos(line: usize, column: usize) -> SourcePosition {
    SourcePosition::new(line, column)
}

pub struct Context {
    pub relations: RelationMap,
    pub functions: FunctionRegistry,
    pub metadata: MetadataRegistry,
    pub now: DateTime<Utc>,
}

impl Context {
    pub fn new() -> Self {
        let mut relations = RelationMap::new();
        relations.insert(
            "http_events",
            Relation::from_columns([
                ("time_", DataType::Time64ns),
                ("upid", DataType::Uint128),
                ("req_path", DataType::String),
                ("resp_status", DataType::Int64),
                ("latency_ns", DataType::Int64),
            ]),
        );
        relations.insert(
            "process_stats",
            Relation::from_columns([
                ("time_", DataType::Time64ns),
                ("upid", DataType::Uint128),
                ("cpu_ns", DataType::Int64),
            ]),
        );

        let mut functions = FunctionRegistry::new();
        for name in ["add", "subtract", "multiply"] {
            functions.register_scalar(name, &[DataType::Int64, DataType::Int64], DataType::Int64);
        }
        functions.register_scalar("add", &[DataType::Time64ns, DataType::Duration64ns], DataType::Time64ns);
        functions.register_scalar("subtract", &[DataType::Time64ns, DataType::Duration64ns], DataType::Time64ns);
        functions.register_scalar("equal", &[DataType::String, DataType::String], DataType::Boolean);
        functions.register_scalar("equal", &[DataType::Int64, DataType::Int64], DataType::Boolean);
        functions.register_scalar("greaterThan", &[DataType::Int64, DataType::Int64], DataType::Boolean);
        functions.register_aggregate("mean", &[DataType::Int64], DataType::Float64, true);
        functions.register_aggregate("count", &[DataType::Int64], DataType::Int64, true);
        functions.register_aggregate("count", &[DataType::String], DataType::Int64, true);
        functions.register_scalar("upid_to_pod_name", &[DataType::Uint128], DataType::String);
        functions.register_scalar("upid_to_service_name", &[DataType::Uint128], DataType::String);

        Self {
            relations,
            functions,
            metadata: MetadataRegistry::standard(),
            now: Utc.timestamp_nanos(NOW_NS),
        }
    }

    pub fn state(&self) -> CompilerState<'_> {
        CompilerState::new(&self.relations, &self.functions, &self.metadata).with_time_now(self.now)
    }
}

/// Builds a query graph line by line
#[derive(Default)]
pub struct Query {
    pub graph: IrGraph,
    line: usize,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next source line
    pub fn line(&mut self) -> usize {
        self.line += 1;
        self.line
    }

    pub fn source(&mut self, table: &str) -> NodeId {
        let line = self.line();
        self.graph
            .add_operator(pos(line, 1), OperatorKind::MemorySource(MemorySource::new(table)), &[])
            .unwrap()
    }

    pub fn column(&mut self, name: &str, column: usize) -> NodeId {
        self.graph.add_column(pos(self.line, column), name, 0)
    }

    /// Column of the parent at `parent_op_idx`, for operators with several inputs
    pub fn column_of(&mut self, name: &str, column: usize, parent_op_idx: usize) -> NodeId {
        self.graph.add_column(pos(self.line, column), name, parent_op_idx)
    }

    pub fn filter(&mut self, parent: NodeId, predicate: NodeId) -> NodeId {
        self.graph
            .add_operator(pos(self.line, 1), OperatorKind::Filter(Filter { predicate }), &[parent])
            .unwrap()
    }

    pub fn map(&mut self, parent: NodeId, col_exprs: Vec<ColumnExpression>) -> NodeId {
        self.graph
            .add_operator(
                pos(self.line, 1),
                OperatorKind::Map(Map {
                    col_exprs,
                    keep_input_columns: true,
                }),
                &[parent],
            )
            .unwrap()
    }

    pub fn group_by(&mut self, parent: NodeId, groups: Vec<NodeId>) -> NodeId {
        self.graph
            .add_operator(pos(self.line, 1), OperatorKind::GroupBy(GroupBy { groups }), &[parent])
            .unwrap()
    }

    pub fn agg(&mut self, parent: NodeId, aggregates: Vec<ColumnExpression>) -> NodeId {
        self.graph
            .add_operator(
                pos(self.line, 1),
                OperatorKind::BlockingAgg(BlockingAgg::new(aggregates)),
                &[parent],
            )
            .unwrap()
    }

    pub fn join(
        &mut self,
        left: NodeId,
        right: NodeId,
        how: &str,
        on: (NodeId, NodeId),
        output_columns: Vec<ColumnExpression>,
    ) -> NodeId {
        self.graph
            .add_operator(
                pos(self.line, 1),
                OperatorKind::Join(Join {
                    declared_type: how.into(),
                    join_type: None,
                    left_on: vec![on.0],
                    right_on: vec![on.1],
                    output_columns,
                }),
                &[left, right],
            )
            .unwrap()
    }

    pub fn range(&mut self, parent: NodeId, start: NodeId, stop: NodeId) -> NodeId {
        self.graph
            .add_operator(pos(self.line, 1), OperatorKind::Range(Range { start, stop }), &[parent])
            .unwrap()
    }

    /// `now() - minutes(n)` starting at `column`
    pub fn minutes_ago(&mut self, n: i64, column: usize) -> NodeId {
        let p = pos(self.line, column);
        let now = self.graph.add_func(p, "now", &[]).unwrap();
        let count = self.graph.add_int(p, n);
        let minutes = self.graph.add_func(p, "minutes", &[count]).unwrap();
        self.graph.add_opcode_func(p, Opcode::Subtract, &[now, minutes]).unwrap()
    }

    pub fn sink(&mut self, parent: NodeId, name: &str) -> NodeId {
        let line = self.line();
        self.graph
            .add_operator(
                pos(line, 1),
                OperatorKind::MemorySink(MemorySink { name: name.into() }),
                &[parent],
            )
            .unwrap()
    }
}
