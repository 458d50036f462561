//! Shared fixtures for the analyzer integration tests
//!
//! - registries with a small process-metrics schema
//! - a fixed reference time so folded bounds are reproducible
//! - graph builders for the shapes the property tests generate

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pxl_analyzer::CompilerState;
use pxl_diagnostics::SourcePosition;
use pxl_ir::operator::{ColumnExpression, Map, MemorySink, MemorySource};
use pxl_ir::{IrGraph, NodeId, Opcode, OperatorKind};
use pxl_types::{DataType, FunctionRegistry, MetadataRegistry, Relation, RelationMap};

pub const NOW_NS: i64 = 1_700_000_000_000_000_000;

pub fn pos(line: usize, column: usize) -> SourcePosition {
    SourcePosition::new(line, column)
}

pub struct Registries {
    pub relations: RelationMap,
    pub functions: FunctionRegistry,
    pub metadata: MetadataRegistry,
    pub now: DateTime<Utc>,
}

impl Registries {
    pub fn new() -> Self {
        let mut relations = RelationMap::new();
        relations.insert(
            "process_stats",
            Relation::from_columns([
                ("time_", DataType::Time64ns),
                ("upid", DataType::Uint128),
                ("cpu_ns", DataType::Int64),
                ("rss_bytes", DataType::Int64),
            ]),
        );

        let mut functions = FunctionRegistry::new();
        for name in ["add", "subtract", "multiply"] {
            functions.register_scalar(name, &[DataType::Int64, DataType::Int64], DataType::Int64);
        }
        functions.register_scalar("greaterThan", &[DataType::Int64, DataType::Int64], DataType::Boolean);
        functions.register_aggregate("mean", &[DataType::Int64], DataType::Float64, true);
        functions.register_scalar("upid_to_pod_name", &[DataType::Uint128], DataType::String);

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

pub fn source(graph: &mut IrGraph, table: &str) -> NodeId {
    graph
        .add_operator(pos(1, 1), OperatorKind::MemorySource(MemorySource::new(table)), &[])
        .unwrap()
}

pub fn sink(graph: &mut IrGraph, parent: NodeId) -> NodeId {
    graph
        .add_operator(
            pos(99, 1),
            OperatorKind::MemorySink(MemorySink { name: "out".into() }),
            &[parent],
        )
        .unwrap()
}

/// `name = cpu_ns + step`, keeping every input column
pub fn increment_map(graph: &mut IrGraph, line: usize, name: &str, step: i64) -> OperatorKind {
    let col = graph.add_column(pos(line, 10), "cpu_ns", 0);
    let lit = graph.add_int(pos(line, 20), step);
    let sum = graph.add_opcode_func(pos(line, 10), Opcode::Add, &[col, lit]).unwrap();
    OperatorKind::Map(Map {
        col_exprs: vec![ColumnExpression::new(name, sum)],
        keep_input_columns: true,
    })
}

/// `source -> map_1 -> ... -> map_n -> sink` where every map is created
/// after its child, so creation order runs against the data flow
pub fn reversed_chain(graph: &mut IrGraph, relation: Relation, maps: usize) -> (NodeId, NodeId) {
    let src = source(graph, "process_stats");
    graph.set_relation(src, relation).unwrap();
    let out = sink(graph, src);
    let mut first = out;
    for i in 0..maps {
        let kind = increment_map(graph, i + 2, &format!("c{}", i), i as i64);
        first = graph.insert_between(pos(i + 2, 1), kind, src, first).unwrap();
    }
    (src, out)
}
