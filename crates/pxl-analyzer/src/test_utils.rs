//! Registries and graph builders shared by the unit tests

use chrono::{DateTime, TimeZone, Utc};
use pxl_diagnostics::{CompilerErrorGroup, SourcePosition};
use pxl_ir::operator::MemorySource;
use pxl_ir::{IrGraph, NodeId, OperatorKind};
use pxl_types::{DataType, FunctionRegistry, MetadataRegistry, Relation, RelationMap};

use crate::rules::{DataTypeRule, OperatorRelationRule};
use crate::{CompilerState, RuleBatch};

/// `2023-11-14T22:13:20Z` in nanoseconds
pub(crate) const NOW_NS: i64 = 1_700_000_000_000_000_000;

pub(crate) fn pos(line: usize, column: usize) -> SourcePosition {
    SourcePosition::new(line, column)
}

pub(crate) fn cpu_relation() -> Relation {
    Relation::from_columns([
        ("count", DataType::Int64),
        ("cpu0", DataType::Float64),
        ("cpu1", DataType::Float64),
        ("upid", DataType::Uint128),
        ("time_", DataType::Time64ns),
        ("service", DataType::String),
    ])
}

pub(crate) fn http_relation() -> Relation {
    Relation::from_columns([
        ("time_", DataType::Time64ns),
        ("upid", DataType::Uint128),
        ("resp_latency_ns", DataType::Int64),
        ("remote_addr", DataType::String),
    ])
}

pub(crate) struct Fixture {
    pub relations: RelationMap,
    pub functions: FunctionRegistry,
    pub metadata: MetadataRegistry,
    pub time_now: DateTime<Utc>,
}

impl Fixture {
    pub fn new() -> Self {
        let mut relations = RelationMap::new();
        relations.insert("cpu", cpu_relation());
        relations.insert("http_events", http_relation());

        let mut functions = FunctionRegistry::new();
        for name in ["add", "subtract", "multiply"] {
            functions.register_scalar(name, &[DataType::Int64, DataType::Int64], DataType::Int64);
            functions.register_scalar(name, &[DataType::Float64, DataType::Float64], DataType::Float64);
        }
        functions.register_scalar("add", &[DataType::Time64ns, DataType::Duration64ns], DataType::Time64ns);
        functions.register_scalar("subtract", &[DataType::Time64ns, DataType::Duration64ns], DataType::Time64ns);
        for name in ["equal", "notEqual"] {
            for ty in [DataType::Int64, DataType::Float64, DataType::String, DataType::Boolean] {
                functions.register_scalar(name, &[ty, ty], DataType::Boolean);
            }
        }
        for name in ["lessThan", "greaterThan"] {
            functions.register_scalar(name, &[DataType::Int64, DataType::Int64], DataType::Boolean);
            functions.register_scalar(name, &[DataType::Float64, DataType::Float64], DataType::Boolean);
        }
        functions.register_scalar("logicalAnd", &[DataType::Boolean, DataType::Boolean], DataType::Boolean);
        functions.register_aggregate("mean", &[DataType::Float64], DataType::Float64, true);
        functions.register_aggregate("count", &[DataType::Int64], DataType::Int64, true);
        functions.register_aggregate("quantiles", &[DataType::Float64], DataType::String, false);

        let metadata = MetadataRegistry::standard();
        for key in metadata.keys() {
            if let Some(property) = metadata.lookup(key) {
                for conversion in &property.conversions {
                    functions.register_scalar(&conversion.function, &[DataType::Uint128], property.column_type);
                }
            }
        }
        functions.register_table_function(
            "GetAgentStatus",
            Relation::from_columns([("agent_id", DataType::String), ("asid", DataType::Int64)]),
        );

        Self {
            relations,
            functions,
            metadata,
            time_now: Utc.timestamp_nanos(NOW_NS),
        }
    }

    pub fn state(&self) -> CompilerState<'_> {
        CompilerState::new(&self.relations, &self.functions, &self.metadata).with_time_now(self.time_now)
    }
}

/// A memory source over `table` with no select list
pub(crate) fn memory_source(graph: &mut IrGraph, table: &str) -> NodeId {
    graph
        .add_operator(pos(1, 1), OperatorKind::MemorySource(MemorySource::new(table)), &[])
        .unwrap()
}

/// A memory source whose relation is already set
pub(crate) fn resolved_source(graph: &mut IrGraph, table: &str, relation: Relation) -> NodeId {
    let id = memory_source(graph, table);
    graph.set_relation(id, relation).unwrap();
    id
}

/// Run type and relation resolution to a fixed point
pub(crate) fn resolve_types(graph: &mut IrGraph, fx: &Fixture) -> Result<usize, CompilerErrorGroup> {
    RuleBatch::new("resolve", 100)
        .with_rule(DataTypeRule::new("_attr_"))
        .with_rule(OperatorRelationRule::new("_attr_"))
        .execute(graph, &fx.state())
}
