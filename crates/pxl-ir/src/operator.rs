//! Operator nodes

use indexmap::IndexMap;
use pxl_types::{MetadataProperty, Relation};
use smallvec::SmallVec;
use std::fmt;

use crate::node::{IrNodeType, NodeId};

/// Named output expression of a map, aggregate or join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnExpression {
    pub name: String,
    pub expr: NodeId,
}

impl ColumnExpression {
    pub fn new(name: impl Into<String>, expr: NodeId) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

/// Supported join kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Outer,
    /// Only exists until normalized into a left join with swapped inputs
    Right,
}

impl JoinType {
    /// Parse the join type as written in a query
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "inner" => Some(Self::Inner),
            "left" => Some(Self::Left),
            "outer" => Some(Self::Outer),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Left => "left",
            Self::Outer => "outer",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a remote sink sends its rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SinkDestination {
    /// Stream consumed by another fragment of the same query
    Internal(i64),
    /// Named result returned to the client
    External(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    pub table: String,
    /// Columns to read, all when unset
    pub select: Option<Vec<String>>,
    pub time_start: Option<i64>,
    pub time_stop: Option<i64>,
    /// Position of each output column in the table, set with the relation
    pub column_index_map: Option<Vec<usize>>,
}

impl MemorySource {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn has_time_bounds(&self) -> bool {
        self.time_start.is_some() || self.time_stop.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdtfSource {
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub source_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    pub col_exprs: Vec<ColumnExpression>,
    /// Output starts with every input column not overwritten by `col_exprs`
    pub keep_input_columns: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub predicate: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockingAgg {
    /// Grouping columns, taken over from a preceding group-by
    pub groups: Vec<NodeId>,
    pub aggregate_exprs: Vec<ColumnExpression>,
    pub partial_agg: bool,
    pub finalize_results: bool,
}

impl BlockingAgg {
    pub fn new(aggregate_exprs: Vec<ColumnExpression>) -> Self {
        Self {
            groups: Vec::new(),
            aggregate_exprs,
            partial_agg: true,
            finalize_results: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Join type as written
    pub declared_type: String,
    /// Normalized join type
    pub join_type: Option<JoinType>,
    pub left_on: Vec<NodeId>,
    pub right_on: Vec<NodeId>,
    pub output_columns: Vec<ColumnExpression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupBy {
    pub groups: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rolling {
    pub window_column: NodeId,
    pub window_size: NodeId,
    pub groups: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: NodeId,
    pub stop: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataResolver {
    /// Properties to materialize, by canonical key
    pub properties: IndexMap<String, MetadataProperty>,
}

impl MetadataResolver {
    /// Record a property. Returns whether it was new.
    pub fn add_property(&mut self, property: MetadataProperty) -> bool {
        if self.properties.contains_key(&property.name) {
            return false;
        }
        self.properties.insert(property.name.clone(), property);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySink {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSink {
    pub destination: SinkDestination,
}

/// Operator variants
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorKind {
    MemorySource(MemorySource),
    UdtfSource(UdtfSource),
    RemoteSource(RemoteSource),
    Map(Map),
    Filter(Filter),
    BlockingAgg(BlockingAgg),
    Join(Join),
    Union,
    Limit(Limit),
    GroupBy(GroupBy),
    Rolling(Rolling),
    Stream,
    Range(Range),
    MetadataResolver(MetadataResolver),
    MemorySink(MemorySink),
    RemoteSink(RemoteSink),
}

impl OperatorKind {
    pub fn node_type(&self) -> IrNodeType {
        match self {
            Self::MemorySource(_) => IrNodeType::MemorySource,
            Self::UdtfSource(_) => IrNodeType::UdtfSource,
            Self::RemoteSource(_) => IrNodeType::RemoteSource,
            Self::Map(_) => IrNodeType::Map,
            Self::Filter(_) => IrNodeType::Filter,
            Self::BlockingAgg(_) => IrNodeType::BlockingAgg,
            Self::Join(_) => IrNodeType::Join,
            Self::Union => IrNodeType::Union,
            Self::Limit(_) => IrNodeType::Limit,
            Self::GroupBy(_) => IrNodeType::GroupBy,
            Self::Rolling(_) => IrNodeType::Rolling,
            Self::Stream => IrNodeType::Stream,
            Self::Range(_) => IrNodeType::Range,
            Self::MetadataResolver(_) => IrNodeType::MetadataResolver,
            Self::MemorySink(_) => IrNodeType::MemorySink,
            Self::RemoteSink(_) => IrNodeType::RemoteSink,
        }
    }

    /// Roots of the expression trees this operator owns
    pub fn expression_slots(&self) -> Vec<NodeId> {
        let mut slots = Vec::new();
        self.visit_slots(|id| slots.push(id));
        slots
    }

    fn visit_slots(&self, mut f: impl FnMut(NodeId)) {
        match self {
            Self::Map(map) => map.col_exprs.iter().for_each(|c| f(c.expr)),
            Self::Filter(filter) => f(filter.predicate),
            Self::BlockingAgg(agg) => {
                agg.groups.iter().copied().for_each(&mut f);
                agg.aggregate_exprs.iter().for_each(|c| f(c.expr));
            }
            Self::Join(join) => {
                join.left_on.iter().copied().for_each(&mut f);
                join.right_on.iter().copied().for_each(&mut f);
                join.output_columns.iter().for_each(|c| f(c.expr));
            }
            Self::GroupBy(group_by) => group_by.groups.iter().copied().for_each(f),
            Self::Rolling(rolling) => {
                f(rolling.window_column);
                f(rolling.window_size);
                rolling.groups.iter().copied().for_each(f);
            }
            Self::Range(range) => {
                f(range.start);
                f(range.stop);
            }
            Self::MemorySource(_)
            | Self::UdtfSource(_)
            | Self::RemoteSource(_)
            | Self::Union
            | Self::Limit(_)
            | Self::Stream
            | Self::MetadataResolver(_)
            | Self::MemorySink(_)
            | Self::RemoteSink(_) => {}
        }
    }

    pub(crate) fn for_each_slot_mut(&mut self, mut f: impl FnMut(&mut NodeId)) {
        match self {
            Self::Map(map) => map.col_exprs.iter_mut().for_each(|c| f(&mut c.expr)),
            Self::Filter(filter) => f(&mut filter.predicate),
            Self::BlockingAgg(agg) => {
                agg.groups.iter_mut().for_each(&mut f);
                agg.aggregate_exprs.iter_mut().for_each(|c| f(&mut c.expr));
            }
            Self::Join(join) => {
                join.left_on.iter_mut().for_each(&mut f);
                join.right_on.iter_mut().for_each(&mut f);
                join.output_columns.iter_mut().for_each(|c| f(&mut c.expr));
            }
            Self::GroupBy(group_by) => group_by.groups.iter_mut().for_each(f),
            Self::Rolling(rolling) => {
                f(&mut rolling.window_column);
                f(&mut rolling.window_size);
                rolling.groups.iter_mut().for_each(f);
            }
            Self::Range(range) => {
                f(&mut range.start);
                f(&mut range.stop);
            }
            Self::MemorySource(_)
            | Self::UdtfSource(_)
            | Self::RemoteSource(_)
            | Self::Union
            | Self::Limit(_)
            | Self::Stream
            | Self::MetadataResolver(_)
            | Self::MemorySink(_)
            | Self::RemoteSink(_) => {}
        }
    }
}

/// A dataframe transformation
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub(crate) parents: SmallVec<[NodeId; 2]>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) relation: Option<Relation>,
    pub(crate) kind: OperatorKind,
}

impl Operator {
    pub(crate) fn new(kind: OperatorKind) -> Self {
        Self {
            parents: SmallVec::new(),
            children: Vec::new(),
            relation: None,
            kind,
        }
    }

    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    /// Mutable access to the payload. Expression slots must be edited
    /// through the graph so ownership stays consistent.
    pub fn kind_mut(&mut self) -> &mut OperatorKind {
        &mut self.kind
    }

    pub fn node_type(&self) -> IrNodeType {
        self.kind.node_type()
    }

    /// Input operators, in operand order
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Consuming operators, in edge creation order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }

    pub fn is_relation_init(&self) -> bool {
        self.relation.is_some()
    }

    /// Record the output relation. Returns whether anything changed; an
    /// initialized relation is never replaced.
    pub fn set_relation(&mut self, relation: Relation) -> bool {
        if self.relation.is_some() {
            return false;
        }
        self.relation = Some(relation);
        true
    }

    pub fn is_source(&self) -> bool {
        self.node_type().is_source()
    }

    pub fn is_sink(&self) -> bool {
        self.node_type().is_sink()
    }

    /// Operators that consume their whole input before emitting
    pub fn is_blocking(&self) -> bool {
        matches!(
            self.kind,
            OperatorKind::BlockingAgg(_) | OperatorKind::MemorySink(_) | OperatorKind::RemoteSink(_)
        )
    }

    pub fn expression_slots(&self) -> Vec<NodeId> {
        self.kind.expression_slots()
    }
}
