//! IR nodes
//!
//! Every node lives in the arena of an [`IrGraph`](crate::IrGraph) and is
//! addressed by a [`NodeId`]. A node is either an operator (a dataframe
//! transformation with parent/child edges and an output relation) or an
//! expression (a scalar computation owned by exactly one operator).
//!
//! Nodes never change kind after creation; rules only add resolution
//! information to them in place.

use pxl_diagnostics::SourcePosition;
use pxl_types::DataType;
use std::fmt;

use crate::expression::{Expression, ExpressionKind};
use crate::operator::{Operator, OperatorKind};

/// Stable creation-order identity of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in creation order
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind discriminant of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrNodeType {
    // Source operators
    MemorySource,
    UdtfSource,
    RemoteSource,

    // Transform operators
    Map,
    Filter,
    BlockingAgg,
    Join,
    Union,
    Limit,
    GroupBy,
    Rolling,
    Stream,
    Range,
    MetadataResolver,

    // Sink operators
    MemorySink,
    RemoteSink,

    // Expressions
    Column,
    Func,
    Int,
    Float,
    String,
    Bool,
    Time,
    Duration,
    Uint128,
    Lambda,
    List,
    Tuple,
    Metadata,
    MetadataLiteral,
}

impl IrNodeType {
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::MemorySource
                | Self::UdtfSource
                | Self::RemoteSource
                | Self::Map
                | Self::Filter
                | Self::BlockingAgg
                | Self::Join
                | Self::Union
                | Self::Limit
                | Self::GroupBy
                | Self::Rolling
                | Self::Stream
                | Self::Range
                | Self::MetadataResolver
                | Self::MemorySink
                | Self::RemoteSink
        )
    }

    pub const fn is_expression(&self) -> bool {
        !self.is_operator()
    }

    /// Literal data kinds
    pub const fn is_data(&self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Float
                | Self::String
                | Self::Bool
                | Self::Time
                | Self::Duration
                | Self::Uint128
        )
    }

    pub const fn is_source(&self) -> bool {
        matches!(self, Self::MemorySource | Self::UdtfSource | Self::RemoteSource)
    }

    pub const fn is_sink(&self) -> bool {
        matches!(self, Self::MemorySink | Self::RemoteSink)
    }

    /// Markers that exist only during analysis and are removed before planning
    pub const fn is_ir_only(&self) -> bool {
        matches!(self, Self::GroupBy | Self::Range | Self::MetadataResolver)
    }

    /// Kind of the literal node carrying values of `data_type`
    pub const fn for_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::Boolean => Self::Bool,
            DataType::Int64 => Self::Int,
            DataType::Uint128 => Self::Uint128,
            DataType::Float64 => Self::Float,
            DataType::String => Self::String,
            DataType::Time64ns => Self::Time,
            DataType::Duration64ns => Self::Duration,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::MemorySource => "MemorySource",
            Self::UdtfSource => "UdtfSource",
            Self::RemoteSource => "RemoteSource",
            Self::Map => "Map",
            Self::Filter => "Filter",
            Self::BlockingAgg => "BlockingAgg",
            Self::Join => "Join",
            Self::Union => "Union",
            Self::Limit => "Limit",
            Self::GroupBy => "GroupBy",
            Self::Rolling => "Rolling",
            Self::Stream => "Stream",
            Self::Range => "Range",
            Self::MetadataResolver => "MetadataResolver",
            Self::MemorySink => "MemorySink",
            Self::RemoteSink => "RemoteSink",
            Self::Column => "Column",
            Self::Func => "Func",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Bool => "Bool",
            Self::Time => "Time",
            Self::Duration => "Duration",
            Self::Uint128 => "Uint128",
            Self::Lambda => "Lambda",
            Self::List => "List",
            Self::Tuple => "Tuple",
            Self::Metadata => "Metadata",
            Self::MetadataLiteral => "MetadataLiteral",
        }
    }
}

impl fmt::Display for IrNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operator or expression payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Operator(Operator),
    Expression(Expression),
}

/// A node of the IR graph
#[derive(Debug, Clone, PartialEq)]
pub struct IrNode {
    pub(crate) id: NodeId,
    pub(crate) position: SourcePosition,
    pub(crate) body: NodeBody,
}

impl IrNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Where the node was written in the query
    pub fn position(&self) -> SourcePosition {
        self.position
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn node_type(&self) -> IrNodeType {
        match &self.body {
            NodeBody::Operator(op) => op.kind().node_type(),
            NodeBody::Expression(expr) => expr.kind().node_type(),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.body, NodeBody::Operator(_))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.body, NodeBody::Expression(_))
    }

    pub fn as_operator(&self) -> Option<&Operator> {
        match &self.body {
            NodeBody::Operator(op) => Some(op),
            NodeBody::Expression(_) => None,
        }
    }

    pub fn as_operator_mut(&mut self) -> Option<&mut Operator> {
        match &mut self.body {
            NodeBody::Operator(op) => Some(op),
            NodeBody::Expression(_) => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match &self.body {
            NodeBody::Expression(expr) => Some(expr),
            NodeBody::Operator(_) => None,
        }
    }

    pub fn as_expression_mut(&mut self) -> Option<&mut Expression> {
        match &mut self.body {
            NodeBody::Expression(expr) => Some(expr),
            NodeBody::Operator(_) => None,
        }
    }

    /// Operator kind, if this is an operator
    pub fn operator_kind(&self) -> Option<&OperatorKind> {
        self.as_operator().map(Operator::kind)
    }

    /// Expression kind, if this is an expression
    pub fn expression_kind(&self) -> Option<&ExpressionKind> {
        self.as_expression().map(Expression::kind)
    }
}

impl fmt::Display for IrNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.node_type(), self.id)
    }
}
