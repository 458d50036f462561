//! Expression nodes

use pxl_types::{DataType, FunctionKind, MetadataProperty, MetadataType, ScalarValue};
use smallvec::SmallVec;

use crate::node::{IrNodeType, NodeId};
use crate::opcode::Opcode;

/// Operand list of a function call
pub type Args = SmallVec<[NodeId; 4]>;

/// Reference to a column of one of the owning operator's parents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Which parent of the owning operator the column comes from
    pub parent_op_idx: usize,
    /// Position in that parent's relation, once resolved
    pub index: Option<usize>,
}

/// Function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Func {
    /// Operator the call was written with, if any
    pub opcode: Option<Opcode>,
    /// Registry name
    pub name: String,
    pub args: Args,
    /// The function can run as separate partial and finalize stages
    pub supports_partial: bool,
    /// Scalar or aggregate, once resolved against the registry
    pub function_kind: Option<FunctionKind>,
}

impl Func {
    pub fn is_aggregate(&self) -> bool {
        self.function_kind == Some(FunctionKind::Aggregate)
    }
}

/// Anonymous function body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: NodeId,
}

/// Logical metadata key such as `pod_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Key as written
    pub key: String,
    pub parent_op_idx: usize,
    /// Registry property, once annotated
    pub property: Option<MetadataProperty>,
}

impl Metadata {
    pub fn metadata_type(&self) -> Option<MetadataType> {
        self.property.as_ref().map(|p| p.metadata_type)
    }
}

/// Literal validated against a metadata format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataLiteral {
    /// The wrapped data node
    pub literal: NodeId,
}

/// Expression variants
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Column(Column),
    Func(Func),
    Data(ScalarValue),
    Lambda(Lambda),
    List(Vec<NodeId>),
    Tuple(Vec<NodeId>),
    Metadata(Metadata),
    MetadataLiteral(MetadataLiteral),
}

impl ExpressionKind {
    pub fn node_type(&self) -> IrNodeType {
        match self {
            Self::Column(_) => IrNodeType::Column,
            Self::Func(_) => IrNodeType::Func,
            Self::Data(value) => IrNodeType::for_data_type(value.data_type()),
            Self::Lambda(_) => IrNodeType::Lambda,
            Self::List(_) => IrNodeType::List,
            Self::Tuple(_) => IrNodeType::Tuple,
            Self::Metadata(_) => IrNodeType::Metadata,
            Self::MetadataLiteral(_) => IrNodeType::MetadataLiteral,
        }
    }

    /// Child expressions, in order
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            Self::Func(func) => func.args.to_vec(),
            Self::Lambda(lambda) => vec![lambda.body],
            Self::List(items) | Self::Tuple(items) => items.clone(),
            Self::MetadataLiteral(lit) => vec![lit.literal],
            Self::Column(_) | Self::Data(_) | Self::Metadata(_) => Vec::new(),
        }
    }

    pub(crate) fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut NodeId)) {
        match self {
            Self::Func(func) => func.args.iter_mut().for_each(&mut f),
            Self::Lambda(lambda) => f(&mut lambda.body),
            Self::List(items) | Self::Tuple(items) => items.iter_mut().for_each(&mut f),
            Self::MetadataLiteral(lit) => f(&mut lit.literal),
            Self::Column(_) | Self::Data(_) | Self::Metadata(_) => {}
        }
    }
}

/// A scalar computation owned by an operator
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub(crate) owner: Option<NodeId>,
    pub(crate) data_type: Option<DataType>,
    pub(crate) kind: ExpressionKind,
}

impl Expression {
    /// Create an unowned expression. Literals start out resolved.
    pub fn new(kind: ExpressionKind) -> Self {
        let data_type = match &kind {
            ExpressionKind::Data(value) => Some(value.data_type()),
            _ => None,
        };
        Self {
            owner: None,
            data_type,
            kind,
        }
    }

    pub fn kind(&self) -> &ExpressionKind {
        &self.kind
    }

    /// Mutable access to the payload. Operand lists must be edited through
    /// the graph so ownership stays consistent.
    pub fn kind_mut(&mut self) -> &mut ExpressionKind {
        &mut self.kind
    }

    /// Operator this expression belongs to
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    pub fn is_resolved(&self) -> bool {
        self.data_type.is_some()
    }

    /// Record the resolved type. Returns whether anything changed; a
    /// resolved type is never replaced.
    pub fn resolve(&mut self, data_type: DataType) -> bool {
        if self.data_type.is_some() {
            return false;
        }
        self.data_type = Some(data_type);
        true
    }

    pub fn operands(&self) -> Vec<NodeId> {
        self.kind.operands()
    }

    pub fn as_column(&self) -> Option<&Column> {
        match &self.kind {
            ExpressionKind::Column(col) => Some(col),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match &self.kind {
            ExpressionKind::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&ScalarValue> {
        match &self.kind {
            ExpressionKind::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_metadata(&self) -> Option<&Metadata> {
        match &self.kind {
            ExpressionKind::Metadata(md) => Some(md),
            _ => None,
        }
    }
}
