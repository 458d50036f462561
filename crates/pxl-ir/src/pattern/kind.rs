//! Node-kind patterns

use super::{Or, Pattern};
use crate::{IrGraph, IrNode, IrNodeType};

/// Matches nodes of exactly one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMatch(pub IrNodeType);

impl Pattern for KindMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.node_type() == self.0
    }
}

/// Matches nodes of any of several kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyKindMatch(pub &'static [IrNodeType]);

impl Pattern for AnyKindMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        self.0.contains(&node.node_type())
    }
}

/// Matches any operator
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyOperator;

impl Pattern for AnyOperator {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.is_operator()
    }
}

/// Matches any expression
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyExpression;

impl Pattern for AnyExpression {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.is_expression()
    }
}

pub fn kind(node_type: IrNodeType) -> KindMatch {
    KindMatch(node_type)
}

pub fn any_operator() -> AnyOperator {
    AnyOperator
}

pub fn any_expression() -> AnyExpression {
    AnyExpression
}

const SOURCE_KINDS: &[IrNodeType] = &[
    IrNodeType::MemorySource,
    IrNodeType::UdtfSource,
    IrNodeType::RemoteSource,
];

const SINK_KINDS: &[IrNodeType] = &[IrNodeType::MemorySink, IrNodeType::RemoteSink];

/// Any source operator
pub fn source() -> AnyKindMatch {
    AnyKindMatch(SOURCE_KINDS)
}

/// Any sink operator
pub fn sink() -> AnyKindMatch {
    AnyKindMatch(SINK_KINDS)
}

/// Sinks whose rows end up in the query result
pub fn result_sink() -> Or<KindMatch, super::RemoteSinkMatch> {
    memory_sink().or(super::external_remote_sink())
}

macro_rules! kind_matchers {
    ($($(#[$doc:meta])* $name:ident => $ty:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name() -> KindMatch {
                KindMatch(IrNodeType::$ty)
            }
        )*
    };
}

kind_matchers! {
    memory_source => MemorySource,
    udtf_source => UdtfSource,
    remote_source => RemoteSource,
    map => Map,
    filter => Filter,
    blocking_agg => BlockingAgg,
    join => Join,
    union => Union,
    limit => Limit,
    /// IR-only grouping marker
    group_by => GroupBy,
    rolling => Rolling,
    stream => Stream,
    /// IR-only time range marker
    range => Range,
    /// IR-only metadata marker
    metadata_resolver => MetadataResolver,
    memory_sink => MemorySink,
    remote_sink => RemoteSink,
    func => Func,
    lambda => Lambda,
    list => List,
    tuple => Tuple,
    metadata => Metadata,
    metadata_literal => MetadataLiteral,
}
