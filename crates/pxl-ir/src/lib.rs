//! PxL intermediate representation
//!
//! This crate provides the graph the semantic analyzer works on:
//! - [`IrGraph`]: arena owning every operator and expression node
//! - [`node`], [`operator`], [`expression`]: the closed node model
//! - [`pattern`]: composable structural predicates over nodes
//! - graph-wide queries such as topological ordering and pattern search

pub mod error;
pub mod expression;
pub mod graph;
pub mod node;
pub mod opcode;
pub mod operator;
pub mod pattern;
mod traversal;

pub use error::GraphError;
pub use expression::{Args, Column, Expression, ExpressionKind, Func, Lambda, Metadata, MetadataLiteral};
pub use graph::IrGraph;
pub use node::{IrNode, IrNodeType, NodeBody, NodeId};
pub use opcode::Opcode;
pub use operator::{ColumnExpression, JoinType, Operator, OperatorKind, SinkDestination};
pub use pattern::Pattern;
