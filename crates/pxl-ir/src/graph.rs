//! Arena-backed IR graph
//!
//! The graph owns every node in a single arena indexed by [`NodeId`].
//! Operator edges and expression operands are plain ids into that arena,
//! so traversal is O(1) per hop and there is no shared ownership between
//! nodes. Deleted nodes leave a hole; ids are never reused, which keeps
//! creation order stable for the whole compilation.
//!
//! Invariants upheld by every editing method:
//! - operator edges never form a cycle
//! - `a` lists `b` as a child exactly when `b` lists `a` as a parent
//! - every expression reachable from an operator slot records that operator
//!   as its owner

use pxl_diagnostics::SourcePosition;
use pxl_types::{DataType, Relation, ScalarValue};
use smallvec::SmallVec;

use crate::error::GraphError;
use crate::expression::{Column, Expression, ExpressionKind, Func, Lambda, Metadata, MetadataLiteral};
use crate::node::{IrNode, NodeBody, NodeId};
use crate::opcode::Opcode;
use crate::operator::{Operator, OperatorKind};

type Result<T> = std::result::Result<T, GraphError>;

/// The IR graph of one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrGraph {
    nodes: Vec<Option<IrNode>>,
}

impl IrGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, position: SourcePosition, body: NodeBody) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(IrNode { id, position, body }));
        id
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&IrNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get(&self, id: NodeId) -> Result<&IrNode> {
        self.node(id).ok_or(GraphError::MissingNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut IrNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(GraphError::MissingNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn operator(&self, id: NodeId) -> Result<&Operator> {
        let node = self.get(id)?;
        node.as_operator().ok_or(GraphError::NotAnOperator {
            id,
            found: node.node_type(),
        })
    }

    pub fn operator_mut(&mut self, id: NodeId) -> Result<&mut Operator> {
        let node = self.get_mut(id)?;
        let found = node.node_type();
        node.as_operator_mut()
            .ok_or(GraphError::NotAnOperator { id, found })
    }

    pub fn expression(&self, id: NodeId) -> Result<&Expression> {
        let node = self.get(id)?;
        node.as_expression().ok_or(GraphError::NotAnExpression {
            id,
            found: node.node_type(),
        })
    }

    pub fn expression_mut(&mut self, id: NodeId) -> Result<&mut Expression> {
        let node = self.get_mut(id)?;
        let found = node.node_type();
        node.as_expression_mut()
            .ok_or(GraphError::NotAnExpression { id, found })
    }

    /// Source position of a node, or the default position if it is gone
    pub fn position(&self, id: NodeId) -> SourcePosition {
        self.node(id).map(IrNode::position).unwrap_or_default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the largest id ever handed out
    pub fn id_bound(&self) -> usize {
        self.nodes.len()
    }

    /// Id of the live node created `index`-th, if any
    pub fn id_at(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).and_then(Option::as_ref).map(IrNode::id)
    }

    /// Live nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &IrNode> {
        self.nodes.iter().flatten()
    }

    /// Ids of live nodes in creation order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(IrNode::id).collect()
    }

    pub fn operator_ids(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.is_operator())
            .map(IrNode::id)
            .collect()
    }

    pub fn expression_ids(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.is_expression())
            .map(IrNode::id)
            .collect()
    }

    // ------------------------------------------------------------------
    // Expression construction
    // ------------------------------------------------------------------

    /// Add an unowned expression. Its operands must already be expressions
    /// in this graph.
    pub fn add_expression(&mut self, position: SourcePosition, kind: ExpressionKind) -> Result<NodeId> {
        for operand in kind.operands() {
            self.expression(operand)?;
        }
        Ok(self.push(position, NodeBody::Expression(Expression::new(kind))))
    }

    /// Add a literal
    pub fn add_data(&mut self, position: SourcePosition, value: ScalarValue) -> NodeId {
        self.push(
            position,
            NodeBody::Expression(Expression::new(ExpressionKind::Data(value))),
        )
    }

    pub fn add_int(&mut self, position: SourcePosition, value: i64) -> NodeId {
        self.add_data(position, ScalarValue::Int64(value))
    }

    pub fn add_float(&mut self, position: SourcePosition, value: f64) -> NodeId {
        self.add_data(position, ScalarValue::Float64(value))
    }

    pub fn add_string(&mut self, position: SourcePosition, value: impl Into<String>) -> NodeId {
        self.add_data(position, ScalarValue::String(value.into()))
    }

    pub fn add_bool(&mut self, position: SourcePosition, value: bool) -> NodeId {
        self.add_data(position, ScalarValue::Boolean(value))
    }

    pub fn add_time(&mut self, position: SourcePosition, nanos: i64) -> NodeId {
        self.add_data(position, ScalarValue::Time64ns(nanos))
    }

    pub fn add_duration(&mut self, position: SourcePosition, nanos: i64) -> NodeId {
        self.add_data(position, ScalarValue::Duration64ns(nanos))
    }

    /// Add a reference to column `name` of the owning operator's parent at
    /// `parent_op_idx`
    pub fn add_column(&mut self, position: SourcePosition, name: impl Into<String>, parent_op_idx: usize) -> NodeId {
        self.push(
            position,
            NodeBody::Expression(Expression::new(ExpressionKind::Column(Column {
                name: name.into(),
                parent_op_idx,
                index: None,
            }))),
        )
    }

    pub fn add_metadata(&mut self, position: SourcePosition, key: impl Into<String>, parent_op_idx: usize) -> NodeId {
        self.push(
            position,
            NodeBody::Expression(Expression::new(ExpressionKind::Metadata(Metadata {
                key: key.into(),
                parent_op_idx,
                property: None,
            }))),
        )
    }

    /// Add a call to a named function
    pub fn add_func(&mut self, position: SourcePosition, name: impl Into<String>, args: &[NodeId]) -> Result<NodeId> {
        self.add_expression(
            position,
            ExpressionKind::Func(Func {
                opcode: None,
                name: name.into(),
                args: SmallVec::from_slice(args),
                supports_partial: false,
                function_kind: None,
            }),
        )
    }

    /// Add a call written with an operator; it carries the registry name
    pub fn add_opcode_func(&mut self, position: SourcePosition, opcode: Opcode, args: &[NodeId]) -> Result<NodeId> {
        self.add_expression(
            position,
            ExpressionKind::Func(Func {
                opcode: Some(opcode),
                name: opcode.registry_name().to_string(),
                args: SmallVec::from_slice(args),
                supports_partial: false,
                function_kind: None,
            }),
        )
    }

    /// Wrap a literal into a metadata literal
    pub fn add_metadata_literal(&mut self, position: SourcePosition, literal: NodeId) -> Result<NodeId> {
        let found = self.get(literal)?.node_type();
        if !found.is_data() {
            return Err(GraphError::NotAnExpression { id: literal, found });
        }
        self.add_expression(position, ExpressionKind::MetadataLiteral(MetadataLiteral { literal }))
    }

    pub fn add_lambda(&mut self, position: SourcePosition, params: Vec<String>, body: NodeId) -> Result<NodeId> {
        self.add_expression(position, ExpressionKind::Lambda(Lambda { params, body }))
    }

    pub fn add_list(&mut self, position: SourcePosition, items: Vec<NodeId>) -> Result<NodeId> {
        self.add_expression(position, ExpressionKind::List(items))
    }

    pub fn add_tuple(&mut self, position: SourcePosition, items: Vec<NodeId>) -> Result<NodeId> {
        self.add_expression(position, ExpressionKind::Tuple(items))
    }

    // ------------------------------------------------------------------
    // Operator construction
    // ------------------------------------------------------------------

    /// Add an operator consuming `parents` in order. The expression trees
    /// referenced by its slots become owned by it.
    pub fn add_operator(&mut self, position: SourcePosition, kind: OperatorKind, parents: &[NodeId]) -> Result<NodeId> {
        for &parent in parents {
            self.operator(parent)?;
        }
        for slot in kind.expression_slots() {
            if let Some(owner) = self.expression(slot)?.owner {
                return Err(GraphError::AlreadyOwned { expr: slot, owner });
            }
        }

        let slots = kind.expression_slots();
        let mut op = Operator::new(kind);
        op.parents = SmallVec::from_slice(parents);
        let id = self.push(position, NodeBody::Operator(op));

        for &parent in parents {
            self.operator_mut(parent)?.children.push(id);
        }
        for slot in slots {
            self.adopt_expression(id, slot)?;
        }
        Ok(id)
    }

    /// Add an operator whose relation is known up front
    pub fn add_operator_with_relation(
        &mut self,
        position: SourcePosition,
        kind: OperatorKind,
        parents: &[NodeId],
        relation: Relation,
    ) -> Result<NodeId> {
        let id = self.add_operator(position, kind, parents)?;
        self.operator_mut(id)?.relation = Some(relation);
        Ok(id)
    }

    /// Insert a new single-input operator on the edge `parent -> child`
    pub fn insert_between(
        &mut self,
        position: SourcePosition,
        kind: OperatorKind,
        parent: NodeId,
        child: NodeId,
    ) -> Result<NodeId> {
        if !self.operator(child)?.parents.contains(&parent) {
            return Err(GraphError::MissingEdge { parent, child });
        }
        let id = self.add_operator(position, kind, &[parent])?;
        self.replace_parent(child, parent, id)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Whether `ancestor` is reachable from `node` by following parent edges
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(current) = stack.pop() {
            let Ok(op) = self.operator(current) else {
                continue;
            };
            for &parent in &op.parents {
                if parent == ancestor {
                    return true;
                }
                if !seen[parent.0] {
                    seen[parent.0] = true;
                    stack.push(parent);
                }
            }
        }
        false
    }

    /// Append `parent` to `child`'s inputs
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.operator(parent)?;
        self.operator(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(GraphError::Cycle { parent, child });
        }
        self.operator_mut(child)?.parents.push(parent);
        self.operator_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Remove one `parent -> child` edge
    pub fn remove_edge(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let child_op = self.operator_mut(child)?;
        let idx = child_op
            .parents
            .iter()
            .position(|&p| p == parent)
            .ok_or(GraphError::MissingEdge { parent, child })?;
        child_op.parents.remove(idx);
        remove_first(&mut self.operator_mut(parent)?.children, child);
        Ok(())
    }

    /// Swap `old` for `new` among `child`'s inputs, keeping the operand
    /// position so column parent indexes stay valid
    pub fn replace_parent(&mut self, child: NodeId, old: NodeId, new: NodeId) -> Result<()> {
        self.operator(new)?;
        let idx = self
            .operator(child)?
            .parents
            .iter()
            .position(|&p| p == old)
            .ok_or(GraphError::MissingEdge { parent: old, child })?;
        if new == child || self.is_ancestor(child, new) {
            return Err(GraphError::Cycle { parent: new, child });
        }
        self.operator_mut(child)?.parents[idx] = new;
        remove_first(&mut self.operator_mut(old)?.children, child);
        self.operator_mut(new)?.children.push(child);
        Ok(())
    }

    /// Reverse the inputs of a two-input operator
    pub fn swap_parents(&mut self, op: NodeId) -> Result<()> {
        let operator = self.operator_mut(op)?;
        if operator.parents.len() != 2 {
            return Err(GraphError::ParentCount {
                node: op,
                expected: 2,
                actual: operator.parents.len(),
            });
        }
        operator.parents.swap(0, 1);
        Ok(())
    }

    /// Re-point every child of `from` at `to`
    pub fn redirect_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let children = self.operator(from)?.children.clone();
        for child in children {
            self.replace_parent(child, from, to)?;
        }
        Ok(())
    }

    /// Connect the single parent of `op` directly to all of its children.
    /// `op` is left childless; returns its parent.
    pub fn bypass(&mut self, op: NodeId) -> Result<NodeId> {
        let parents = &self.operator(op)?.parents;
        let [parent] = parents.as_slice() else {
            return Err(GraphError::ParentCount {
                node: op,
                expected: 1,
                actual: parents.len(),
            });
        };
        let parent = *parent;
        self.redirect_children(op, parent)?;
        Ok(parent)
    }

    // ------------------------------------------------------------------
    // Expression ownership and rewriting
    // ------------------------------------------------------------------

    /// Expression tree rooted at `root`, in pre-order
    pub fn expression_tree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Ok(expr) = self.expression(id) else {
                continue;
            };
            out.push(id);
            stack.extend(expr.operands().into_iter().rev());
        }
        out
    }

    /// Every expression owned by an operator, slot by slot
    pub fn owned_expressions(&self, op: NodeId) -> Result<Vec<NodeId>> {
        Ok(self
            .operator(op)?
            .expression_slots()
            .into_iter()
            .flat_map(|slot| self.expression_tree(slot))
            .collect())
    }

    /// Make `owner` the owner of the expression tree at `root`
    pub fn adopt_expression(&mut self, owner: NodeId, root: NodeId) -> Result<()> {
        self.operator(owner)?;
        for id in self.expression_tree(root) {
            self.expression_mut(id)?.owner = Some(owner);
        }
        Ok(())
    }

    /// Point the operator slot or operand that refers to `old` at `new`.
    /// `new` inherits `old`'s owner; `old` stays in the arena detached so the
    /// caller can reuse or delete it.
    pub fn replace_expression(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let owner = self.expression(old)?.owner;
        let new_tree = self.expression_tree(new);
        if new_tree.is_empty() {
            self.expression(new)?;
        }

        let mut replaced = false;
        for node in self.nodes.iter_mut().flatten() {
            if new_tree.contains(&node.id) {
                continue;
            }
            let mut swap = |slot: &mut NodeId| {
                if !replaced && *slot == old {
                    *slot = new;
                    replaced = true;
                }
            };
            match &mut node.body {
                NodeBody::Operator(op) => op.kind.for_each_slot_mut(&mut swap),
                NodeBody::Expression(expr) => expr.kind.for_each_operand_mut(&mut swap),
            }
            if replaced {
                break;
            }
        }
        if !replaced {
            return Err(GraphError::DanglingExpression(old));
        }

        self.expression_mut(old)?.owner = None;
        if let Some(owner) = owner {
            self.adopt_expression(owner, new)?;
        }
        Ok(())
    }

    /// Record an expression's type. Returns whether it changed.
    pub fn resolve_expression(&mut self, id: NodeId, data_type: DataType) -> Result<bool> {
        Ok(self.expression_mut(id)?.resolve(data_type))
    }

    /// Record an operator's relation. Returns whether it changed.
    pub fn set_relation(&mut self, id: NodeId, relation: Relation) -> Result<bool> {
        Ok(self.operator_mut(id)?.set_relation(relation))
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Delete a node. Operators must be childless; they are unlinked from
    /// their parents and their expression trees go with them. Expressions
    /// are deleted with their operands.
    pub fn delete_node(&mut self, id: NodeId) -> Result<()> {
        match &self.get(id)?.body {
            NodeBody::Operator(op) => {
                if !op.children.is_empty() {
                    return Err(GraphError::HasChildren {
                        node: id,
                        children: op.children.len(),
                    });
                }
                let parents = op.parents.clone();
                let slots = op.expression_slots();
                for parent in parents {
                    remove_first(&mut self.operator_mut(parent)?.children, id);
                }
                for slot in slots {
                    self.delete_expression_tree(slot);
                }
                self.nodes[id.0] = None;
            }
            NodeBody::Expression(_) => self.delete_expression_tree(id),
        }
        Ok(())
    }

    /// Delete the expression tree rooted at `root`
    pub fn delete_expression_tree(&mut self, root: NodeId) {
        for id in self.expression_tree(root) {
            self.nodes[id.0] = None;
        }
    }
}

fn remove_first(ids: &mut Vec<NodeId>, target: NodeId) {
    if let Some(idx) = ids.iter().position(|&id| id == target) {
        ids.remove(idx);
    }
}
