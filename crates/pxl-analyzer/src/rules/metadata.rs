//! Metadata access: attribute chains, key annotation and literal formats

use pxl_diagnostics::{CompilerError, PXL0103, PXL0305};
use pxl_ir::operator::MetadataResolver;
use pxl_ir::pattern::{Pattern, equals, metadata_expression, string};
use pxl_ir::{ExpressionKind, IrGraph, IrNode, NodeId, OperatorKind};
use pxl_types::{KeyConversion, MetadataProperty, Relation};

use super::parent_at;
use crate::{CompilerState, Rule, RuleResult};

/// Prefixes of attribute chains that denote metadata access
const ATTRIBUTE_PREFIXES: [&str; 2] = ["attr.", "ctx."];

/// Metadata key named by an attribute chain such as `ctx.pod`
fn attribute_key(name: &str) -> Option<&str> {
    ATTRIBUTE_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .filter(|key| !key.is_empty() && !key.contains('.'))
}

/// How a metadata column is obtained from a parent relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource<'a> {
    /// The parent already carries the materialized column
    Materialized,
    /// The parent has a column of the property's own name and type
    Copy(&'a str),
    /// Computed from a key column by a registry function
    Convert(&'a KeyConversion),
}

/// Pick the cheapest way to materialize `property` on top of `parent`
pub fn metadata_source<'a>(
    property: &'a MetadataProperty,
    parent: &Relation,
    prefix: &str,
) -> Option<MetadataSource<'a>> {
    if parent.has_column(&property.prefixed_name(prefix)) {
        return Some(MetadataSource::Materialized);
    }
    if parent.column_type(&property.name) == Some(property.column_type) {
        return Some(MetadataSource::Copy(&property.name));
    }
    property
        .conversions
        .iter()
        .find(|c| parent.has_column(&c.key_column))
        .map(MetadataSource::Convert)
}

/// Resolves metadata access.
///
/// - `attr.<key>` and `ctx.<key>` columns become Metadata nodes
/// - Metadata nodes are annotated with their registry property
/// - the owning operator reads the metadata through a MetadataResolver
///   inserted on the edge to the referenced parent, shared by every key
///   read over that edge
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveMetadataRule;

impl ResolveMetadataRule {
    fn rewrite_attribute(graph: &mut IrGraph, node: NodeId, key: String, parent_op_idx: usize) -> RuleResult {
        let metadata = graph.add_metadata(graph.position(node), key, parent_op_idx);
        graph.replace_expression(node, metadata)?;
        graph.delete_node(node)?;
        Ok(true)
    }

    fn attach_resolver(
        graph: &mut IrGraph,
        node: NodeId,
        owner: NodeId,
        parent_op_idx: usize,
        property: MetadataProperty,
    ) -> Result<(), CompilerError> {
        let mut child = owner;
        let mut parent = parent_at(graph, owner, parent_op_idx)?;
        // A GroupBy has to stay directly above the operator it groups, so the
        // resolver goes on the GroupBy's input edge instead
        if matches!(graph.operator(parent)?.kind(), OperatorKind::GroupBy(_)) {
            child = parent;
            parent = parent_at(graph, parent, 0)?;
        }
        if let OperatorKind::MetadataResolver(resolver) = graph.operator_mut(parent)?.kind_mut() {
            resolver.add_property(property);
            return Ok(());
        }
        let mut resolver = MetadataResolver::default();
        resolver.add_property(property);
        graph.insert_between(
            graph.position(node),
            OperatorKind::MetadataResolver(resolver),
            parent,
            child,
        )?;
        Ok(())
    }
}

impl Rule for ResolveMetadataRule {
    fn name(&self) -> &'static str {
        "ResolveMetadataRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, state: &CompilerState<'_>) -> RuleResult {
        let Some(expr) = graph.node(node).and_then(IrNode::as_expression) else {
            return Ok(false);
        };
        let Some(owner) = expr.owner() else {
            return Ok(false);
        };

        match expr.kind() {
            ExpressionKind::Column(col) => match attribute_key(&col.name) {
                Some(key) => {
                    let (key, idx) = (key.to_string(), col.parent_op_idx);
                    Self::rewrite_attribute(graph, node, key, idx)
                }
                None => Ok(false),
            },
            ExpressionKind::Metadata(md) if md.property.is_none() => {
                let property = state.metadata.lookup(&md.key).cloned().ok_or_else(|| {
                    CompilerError::lookup(PXL0103, format!("Metadata key '{}' unavailable.", md.key))
                })?;
                let idx = md.parent_op_idx;
                if let ExpressionKind::Metadata(md) = graph.expression_mut(node)?.kind_mut() {
                    md.property = Some(property.clone());
                }
                Self::attach_resolver(graph, node, owner, idx, property)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Checks string literals compared against metadata and wraps them into
/// MetadataLiterals, e.g. `ctx.pod == "pl/vizier-pem"`
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataFunctionFormatRule;

impl Rule for MetadataFunctionFormatRule {
    fn name(&self) -> &'static str {
        "MetadataFunctionFormatRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        if !graph
            .node(node)
            .is_some_and(|n| equals(metadata_expression(), string()).matches(graph, n))
        {
            return Ok(false);
        }
        let Some(func) = graph.expression(node)?.as_func() else {
            return Ok(false);
        };
        let [a, b] = func.args.as_slice() else {
            return Ok(false);
        };
        let (metadata, literal) = if graph.node(*a).is_some_and(|n| metadata_expression().matches(graph, n)) {
            (*a, *b)
        } else {
            (*b, *a)
        };

        let Some(property) = graph
            .expression(metadata)?
            .as_metadata()
            .and_then(|md| md.property.as_ref())
        else {
            return Ok(false);
        };
        let value = graph
            .expression(literal)?
            .as_data()
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if !property.format.validate(value) {
            return Err(CompilerError::argument(
                PXL0305,
                format!(
                    "'{}' is not a valid {}. Expected format {}.",
                    value,
                    property.name,
                    property.format.example()
                ),
            )
            .at(graph.position(literal)));
        }

        let wrapped = graph.add_metadata_literal(graph.position(literal), literal)?;
        graph.replace_expression(literal, wrapped)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Fixture, cpu_relation, pos, resolved_source};
    use pretty_assertions::assert_eq;
    use pxl_diagnostics::{CompilerErrorGroup, ErrorKind};
    use pxl_ir::operator::{BlockingAgg, ColumnExpression, Filter, GroupBy, Map};
    use pxl_ir::pattern::{metadata, metadata_literal, metadata_resolver};
    use pxl_ir::Opcode;
    use pxl_types::{DataType, MetadataType};
    use rstest::rstest;

    fn run<R: Rule>(rule: R, graph: &mut IrGraph, fx: &Fixture) -> CompilerErrorGroup {
        let mut errors = CompilerErrorGroup::new();
        rule.execute(graph, &fx.state(), &mut errors);
        errors
    }

    #[rstest]
    #[case("attr.pod", Some("pod"))]
    #[case("ctx.service_name", Some("service_name"))]
    #[case("ctx.", None)]
    #[case("ctx.a.b", None)]
    #[case("pod", None)]
    fn test_attribute_key(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(attribute_key(name), expected);
    }

    #[test]
    fn test_attribute_chain_becomes_annotated_metadata() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let src = resolved_source(&mut g, "cpu", cpu_relation());
        let attr = g.add_column(pos(2, 10), "ctx.pod", 0);
        let svc = g.add_metadata(pos(2, 20), "service", 0);
        let map = g
            .add_operator(
                pos(2, 1),
                OperatorKind::Map(Map {
                    col_exprs: vec![ColumnExpression::new("pod", attr), ColumnExpression::new("svc", svc)],
                    keep_input_columns: false,
                }),
                &[src],
            )
            .unwrap();

        assert!(run(ResolveMetadataRule, &mut g, &fx).is_empty());

        assert!(!g.contains(attr));
        let resolvers = g.find_all(&metadata_resolver());
        assert_eq!(resolvers.len(), 1);
        let resolver = resolvers[0];
        assert_eq!(g.operator(map).unwrap().parents(), &[resolver]);
        assert_eq!(g.operator(resolver).unwrap().parents(), &[src]);

        let OperatorKind::MetadataResolver(r) = g.operator(resolver).unwrap().kind() else {
            unreachable!()
        };
        assert_eq!(r.properties.keys().collect::<Vec<_>>(), vec!["service_name", "pod_name"]);

        let md_nodes = g.find_all(&metadata());
        assert_eq!(md_nodes.len(), 2);
        for id in md_nodes {
            let md = g.expression(id).unwrap().as_metadata().unwrap();
            assert!(md.property.is_some());
            assert_eq!(g.expression(id).unwrap().owner(), Some(map));
        }
        assert_eq!(
            g.expression(svc).unwrap().as_metadata().unwrap().metadata_type(),
            Some(MetadataType::ServiceName)
        );
    }

    #[test]
    fn test_resolver_goes_above_group_by() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let src = resolved_source(&mut g, "cpu", cpu_relation());
        let group = g.add_column(pos(2, 12), "service", 0);
        let gb = g
            .add_operator(pos(2, 1), OperatorKind::GroupBy(GroupBy { groups: vec![group] }), &[src])
            .unwrap();
        let pod = g.add_column(pos(3, 20), "ctx.pod", 0);
        let count = g.add_func(pos(3, 14), "count", &[pod]).unwrap();
        let agg = g
            .add_operator(
                pos(3, 1),
                OperatorKind::BlockingAgg(BlockingAgg::new(vec![ColumnExpression::new("pods", count)])),
                &[gb],
            )
            .unwrap();

        assert!(run(ResolveMetadataRule, &mut g, &fx).is_empty());

        let resolvers = g.find_all(&metadata_resolver());
        assert_eq!(resolvers.len(), 1);
        assert_eq!(g.operator(agg).unwrap().parents(), &[gb]);
        assert_eq!(g.operator(gb).unwrap().parents(), &[resolvers[0]]);
        assert_eq!(g.operator(resolvers[0]).unwrap().parents(), &[src]);
    }

    #[test]
    fn test_unknown_metadata_key() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let src = resolved_source(&mut g, "cpu", cpu_relation());
        let md = g.add_metadata(pos(4, 8), "favourite_color", 0);
        g.add_operator(
            pos(4, 1),
            OperatorKind::Map(Map {
                col_exprs: vec![ColumnExpression::new("c", md)],
                keep_input_columns: false,
            }),
            &[src],
        )
        .unwrap();

        let errors = run(ResolveMetadataRule, &mut g, &fx);
        assert_eq!(errors.len(), 1);
        assert!(errors.has_kind(ErrorKind::Lookup));
        assert_eq!(errors.errors()[0].message, "Metadata key 'favourite_color' unavailable.");
        assert_eq!(errors.line_col_errors()[0].column, 8);
    }

    fn metadata_filter(g: &mut IrGraph, fx: &Fixture, literal: &str, swap: bool) -> (NodeId, NodeId) {
        let src = resolved_source(g, "cpu", cpu_relation());
        let md = g.add_metadata(pos(1, 5), "pod", 0);
        let lit = g.add_string(pos(1, 20), literal);
        let args = if swap { [lit, md] } else { [md, lit] };
        let eq = g.add_opcode_func(pos(1, 5), Opcode::Equal, &args).unwrap();
        g.add_operator(pos(1, 1), OperatorKind::Filter(Filter { predicate: eq }), &[src])
            .unwrap();
        assert!(run(ResolveMetadataRule, g, fx).is_empty());
        (eq, lit)
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn test_valid_literal_is_wrapped(#[case] swap: bool) {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let (eq, lit) = metadata_filter(&mut g, &fx, "pl/vizier-pem", swap);

        assert!(run(MetadataFunctionFormatRule, &mut g, &fx).is_empty());
        let wrapped = g.find_all(&metadata_literal());
        assert_eq!(wrapped.len(), 1);
        let args = &g.expression(eq).unwrap().as_func().unwrap().args;
        assert!(args.contains(&wrapped[0]));
        assert!(!args.contains(&lit));

        // Wrapped literals no longer match
        let mut errors = CompilerErrorGroup::new();
        assert!(!MetadataFunctionFormatRule.execute(&mut g, &fx.state(), &mut errors));
    }

    #[test]
    fn test_malformed_literal() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        metadata_filter(&mut g, &fx, "vizier-pem", false);

        let errors = run(MetadataFunctionFormatRule, &mut g, &fx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].code, PXL0305);
        assert_eq!(errors.line_col_errors()[0].column, 20);
        assert!(errors.errors()[0].message.contains("<namespace>/<name>"));
    }

    #[test]
    fn test_metadata_source_preference() {
        let fx = Fixture::new();
        let pod = fx.metadata.lookup("pod_name").unwrap();
        let upid = fx.metadata.lookup("upid").unwrap();

        let mut parent = cpu_relation();
        assert!(matches!(
            metadata_source(pod, &parent, "_attr_"),
            Some(MetadataSource::Convert(c)) if c.function == "upid_to_pod_name"
        ));
        assert_eq!(metadata_source(upid, &parent, "_attr_"), Some(MetadataSource::Copy("upid")));

        parent.add_column("_attr_pod_name", DataType::String);
        assert_eq!(metadata_source(pod, &parent, "_attr_"), Some(MetadataSource::Materialized));

        let bare = Relation::from_columns([("cpu0", DataType::Float64)]);
        assert_eq!(metadata_source(pod, &bare, "_attr_"), None);
    }
}
