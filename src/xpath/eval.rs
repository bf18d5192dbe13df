//! XPath Evaluation Engine
//!
//! Evaluates compiled expressions against any `DocumentAccess`
//! implementation. Location steps apply their predicates per context node,
//! so `position()` counts along the step's axis.

use super::axes::{attribute_values, matches_node_test, navigate};
use super::compiler::{compile_cached, CompiledExpr, Op};
use super::functions;
use super::parser::{Axis, BinaryOp, NodeTest};
use super::value::{string_to_number, XPathValue};
use crate::dom::namespace::XML_NAMESPACE;
use crate::dom::{node_string_value, DocumentAccess, NodeId};
use crate::error::XPathError;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Prefix to namespace URI bindings used by qualified name tests
pub trait NamespaceContext {
    fn lookup_namespace(&self, prefix: &str) -> Option<&str>;
}

/// Only the always-bound `xml` prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNamespaces;

impl NamespaceContext for NoNamespaces {
    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        (prefix == "xml").then_some(XML_NAMESPACE)
    }
}

impl<S: BuildHasher> NamespaceContext for HashMap<String, String, S> {
    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        match self.get(prefix) {
            Some(uri) => Some(uri.as_str()),
            None => NoNamespaces.lookup_namespace(prefix),
        }
    }
}

/// Evaluation context - generic over document type
pub struct EvalContext<'a, D> {
    pub doc: &'a D,
    pub node: NodeId,
    pub position: usize,
    pub size: usize,
    pub namespaces: &'a dyn NamespaceContext,
}

impl<'a, D> EvalContext<'a, D> {
    fn at(&self, node: NodeId, position: usize, size: usize) -> Self {
        EvalContext {
            doc: self.doc,
            node,
            position,
            size,
            namespaces: self.namespaces,
        }
    }
}

/// Evaluate with the document node as context and no namespace bindings
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate<D: DocumentAccess>(doc: &D, xpath: &str) -> Result<XPathValue, XPathError> {
    evaluate_with(doc, doc.document_node_id(), xpath, &NoNamespaces)
}

/// Evaluate from a specific context node with the given prefix bindings
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_with<D: DocumentAccess>(
    doc: &D,
    context: NodeId,
    xpath: &str,
    namespaces: &dyn NamespaceContext,
) -> Result<XPathValue, XPathError> {
    let compiled = compile_cached(xpath)?;
    let ctx = EvalContext {
        doc,
        node: context,
        position: 1,
        size: 1,
        namespaces,
    };
    evaluate_compiled(&compiled, &ctx)
}

pub fn evaluate_compiled<D: DocumentAccess>(
    expr: &CompiledExpr,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, XPathError> {
    let doc = ctx.doc;
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        let value = match op {
            Op::Root => XPathValue::single_node(doc.document_node_id()),
            Op::Context => XPathValue::single_node(ctx.node),
            Op::Step {
                axis,
                test,
                predicates,
            } => {
                let input = pop_nodeset(&mut stack)?;
                apply_step(ctx, input, *axis, test, predicates)?
            }
            Op::Filter(predicates) => {
                let mut nodes = pop_nodeset(&mut stack)?;
                for predicate in predicates {
                    nodes = filter(ctx, nodes, predicate)?;
                }
                XPathValue::NodeSet(nodes)
            }
            Op::Union => {
                let right = pop_nodeset(&mut stack)?;
                let mut left = pop_nodeset(&mut stack)?;
                left.extend(right);
                left.sort_unstable();
                left.dedup();
                XPathValue::NodeSet(left)
            }
            Op::Number(n) => XPathValue::Number(*n),
            Op::String(s) => XPathValue::String(s.clone()),
            Op::Call(name, argc) => {
                let args = stack.split_off(stack.len().saturating_sub(*argc));
                functions::call(name, args, ctx)?
            }
            Op::Binary(op) => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.pop().unwrap_or_default();
                binary(doc, *op, &left, &right)
            }
            Op::Logical { op, rhs } => {
                let left = stack.pop().unwrap_or_default().to_boolean();
                let result = match op {
                    BinaryOp::And => left && evaluate_compiled(rhs, ctx)?.to_boolean(),
                    _ => left || evaluate_compiled(rhs, ctx)?.to_boolean(),
                };
                XPathValue::Boolean(result)
            }
            Op::Negate => {
                let value = stack.pop().unwrap_or_default();
                XPathValue::Number(-value.to_number(doc))
            }
            Op::Variable(name) => return Err(XPathError::UnboundVariable(name.clone())),
        };
        stack.push(value);
    }

    Ok(stack.pop().unwrap_or_default())
}

fn pop_nodeset(stack: &mut Vec<XPathValue>) -> Result<Vec<NodeId>, XPathError> {
    match stack.pop().unwrap_or_default() {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(XPathError::Type(other.type_name())),
    }
}

fn apply_step<D: DocumentAccess>(
    ctx: &EvalContext<'_, D>,
    input: Vec<NodeId>,
    axis: Axis,
    test: &NodeTest,
    predicates: &[CompiledExpr],
) -> Result<XPathValue, XPathError> {
    if axis == Axis::Attribute {
        if !predicates.is_empty() {
            return Err(XPathError::Type("attribute values"));
        }
        let mut values = Vec::new();
        for node in input {
            values.extend(attribute_values(ctx.doc, node, test, ctx.namespaces)?);
        }
        return Ok(XPathValue::StringList(values));
    }

    let mut result = Vec::new();
    for node in input {
        let mut candidates = Vec::new();
        for candidate in navigate(ctx.doc, node, axis) {
            if matches_node_test(ctx.doc, candidate, test, ctx.namespaces)? {
                candidates.push(candidate);
            }
        }
        for predicate in predicates {
            candidates = filter(ctx, candidates, predicate)?;
        }
        result.extend(candidates);
    }
    // ids are assigned in document order
    result.sort_unstable();
    result.dedup();
    Ok(XPathValue::NodeSet(result))
}

/// Keep the nodes for which the predicate holds. A numeric predicate
/// selects by position.
fn filter<D: DocumentAccess>(
    ctx: &EvalContext<'_, D>,
    nodes: Vec<NodeId>,
    predicate: &CompiledExpr,
) -> Result<Vec<NodeId>, XPathError> {
    let size = nodes.len();
    let mut kept = Vec::with_capacity(size);
    for (index, node) in nodes.into_iter().enumerate() {
        let position = index + 1;
        let keep = match evaluate_compiled(predicate, &ctx.at(node, position, size))? {
            XPathValue::Number(n) => n == position as f64,
            other => other.to_boolean(),
        };
        if keep {
            kept.push(node);
        }
    }
    Ok(kept)
}

fn binary<D: DocumentAccess>(
    doc: &D,
    op: BinaryOp,
    left: &XPathValue,
    right: &XPathValue,
) -> XPathValue {
    match op {
        BinaryOp::Add => XPathValue::Number(left.to_number(doc) + right.to_number(doc)),
        BinaryOp::Sub => XPathValue::Number(left.to_number(doc) - right.to_number(doc)),
        BinaryOp::Mul => XPathValue::Number(left.to_number(doc) * right.to_number(doc)),
        BinaryOp::Div => XPathValue::Number(left.to_number(doc) / right.to_number(doc)),
        BinaryOp::Mod => XPathValue::Number(left.to_number(doc) % right.to_number(doc)),
        _ => XPathValue::Boolean(compare(doc, op, left, right)),
    }
}

/// String values of a node-set or attribute list; `None` for scalars
fn atoms<D: DocumentAccess>(doc: &D, value: &XPathValue) -> Option<Vec<String>> {
    match value {
        XPathValue::NodeSet(nodes) => {
            Some(nodes.iter().map(|&n| node_string_value(doc, n)).collect())
        }
        XPathValue::StringList(values) => Some(values.clone()),
        _ => None,
    }
}

/// XPath 1.0 comparison, including the existential node-set rules
fn compare<D: DocumentAccess>(
    doc: &D,
    op: BinaryOp,
    left: &XPathValue,
    right: &XPathValue,
) -> bool {
    match (atoms(doc, left), atoms(doc, right)) {
        (Some(l), Some(r)) => l
            .iter()
            .any(|a| r.iter().any(|b| compare_strings(op, a, b))),
        (Some(l), None) => compare_set(doc, op, &l, right),
        (None, Some(r)) => compare_set(doc, op.flip(), &r, left),
        (None, None) => compare_scalars(doc, op, left, right),
    }
}

fn compare_set<D: DocumentAccess>(
    doc: &D,
    op: BinaryOp,
    set: &[String],
    scalar: &XPathValue,
) -> bool {
    match scalar {
        XPathValue::Boolean(_) => {
            compare_scalars(doc, op, &XPathValue::Boolean(!set.is_empty()), scalar)
        }
        XPathValue::Number(n) => set
            .iter()
            .any(|s| compare_numbers(op, string_to_number(s), *n)),
        XPathValue::String(s) => set.iter().any(|a| compare_strings(op, a, s)),
        XPathValue::NodeSet(_) | XPathValue::StringList(_) => false,
    }
}

fn compare_strings(op: BinaryOp, a: &str, b: &str) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        _ => compare_numbers(op, string_to_number(a), string_to_number(b)),
    }
}

fn compare_scalars<D: DocumentAccess>(
    doc: &D,
    op: BinaryOp,
    left: &XPathValue,
    right: &XPathValue,
) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = match (left, right) {
                (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
                    left.to_boolean() == right.to_boolean()
                }
                (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
                    left.to_number(doc) == right.to_number(doc)
                }
                _ => left.to_string_value(doc) == right.to_string_value(doc),
            };
            equal == (op == BinaryOp::Eq)
        }
        _ => compare_numbers(op, left.to_number(doc), right.to_number(doc)),
    }
}

fn compare_numbers(op: BinaryOp, a: f64, b: f64) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::GtEq => a >= b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use rstest::rstest;

    const LIBRARY: &[u8] = br#"<library xmlns:b="urn:books">
        <shelf n="1"><book id="b1" year="1999">Alpha</book><book id="b2" year="2005">Beta</book></shelf>
        <shelf n="2"><book id="b3" year="2010">Gamma</book><b:note>ns</b:note></shelf>
    </library>"#;

    fn doc() -> XmlDocument {
        XmlDocument::parse(LIBRARY).unwrap()
    }

    fn texts(doc: &XmlDocument, value: XPathValue) -> Vec<String> {
        value
            .into_nodeset()
            .unwrap()
            .into_iter()
            .map(|n| node_string_value(doc, n))
            .collect()
    }

    #[rstest]
    #[case("/library/shelf/book", &["Alpha", "Beta", "Gamma"])]
    #[case("//book[2]", &["Beta"])]
    #[case("(//book)[last()]", &["Gamma"])]
    #[case("//book[@year > 2000]", &["Beta", "Gamma"])]
    #[case("//shelf[@n='2']/book", &["Gamma"])]
    #[case("//book[. = 'Alpha'] | //book[@id='b3']", &["Alpha", "Gamma"])]
    #[case("//book[3]", &[])]
    #[case("//book[following-sibling::book]", &["Alpha"])]
    #[case("//book[last()]/preceding::book[1]", &["Alpha", "Beta"])]
    fn test_paths(#[case] xpath: &str, #[case] expected: &[&str]) {
        let doc = doc();
        assert_eq!(texts(&doc, evaluate(&doc, xpath).unwrap()), expected);
    }

    #[rstest]
    #[case("count(//book)", 3.0)]
    #[case("1 + 2 * 3", 7.0)]
    #[case("7 mod 3", 1.0)]
    #[case("-(4 div 2)", -2.0)]
    #[case("sum(//book/@year)", 6014.0)]
    fn test_numbers(#[case] xpath: &str, #[case] expected: f64) {
        let doc = doc();
        assert_eq!(evaluate(&doc, xpath).unwrap(), XPathValue::Number(expected));
    }

    #[rstest]
    #[case("//book/@id = 'b2'", true)]
    #[case("//book/@id != 'b2'", true)]
    #[case("//book = 'Delta'", false)]
    #[case("//shelf/@n < 2", true)]
    #[case("2 > //shelf/@n", true)]
    #[case("//missing = false()", true)]
    #[case("'1' = 1.0", true)]
    #[case("true() = 'x'", true)]
    #[case("false() and $undefined", false)]
    fn test_comparisons(#[case] xpath: &str, #[case] expected: bool) {
        let doc = doc();
        assert_eq!(evaluate(&doc, xpath).unwrap(), XPathValue::Boolean(expected));
    }

    #[test]
    fn test_attribute_axis_yields_strings() {
        let doc = doc();
        assert_eq!(
            evaluate(&doc, "//book/@id").unwrap(),
            XPathValue::StringList(vec!["b1".into(), "b2".into(), "b3".into()])
        );
    }

    #[test]
    fn test_context_node_and_namespaces() {
        let doc = doc();
        let shelf = evaluate(&doc, "//shelf[2]").unwrap().into_nodeset().unwrap()[0];
        let value = evaluate_with(&doc, shelf, "book", &NoNamespaces).unwrap();
        assert_eq!(texts(&doc, value), ["Gamma"]);

        let mut ns = HashMap::new();
        ns.insert("x".to_string(), "urn:books".to_string());
        let value = evaluate_with(&doc, shelf, "x:note", &ns).unwrap();
        assert_eq!(texts(&doc, value), ["ns"]);
        assert_eq!(
            evaluate_with(&doc, shelf, "x:note", &NoNamespaces),
            Err(XPathError::UnboundPrefix("x".to_string()))
        );
    }

    #[test]
    fn test_errors() {
        let doc = doc();
        assert!(matches!(
            evaluate(&doc, "$v"),
            Err(XPathError::UnboundVariable(_))
        ));
        assert!(matches!(
            evaluate(&doc, "'a'/b"),
            Err(XPathError::Type("string"))
        ));
        assert!(matches!(evaluate(&doc, "//["), Err(XPathError::Syntax { .. })));
    }
}
