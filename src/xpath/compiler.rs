//! XPath Expression Compiler
//!
//! Compiles parsed expressions into a flat op list for the stack machine in
//! `eval`. Compiled expressions are memoized by source text in a bounded LRU.

use super::parser::{self, Axis, BinaryOp, Expr, NodeTest, PathStart, Step};
use crate::error::XPathError;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

/// Number of compiled expressions kept in the process-wide cache
pub const COMPILED_EXPR_CACHE_SIZE: usize = 256;

const CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(COMPILED_EXPR_CACHE_SIZE) {
    Some(capacity) => capacity,
    None => panic!("compiled expression cache size must be non-zero"),
};

static COMPILED: LazyLock<Mutex<LruCache<String, Arc<CompiledExpr>>>> =
    LazyLock::new(|| Mutex::new(LruCache::new(CACHE_CAPACITY)));

/// Compiled XPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push the document node
    Root,
    /// Push the context node
    Context,
    /// Replace the node-set on top of the stack with one location step
    Step {
        axis: Axis,
        test: NodeTest,
        predicates: Vec<CompiledExpr>,
    },
    /// Filter the node-set on top of the stack, positions in document order
    Filter(Vec<CompiledExpr>),
    Union,
    Number(f64),
    String(String),
    /// Function call: name, argument count
    Call(String, usize),
    /// Non-logical binary operator over the two topmost values
    Binary(BinaryOp),
    /// `and` / `or`: the right operand only runs when the left one does not
    /// decide the result
    Logical { op: BinaryOp, rhs: Box<CompiledExpr> },
    Negate,
    Variable(String),
}

impl CompiledExpr {
    pub fn compile(expr: &Expr) -> Self {
        let mut ops = Vec::new();
        Self::compile_expr(expr, &mut ops);
        CompiledExpr { ops }
    }

    fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) {
        match expr {
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::Literal(s) => ops.push(Op::String(s.clone())),
            Expr::Variable(name) => ops.push(Op::Variable(name.clone())),
            Expr::Negate(inner) => {
                Self::compile_expr(inner, ops);
                ops.push(Op::Negate);
            }
            Expr::Binary(left, op @ (BinaryOp::And | BinaryOp::Or), right) => {
                Self::compile_expr(left, ops);
                ops.push(Op::Logical {
                    op: *op,
                    rhs: Box::new(CompiledExpr::compile(right)),
                });
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Binary(*op));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, ops);
                Self::compile_expr(right, ops);
                ops.push(Op::Union);
            }
            Expr::Function(name, args) => {
                for arg in args {
                    Self::compile_expr(arg, ops);
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
            Expr::Filter(primary, predicates) => {
                Self::compile_expr(primary, ops);
                ops.push(Op::Filter(predicates.iter().map(CompiledExpr::compile).collect()));
            }
            Expr::Path(start, steps) => {
                match start {
                    PathStart::Root => ops.push(Op::Root),
                    PathStart::Context => ops.push(Op::Context),
                    PathStart::Expr(inner) => Self::compile_expr(inner, ops),
                }
                for step in steps {
                    Self::compile_step(step, ops);
                }
            }
        }
    }

    fn compile_step(step: &Step, ops: &mut Vec<Op>) {
        ops.push(Op::Step {
            axis: step.axis,
            test: step.node_test.clone(),
            predicates: step.predicates.iter().map(CompiledExpr::compile).collect(),
        });
    }
}

/// Compile an XPath expression string
pub fn compile(xpath: &str) -> Result<CompiledExpr, XPathError> {
    let expr = parser::parse(xpath)?;
    Ok(CompiledExpr::compile(&expr))
}

/// Compile through the process-wide cache. Failures are not cached.
pub fn compile_cached(xpath: &str) -> Result<Arc<CompiledExpr>, XPathError> {
    if let Some(hit) = COMPILED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(xpath)
    {
        return Ok(Arc::clone(hit));
    }

    let compiled = Arc::new(compile(xpath)?);
    COMPILED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .put(xpath.to_string(), Arc::clone(&compiled));
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple() {
        let compiled = compile("/root").unwrap();
        assert_eq!(compiled.ops.len(), 2);
        assert!(matches!(compiled.ops[0], Op::Root));
        assert!(matches!(compiled.ops[1], Op::Step { axis: Axis::Child, .. }));
    }

    #[test]
    fn test_step_keeps_its_predicates() {
        let compiled = compile("a[1][@b]").unwrap();
        match &compiled.ops[1] {
            Op::Step { predicates, .. } => assert_eq!(predicates.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_logical_is_short_circuit() {
        let compiled = compile("true() or $x").unwrap();
        assert!(matches!(
            compiled.ops.last(),
            Some(Op::Logical { op: BinaryOp::Or, .. })
        ));
    }

    #[test]
    fn test_cache_returns_shared_expression() {
        let first = compile_cached("//cached-expression-test").unwrap();
        let second = compile_cached("//cached-expression-test").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(compile_cached("//[").is_err());
    }
}
