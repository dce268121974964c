//! Expression algebra.
//!
//! Every operator builds a new [`OpExpr`] node whose children are the left
//! operand followed by the coerced right operands. Right operands that are
//! not nodes become parameters, except in positions that only accept raw
//! SQL (cast targets, `EXTRACT` fields, field names) where they become
//! literals.
//!
//! ```ignore
//! let u = sqltree::table("users").alias();
//! let pred = u.f("age").ge(18).and(u.f("name").ilike("%ann%"));
//! // ((t1.age) >= $1) AND ((t1.name) ILIKE $2), wrapped in parentheses
//! ```

use crate::error::{BuildError, BuildResult};
use crate::node::{Coercion, Expr, IntoOperand, Literal, Node, coerce_all, impl_node_operand, render_joined};
use crate::relation::Alias;
use crate::state::BuildState;
use std::sync::Arc;

/// Operator rendering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `(OP e)`: NOT, EXISTS, NOT EXISTS
    Prefix(&'static str),
    /// `(e OP)`: IS NULL, IS NOT NULL
    Postfix(&'static str),
    /// `(l OP r)`
    Binary(&'static str),
    /// `(e BETWEEN lo AND hi)`
    Between,
    /// `(EXTRACT (field FROM e))`
    Extract,
    /// `(CAST (e AS type))`
    Cast,
    /// `DISTINCT e`
    Distinct,
    /// `(e.field)`
    Field,
}

impl Op {
    /// Number of operands including the left one.
    fn arity(self) -> usize {
        match self {
            Op::Prefix(_) | Op::Postfix(_) | Op::Distinct => 1,
            Op::Binary(_) | Op::Extract | Op::Cast | Op::Field => 2,
            Op::Between => 3,
        }
    }

    /// Coercion applied to right operands.
    fn coercion(self) -> Coercion {
        match self {
            Op::Extract | Op::Cast | Op::Field => Coercion::Literal,
            _ => Coercion::Param,
        }
    }

    fn format(self, parts: &[String]) -> BuildResult<String> {
        if parts.len() != self.arity() {
            return Err(BuildError::malformed(
                "operator",
                format!("{:?} takes {} operands, got {}", self, self.arity(), parts.len()),
            ));
        }
        let sql = match self {
            Op::Prefix(op) => format!("({} {})", op, parts[0]),
            Op::Postfix(op) => format!("({} {})", parts[0], op),
            Op::Binary(op) => format!("({} {} {})", parts[0], op, parts[1]),
            Op::Between => format!("({} BETWEEN {} AND {})", parts[0], parts[1], parts[2]),
            Op::Extract => format!("(EXTRACT ({} FROM {}))", parts[1], parts[0]),
            Op::Cast => format!("(CAST ({} AS {}))", parts[0], parts[1]),
            Op::Distinct => format!("DISTINCT {}", parts[0]),
            Op::Field => format!("({}.{})", parts[0], parts[1]),
        };
        Ok(sql)
    }
}

/// An operator applied to its operands.
#[derive(Clone, Debug)]
pub struct OpExpr {
    op: Op,
    operands: Vec<Expr>,
}

impl OpExpr {
    pub fn new(op: Op, operands: Vec<Expr>) -> Self {
        Self { op, operands }
    }
}

impl Node for OpExpr {
    fn children(&self) -> Vec<&Expr> {
        self.operands.iter().collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        let parts = self
            .operands
            .iter()
            .map(|e| e.render(state))
            .collect::<BuildResult<Vec<_>>>()?;
        self.op.format(&parts)
    }
}

impl Expr {
    /// Apply `op` with `self` as the left operand.
    pub fn apply<I>(self, op: Op, rhs: I) -> Expr
    where
        I: IntoIterator,
        I::Item: IntoOperand,
    {
        let mut operands = vec![self];
        operands.extend(coerce_all(rhs, op.coercion()));
        Expr::new(OpExpr::new(op, operands))
    }

    fn unary(self, op: Op) -> Expr {
        Expr::new(OpExpr::new(op, vec![self]))
    }

    /// `(self <op> rhs)` with a caller-chosen operator, e.g. `||` or `@>`.
    pub fn binary(self, op: &'static str, rhs: impl IntoOperand) -> Expr {
        self.apply(Op::Binary(op), [rhs])
    }

    // ==================== Boolean ====================

    /// `(NOT self)`
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        self.unary(Op::Prefix("NOT"))
    }

    /// `(self AND rhs)`
    pub fn and(self, rhs: impl IntoOperand) -> Expr {
        self.binary("AND", rhs)
    }

    /// `(self OR rhs)`
    pub fn or(self, rhs: impl IntoOperand) -> Expr {
        self.binary("OR", rhs)
    }

    // ==================== Comparison ====================

    /// `(self < rhs)`
    pub fn lt(self, rhs: impl IntoOperand) -> Expr {
        self.binary("<", rhs)
    }

    /// `(self <= rhs)`
    pub fn le(self, rhs: impl IntoOperand) -> Expr {
        self.binary("<=", rhs)
    }

    /// `(self > rhs)`
    pub fn gt(self, rhs: impl IntoOperand) -> Expr {
        self.binary(">", rhs)
    }

    /// `(self >= rhs)`
    pub fn ge(self, rhs: impl IntoOperand) -> Expr {
        self.binary(">=", rhs)
    }

    /// `(self = rhs)`
    pub fn eq(self, rhs: impl IntoOperand) -> Expr {
        self.binary("=", rhs)
    }

    /// `(self != rhs)`
    pub fn ne(self, rhs: impl IntoOperand) -> Expr {
        self.binary("!=", rhs)
    }

    /// `(self BETWEEN lo AND hi)`
    pub fn between(self, lo: impl IntoOperand, hi: impl IntoOperand) -> Expr {
        let operands = vec![self, lo.into_operand(Coercion::Param), hi.into_operand(Coercion::Param)];
        Expr::new(OpExpr::new(Op::Between, operands))
    }

    /// `(self IN rhs)`. A sequence becomes a parameter list, a query a subquery.
    pub fn in_list(self, rhs: impl IntoOperand) -> Expr {
        self.binary("IN", rhs)
    }

    /// `(self LIKE pattern)`
    pub fn like(self, pattern: impl IntoOperand) -> Expr {
        self.binary("LIKE", pattern)
    }

    /// `(self ILIKE pattern)`
    pub fn ilike(self, pattern: impl IntoOperand) -> Expr {
        self.binary("ILIKE", pattern)
    }

    /// `(self IS NULL)`
    pub fn is_null(self) -> Expr {
        self.unary(Op::Postfix("IS NULL"))
    }

    /// `(self IS NOT NULL)`
    pub fn not_null(self) -> Expr {
        self.unary(Op::Postfix("IS NOT NULL"))
    }

    /// `(EXISTS self)`
    pub fn exists(self) -> Expr {
        self.unary(Op::Prefix("EXISTS"))
    }

    /// `(NOT EXISTS self)`
    pub fn not_exists(self) -> Expr {
        self.unary(Op::Prefix("NOT EXISTS"))
    }

    // ==================== Arithmetic ====================

    /// `(self + rhs)`
    pub fn plus(self, rhs: impl IntoOperand) -> Expr {
        self.binary("+", rhs)
    }

    /// `(self - rhs)`
    pub fn minus(self, rhs: impl IntoOperand) -> Expr {
        self.binary("-", rhs)
    }

    /// `(self * rhs)`
    pub fn mult(self, rhs: impl IntoOperand) -> Expr {
        self.binary("*", rhs)
    }

    // ==================== Raw-SQL positions ====================

    /// `(EXTRACT (field FROM self))`; `field` is inserted verbatim.
    pub fn extract(self, field: impl IntoOperand) -> Expr {
        self.apply(Op::Extract, [field])
    }

    /// `(CAST (self AS ty))`; `ty` is inserted verbatim.
    pub fn cast(self, ty: impl IntoOperand) -> Expr {
        self.apply(Op::Cast, [ty])
    }

    /// `(self.field)`; `field` is inserted verbatim.
    pub fn f(self, field: impl IntoOperand) -> Expr {
        self.apply(Op::Field, [field])
    }

    /// `DISTINCT self`, e.g. inside `COUNT(...)`.
    pub fn distinct(self) -> Expr {
        self.unary(Op::Distinct)
    }

    // ==================== Aliasing ====================

    /// `self AS <name>`
    pub fn alias_as(self, name: impl Into<String>) -> Alias {
        Alias::named(self, name)
    }

    /// `self AS tN`, named at build time.
    pub fn alias(self) -> Alias {
        Alias::anonymous(self)
    }
}

// ==================== Functions ====================

/// A named SQL function.
///
/// ```ignore
/// let coalesce = sqltree::func("COALESCE");
/// let name = coalesce.call(sqltree::args![u.f("nick"), u.f("name"), "anonymous"]);
/// ```
#[derive(Clone, Debug)]
pub struct Func {
    name: Arc<str>,
}

impl Func {
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `name(arg, ...)`; plain values become parameters.
    pub fn call<I>(&self, args: I) -> Expr
    where
        I: IntoIterator,
        I::Item: IntoOperand,
    {
        Expr::new(FuncCall {
            name: self.name.clone(),
            args: coerce_all(args, Coercion::Param),
        })
    }
}

/// A function applied to its arguments.
#[derive(Clone, Debug)]
pub struct FuncCall {
    name: Arc<str>,
    args: Vec<Expr>,
}

impl Node for FuncCall {
    fn children(&self) -> Vec<&Expr> {
        self.args.iter().collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        Ok(format!("{}({})", self.name, render_joined(&self.args, state, ", ")?))
    }
}

impl_node_operand!(OpExpr, FuncCall);

/// `NOW()`
pub fn now() -> Expr {
    Func::new("NOW").call(Vec::<Expr>::new())
}

/// `COUNT(arg)`
pub fn count(arg: impl IntoOperand) -> Expr {
    Func::new("COUNT").call([arg])
}

/// `*`, for `COUNT(*)`.
pub fn star() -> Expr {
    Expr::new(Literal::new("*"))
}
