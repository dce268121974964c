//! `CASE WHEN ... THEN ... ELSE ... END`

use crate::error::BuildResult;
use crate::node::{Coercion, Expr, IntoOperand, Node, impl_node_operand};
use crate::state::BuildState;

/// One `WHEN cond THEN result` branch.
#[derive(Clone, Debug)]
struct When {
    cond: Expr,
    then: Expr,
}

/// Conditional expression builder.
///
/// ```ignore
/// let label = sqltree::when(u.f("age").lt(18), "minor")
///     .when(u.f("age").ge(65), "senior")
///     .otherwise("adult")
///     .end();
/// ```
#[derive(Clone, Debug, Default)]
pub struct Case {
    branches: Vec<When>,
    otherwise: Option<Expr>,
}

impl Case {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `WHEN cond THEN result` branch.
    pub fn when(mut self, cond: impl IntoOperand, then: impl IntoOperand) -> Self {
        let cond = cond.into_operand(Coercion::Param);
        let then = then.into_operand(Coercion::Param);
        self.branches.push(When { cond, then });
        self
    }

    /// Set the `ELSE` result, replacing any previous one.
    pub fn otherwise(mut self, result: impl IntoOperand) -> Self {
        self.otherwise = Some(result.into_operand(Coercion::Param));
        self
    }

    /// Finish the expression.
    pub fn end(self) -> Expr {
        Expr::new(self)
    }
}

impl Node for Case {
    fn children(&self) -> Vec<&Expr> {
        self.branches
            .iter()
            .flat_map(|b| [&b.cond, &b.then])
            .chain(self.otherwise.as_ref())
            .collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        let mut sql = String::from("CASE");
        for branch in &self.branches {
            sql.push_str(" WHEN ");
            sql.push_str(&branch.cond.render(state)?);
            sql.push_str(" THEN ");
            sql.push_str(&branch.then.render(state)?);
        }
        if let Some(otherwise) = &self.otherwise {
            sql.push_str(" ELSE ");
            sql.push_str(&otherwise.render(state)?);
        }
        sql.push_str(" END");
        Ok(sql)
    }
}

impl_node_operand!(Case);
