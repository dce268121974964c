//! INSERT statement builder.

use crate::error::BuildResult;
use crate::node::{Coercion, Expr, IntoOperand, Node, coerce_all, impl_node_operand, render_joined};
use crate::state::BuildState;
use crate::stmt::{Assignments, returning_clause};

/// INSERT builder.
///
/// Renders `INSERT INTO rel (cols) VALUES (vals)`, or
/// `INSERT INTO rel DEFAULT VALUES` when no column was set.
#[derive(Clone, Debug)]
pub struct Insert {
    rel: Expr,
    assignments: Assignments,
    returning: Vec<Expr>,
}

impl Insert {
    /// Create an INSERT into `rel`.
    pub fn new(rel: impl IntoOperand) -> Self {
        Self {
            rel: rel.into_operand(Coercion::Literal),
            assignments: Assignments::default(),
            returning: Vec::new(),
        }
    }

    /// Set a column value. Setting the same column again replaces the value
    /// but keeps the column's position.
    pub fn set(mut self, column: impl Into<String>, value: impl IntoOperand) -> Self {
        self.assignments
            .set(column.into(), value.into_operand(Coercion::Param));
        self
    }

    /// Set several column values in order.
    pub fn set_many<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoOperand,
    {
        for (column, value) in pairs {
            self.assignments
                .set(column.into(), value.into_operand(Coercion::Param));
        }
        self
    }

    /// Replace the RETURNING list. Plain names are inserted verbatim.
    pub fn returning<I>(mut self, cols: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoOperand,
    {
        self.returning = coerce_all(cols, Coercion::Literal);
        self
    }
}

impl Node for Insert {
    fn children(&self) -> Vec<&Expr> {
        std::iter::once(&self.rel)
            .chain(self.assignments.values())
            .chain(&self.returning)
            .collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        let mut sql = format!("INSERT INTO {}", self.rel.render(state)?);

        if self.assignments.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let columns: Vec<&str> = self.assignments.columns().collect();
            let values: Vec<Expr> = self.assignments.values().cloned().collect();
            sql.push_str(" (");
            sql.push_str(&columns.join(", "));
            sql.push_str(") VALUES (");
            sql.push_str(&render_joined(&values, state, ", ")?);
            sql.push(')');
        }

        sql.push_str(&returning_clause(&self.returning, state)?);
        Ok(sql)
    }
}

impl_node_operand!(Insert);
