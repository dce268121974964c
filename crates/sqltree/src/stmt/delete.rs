//! DELETE statement builder.

use crate::error::{BuildError, BuildResult};
use crate::node::{Coercion, Expr, IntoOperand, Node, coerce_all, impl_node_operand};
use crate::state::BuildState;
use crate::stmt::{returning_clause, where_clause};

/// DELETE builder.
///
/// Building without any WHERE predicate fails with
/// [`BuildError::MassOperation`].
#[derive(Clone, Debug)]
pub struct Delete {
    rel: Expr,
    filters: Vec<Expr>,
    returning: Vec<Expr>,
}

impl Delete {
    /// Create a DELETE from `rel`.
    pub fn new(rel: impl IntoOperand) -> Self {
        Self {
            rel: rel.into_operand(Coercion::Literal),
            filters: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Add a WHERE predicate (ANDed).
    pub fn and_where(mut self, pred: impl IntoOperand) -> Self {
        self.filters.push(pred.into_operand(Coercion::Param));
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

impl Node for Delete {
    fn children(&self) -> Vec<&Expr> {
        std::iter::once(&self.rel)
            .chain(&self.filters)
            .chain(&self.returning)
            .collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        if self.filters.is_empty() {
            return Err(BuildError::MassOperation { statement: "DELETE" });
        }

        let mut sql = format!("DELETE FROM {}", self.rel.render(state)?);
        sql.push_str(&where_clause(&self.filters, state)?);
        sql.push_str(&returning_clause(&self.returning, state)?);
        Ok(sql)
    }
}

impl_node_operand!(Delete);
