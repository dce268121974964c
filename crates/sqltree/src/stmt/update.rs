//! UPDATE statement builder.

use crate::error::{BuildError, BuildResult};
use crate::node::{Coercion, Expr, IntoOperand, Node, coerce_all, impl_node_operand};
use crate::state::BuildState;
use crate::stmt::{Assignments, returning_clause, where_clause};

/// UPDATE builder.
///
/// SET values and WHERE predicates are visited in the order the builder
/// methods were called. A value replaced by a later `set` of the same column
/// is no longer visited.
#[derive(Clone, Debug)]
pub struct Update {
    rel: Expr,
    assignments: Assignments,
    filters: Vec<Expr>,
    returning: Vec<Expr>,
    /// SET values and predicates in call order
    children: Vec<Expr>,
}

impl Update {
    /// Create an UPDATE of `rel`.
    pub fn new(rel: impl IntoOperand) -> Self {
        Self {
            rel: rel.into_operand(Coercion::Literal),
            assignments: Assignments::default(),
            filters: Vec::new(),
            returning: Vec::new(),
            children: Vec::new(),
        }
    }

    fn assign(&mut self, column: String, value: Expr) {
        self.children.push(value.clone());
        if let Some(old) = self.assignments.set(column, value) {
            if let Some(pos) = self.children.iter().position(|c| c.ptr_eq(&old)) {
                self.children.remove(pos);
            }
        }
    }

    /// Set a column value, replacing any earlier value for the column.
    pub fn set(mut self, column: impl Into<String>, value: impl IntoOperand) -> Self {
        self.assign(column.into(), value.into_operand(Coercion::Param));
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
            self.assign(column.into(), value.into_operand(Coercion::Param));
        }
        self
    }

    /// Add a WHERE predicate (ANDed).
    pub fn and_where(mut self, pred: impl IntoOperand) -> Self {
        let pred = pred.into_operand(Coercion::Param);
        self.children.push(pred.clone());
        self.filters.push(pred);
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

impl Node for Update {
    fn children(&self) -> Vec<&Expr> {
        std::iter::once(&self.rel)
            .chain(&self.children)
            .chain(&self.returning)
            .collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        if self.assignments.is_empty() {
            return Err(BuildError::malformed("UPDATE", "at least one SET column is required"));
        }

        let sets = self
            .assignments
            .entries()
            .iter()
            .map(|(column, value)| Ok(format!("{}={}", column, value.render(state)?)))
            .collect::<BuildResult<Vec<_>>>()?;

        let mut sql = format!("UPDATE {} SET {}", self.rel.render(state)?, sets.join(", "));
        sql.push_str(&where_clause(&self.filters, state)?);
        sql.push_str(&returning_clause(&self.returning, state)?);
        Ok(sql)
    }
}

impl_node_operand!(Update);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Build;
    use crate::{now, table};

    #[test]
    fn test_update_numbers_in_call_order() {
        let user = table("user");
        let built = Update::new(&user)
            .and_where(user.f("id").eq(7))
            .set("bio", "new")
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE user SET bio=$2 WHERE ((user.id) = $1)");
        assert_eq!(format!("{:?}", built.params), r#"[7, "new"]"#);
    }

    #[test]
    fn test_update_overwrite_drops_old_value() {
        let user = table("user");
        let built = Update::new(&user)
            .set("bio", "old")
            .and_where(user.f("id").eq(7))
            .set("bio", "new")
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE user SET bio=$2 WHERE ((user.id) = $1)");
        assert_eq!(format!("{:?}", built.params), r#"[7, "new"]"#);
    }

    #[test]
    fn test_update_overwrite_keeps_shared_value_of_other_column() {
        let shared = crate::param(1i32);
        let built = Update::new(table("t"))
            .set("a", &shared)
            .set("b", &shared)
            .set("a", 2)
            .build()
            .unwrap();
        assert_eq!(built.sql, "UPDATE t SET a=$2, b=$1");
        assert_eq!(format!("{:?}", built.params), "[1, 2]");
    }

    #[test]
    fn test_update_multiple_columns_and_returning() {
        let user = table("user");
        let sql = Update::new(&user)
            .set_many([("status", "inactive"), ("note", "x")])
            .set("updated_at", now())
            .and_where(user.f("id").eq(1))
            .and_where(user.f("status").ne("deleted"))
            .returning(["id", "status"])
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE user SET status=$1, note=$2, updated_at=NOW() \
             WHERE ((user.id) = $3) AND ((user.status) != $4) RETURNING id, status"
        );
    }

    #[test]
    fn test_update_without_where_is_allowed() {
        let sql = Update::new(table("t")).set("flag", true).to_sql().unwrap();
        assert_eq!(sql, "UPDATE t SET flag=$1");
    }

    #[test]
    fn test_update_without_set_fails() {
        let err = Update::new(table("t")).build().unwrap_err();
        assert!(matches!(err, BuildError::Malformed { node: "UPDATE", .. }));
    }
}
