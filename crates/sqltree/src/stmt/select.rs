//! SELECT query builder.

use crate::error::BuildResult;
use crate::node::{Coercion, Expr, IntoOperand, Node, coerce_all, impl_node_operand, render_joined};
use crate::relation::Alias;
use crate::state::BuildState;
use crate::stmt::where_clause;
use std::fmt;

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
        })
    }
}

/// `<KIND> JOIN rel ON cond`
#[derive(Clone, Debug)]
pub struct Join {
    kind: JoinKind,
    rel: Expr,
    on: Expr,
}

impl Join {
    fn render(&self, state: &BuildState) -> BuildResult<String> {
        Ok(format!(
            "{} JOIN {} ON {}",
            self.kind,
            self.rel.render(state)?,
            self.on.render(state)?
        ))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        })
    }
}

/// `expr ASC|DESC`
#[derive(Clone, Debug)]
pub struct Order {
    expr: Expr,
    dir: SortDir,
}

/// SELECT query builder.
///
/// Clauses render in SQL order, but their nodes are visited in the order the
/// builder methods were called, so placeholders and alias names are numbered
/// in composition order. LIMIT and OFFSET are visited last.
#[derive(Clone, Debug, Default)]
pub struct Query {
    distinct: bool,
    select_items: Vec<Expr>,
    from_items: Vec<Expr>,
    joins: Vec<Join>,
    filters: Vec<Expr>,
    group_items: Vec<Expr>,
    having: Vec<Expr>,
    order_items: Vec<Order>,
    limit: Option<Expr>,
    offset: Option<Expr>,
    /// Clause nodes in call order
    children: Vec<Expr>,
}

impl Query {
    /// Create an empty query (`SELECT *`).
    pub fn new() -> Self {
        Self::default()
    }

    fn track(&mut self, exprs: &[Expr]) {
        self.children.extend(exprs.iter().cloned());
    }

    // ==================== SELECT ====================

    /// Append SELECT items. Without any, the query selects `*`.
    pub fn select<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoOperand,
    {
        let items = coerce_all(items, Coercion::Param);
        self.track(&items);
        self.select_items.extend(items);
        self
    }

    /// SELECT DISTINCT
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== FROM / JOIN ====================

    /// Append FROM relations.
    pub fn from<I>(mut self, rels: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoOperand,
    {
        let rels = coerce_all(rels, Coercion::Param);
        self.track(&rels);
        self.from_items.extend(rels);
        self
    }

    /// Add `<kind> JOIN rel ON cond`.
    pub fn join_with(mut self, rel: impl IntoOperand, on: impl IntoOperand, kind: JoinKind) -> Self {
        let rel = rel.into_operand(Coercion::Param);
        let on = on.into_operand(Coercion::Param);
        self.track(&[rel.clone(), on.clone()]);
        self.joins.push(Join { kind, rel, on });
        self
    }

    /// Add INNER JOIN.
    pub fn join(self, rel: impl IntoOperand, on: impl IntoOperand) -> Self {
        self.join_with(rel, on, JoinKind::Inner)
    }

    /// Add LEFT JOIN.
    pub fn left_join(self, rel: impl IntoOperand, on: impl IntoOperand) -> Self {
        self.join_with(rel, on, JoinKind::Left)
    }

    /// Add RIGHT JOIN.
    pub fn right_join(self, rel: impl IntoOperand, on: impl IntoOperand) -> Self {
        self.join_with(rel, on, JoinKind::Right)
    }

    /// Add FULL JOIN.
    pub fn full_join(self, rel: impl IntoOperand, on: impl IntoOperand) -> Self {
        self.join_with(rel, on, JoinKind::Full)
    }

    // ==================== WHERE ====================

    /// Add a WHERE predicate. Predicates are ANDed in call order.
    pub fn and_where(mut self, pred: impl IntoOperand) -> Self {
        let pred = pred.into_operand(Coercion::Param);
        self.track(std::slice::from_ref(&pred));
        self.filters.push(pred);
        self
    }

    // ==================== Grouping & Ordering ====================

    /// Append GROUP BY items.
    pub fn group<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoOperand,
    {
        let items = coerce_all(items, Coercion::Param);
        self.track(&items);
        self.group_items.extend(items);
        self
    }

    /// Add a HAVING predicate. Predicates are ANDed in call order.
    pub fn having(mut self, pred: impl IntoOperand) -> Self {
        let pred = pred.into_operand(Coercion::Param);
        self.track(std::slice::from_ref(&pred));
        self.having.push(pred);
        self
    }

    /// Add `ORDER BY expr dir`.
    pub fn order_by(mut self, expr: impl IntoOperand, dir: SortDir) -> Self {
        let expr = expr.into_operand(Coercion::Param);
        self.track(std::slice::from_ref(&expr));
        self.order_items.push(Order { expr, dir });
        self
    }

    /// Add `ORDER BY expr ASC`.
    pub fn order(self, expr: impl IntoOperand) -> Self {
        self.order_by(expr, SortDir::Asc)
    }

    /// Add `ORDER BY expr DESC`.
    pub fn order_desc(self, expr: impl IntoOperand) -> Self {
        self.order_by(expr, SortDir::Desc)
    }

    // ==================== Pagination ====================

    /// Set LIMIT. Plain values are inserted verbatim.
    pub fn limit(mut self, n: impl IntoOperand) -> Self {
        self.limit = Some(n.into_operand(Coercion::Literal));
        self
    }

    /// Set OFFSET. Plain values are inserted verbatim.
    pub fn offset(mut self, n: impl IntoOperand) -> Self {
        self.offset = Some(n.into_operand(Coercion::Literal));
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(self, page: i64, per_page: i64) -> Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.limit(size).offset((p - 1).saturating_mul(size))
    }

    // ==================== Aliasing ====================

    /// `(SELECT ...) AS tN`, named at build time.
    pub fn alias(self) -> Alias {
        Alias::anonymous(self)
    }

    /// `(SELECT ...) AS <name>`
    pub fn alias_as(self, name: impl Into<String>) -> Alias {
        Alias::named(self, name)
    }

    /// Convert into an expression, e.g. to apply `exists()`.
    pub fn into_expr(self) -> Expr {
        Expr::new(self)
    }

    // ==================== Render ====================

    fn render_clauses(&self, state: &BuildState) -> BuildResult<String> {
        let mut sql = String::from("SELECT");
        if self.distinct {
            sql.push_str(" DISTINCT");
        }
        if self.select_items.is_empty() {
            sql.push_str(" *");
        } else {
            sql.push(' ');
            sql.push_str(&render_joined(&self.select_items, state, ", ")?);
        }
        if !self.from_items.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&render_joined(&self.from_items, state, ", ")?);
        }
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render(state)?);
        }
        sql.push_str(&where_clause(&self.filters, state)?);
        if !self.group_items.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&render_joined(&self.group_items, state, ", ")?);
        }
        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&render_joined(&self.having, state, " AND ")?);
        }
        if !self.order_items.is_empty() {
            let parts = self
                .order_items
                .iter()
                .map(|o| Ok(format!("{} {}", o.expr.render(state)?, o.dir)))
                .collect::<BuildResult<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }
        if let Some(limit) = &self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.render(state)?);
        }
        if let Some(offset) = &self.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(&offset.render(state)?);
        }
        Ok(sql)
    }
}

impl Node for Query {
    fn children(&self) -> Vec<&Expr> {
        self.children
            .iter()
            .chain(self.limit.as_ref())
            .chain(self.offset.as_ref())
            .collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        Ok(format!("({})", self.render_clauses(state)?))
    }
}

impl_node_operand!(Query);

impl IntoOperand for &Query {
    fn into_operand(self, _coercion: Coercion) -> Expr {
        Expr::new(self.clone())
    }
}
