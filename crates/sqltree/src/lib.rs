//! # sqltree
//!
//! Composable SQL statement trees for Postgres.
//!
//! ## Features
//!
//! - **Composable**: every expression, relation and statement is a node that
//!   can be embedded in any other (subqueries, scalar selects, `EXISTS`)
//! - **Deferred aliases**: anonymous aliases are named `t1, t2, ...` at build
//!   time, in the order the statement reaches them
//! - **Shared parameters**: a parameter used at several sites binds to one
//!   `$n` placeholder and one value
//! - **Rebuildable**: binding is scoped to a single build, so a tree can be
//!   built repeatedly (or from several threads) with identical output
//! - **Safe defaults**: DELETE requires WHERE, UPDATE requires SET
//!
//! ## Example
//!
//! ```ignore
//! use sqltree::prelude::*;
//!
//! let user = sqltree::table("user");
//! let article = sqltree::table("article");
//! let u = user.alias();
//! let a = article.alias();
//!
//! let built = sqltree::query()
//!     .select([u.f("name"), count(a.f("id")).alias_as("articles").into()])
//!     .from([&u])
//!     .left_join(&a, a.f("user_id").eq(u.f("id")))
//!     .and_where(u.f("active").eq(true))
//!     .group([u.f("name")])
//!     .build()?;
//!
//! client.query(&built.sql, &built.params_ref()).await?;
//! ```

pub mod case;
pub mod error;
pub mod expr;
pub mod node;
pub mod param;
pub mod prelude;
pub mod relation;
pub mod state;
pub mod stmt;

pub use case::Case;
pub use error::{BuildError, BuildResult};
pub use expr::{Func, FuncCall, Op, OpExpr, count, now, star};
pub use node::{Coercion, Expr, IntoOperand, List, Literal, Node, NodeId, Param};
pub use param::{ParamList, Value};
pub use relation::{Alias, Table};
pub use state::{Build, BuildOptions, BuildState, BuiltQuery, build, build_with};
pub use stmt::{Delete, Insert, Join, JoinKind, Order, Query, SortDir, Update};

use tokio_postgres::types::ToSql;

/// A named table.
pub fn table(name: &str) -> Table {
    Table::new(name)
}

/// Alias `rel`: `rel AS <name>`, or `rel AS tN` named at build time when
/// `name` is `None`.
pub fn alias(rel: impl IntoOperand, name: Option<&str>) -> Alias {
    match name {
        Some(name) => Alias::named(rel, name),
        None => Alias::anonymous(rel),
    }
}

/// Start a SELECT.
pub fn query() -> Query {
    Query::new()
}

/// Start an INSERT into `rel`.
pub fn insert(rel: impl IntoOperand) -> Insert {
    Insert::new(rel)
}

/// Start an UPDATE of `rel`.
pub fn update(rel: impl IntoOperand) -> Update {
    Update::new(rel)
}

/// Start a DELETE from `rel`.
pub fn delete_from(rel: impl IntoOperand) -> Delete {
    Delete::new(rel)
}

/// Verbatim SQL. Not escaped: never pass user input.
pub fn literal(text: impl ToString) -> Expr {
    Expr::new(Literal::new(text.to_string()))
}

/// A parameter. Clone the returned expression to reuse the same `$n`.
pub fn param<T: ToSql + Send + Sync + 'static>(value: T) -> Expr {
    Expr::new(Param::new(value))
}

/// A named SQL function, e.g. `func("COALESCE").call(args![a, b])`.
pub fn func(name: &str) -> Func {
    Func::new(name)
}

/// Start a `CASE` expression with its first branch.
pub fn when(cond: impl IntoOperand, then: impl IntoOperand) -> Case {
    Case::new().when(cond, then)
}
