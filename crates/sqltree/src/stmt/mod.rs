//! Statement builders.
//!
//! Every statement is itself a [`Node`](crate::Node): it can be built on its
//! own, or embedded in another statement. A SELECT always renders wrapped in
//! parentheses, so it drops into any operand position as a subquery.
//!
//! # Usage
//!
//! ```ignore
//! use sqltree::prelude::*;
//!
//! let user = sqltree::table("user");
//! let u = user.alias();
//!
//! // SELECT
//! let built = sqltree::query()
//!     .select([u.f("id"), u.f("name")])
//!     .from([&u])
//!     .and_where(u.f("status").eq("active"))
//!     .order_desc(u.f("created_at"))
//!     .limit(20)
//!     .build()?;
//!
//! // INSERT
//! let built = sqltree::insert(&user)
//!     .set("username", "alice")
//!     .set("email", "alice@example.com")
//!     .returning(["id"])
//!     .build()?;
//!
//! // UPDATE
//! let built = sqltree::update(&user)
//!     .set("status", "inactive")
//!     .and_where(user.f("id").eq(user_id))
//!     .build()?;
//!
//! // DELETE (a predicate is required)
//! let built = sqltree::delete_from(&user)
//!     .and_where(user.f("id").eq(user_id))
//!     .build()?;
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use select::{Join, JoinKind, Order, Query, SortDir};
pub use update::Update;

use crate::error::BuildResult;
use crate::node::{Expr, render_joined};
use crate::state::BuildState;

/// Ordered `column -> value` mapping shared by INSERT and UPDATE.
///
/// Setting a column again replaces its value in place, so columns keep
/// first-insertion order.
#[derive(Clone, Debug, Default)]
pub(crate) struct Assignments {
    entries: Vec<(String, Expr)>,
}

impl Assignments {
    /// Returns the replaced value, if the column was already set.
    pub(crate) fn set(&mut self, column: String, value: Expr) -> Option<Expr> {
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Expr> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub(crate) fn entries(&self) -> &[(String, Expr)] {
        &self.entries
    }
}

/// ` WHERE a AND b`, or nothing.
pub(crate) fn where_clause(filters: &[Expr], state: &BuildState) -> BuildResult<String> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" WHERE {}", render_joined(filters, state, " AND ")?))
}

/// ` RETURNING a, b`, or nothing.
pub(crate) fn returning_clause(cols: &[Expr], state: &BuildState) -> BuildResult<String> {
    if cols.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" RETURNING {}", render_joined(cols, state, ", ")?))
}
