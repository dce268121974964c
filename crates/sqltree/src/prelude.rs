//! Convenient imports for typical `sqltree` usage.
//!
//! ```ignore
//! use sqltree::prelude::*;
//! ```

pub use crate::{
    Alias, Build, BuildError, BuildOptions, BuildResult, BuiltQuery, Expr, IntoOperand, JoinKind,
    Query, SortDir, Table, args, count, delete_from, func, insert, literal, now, param, query,
    star, table, update, when,
};
