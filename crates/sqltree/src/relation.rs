//! Tables and aliases.

use crate::error::{BuildError, BuildResult};
use crate::node::{Coercion, Expr, IntoOperand, Literal, Node, NodeId, impl_node_operand};
use crate::state::BuildState;
use std::sync::Arc;

/// A named table.
#[derive(Clone, Debug)]
pub struct Table {
    name: Arc<str>,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(table.field)`
    pub fn f(&self, field: impl IntoOperand) -> Expr {
        Expr::new(Literal::new(&*self.name)).f(field)
    }

    /// `(table.*)`
    pub fn star(&self) -> Expr {
        self.f("*")
    }

    /// `table AS tN`, named at build time.
    pub fn alias(&self) -> Alias {
        Alias::anonymous(self.clone())
    }

    /// `table AS <name>`
    pub fn alias_as(&self, name: impl Into<String>) -> Alias {
        Alias::named(self.clone(), name)
    }
}

impl Node for Table {
    fn render(&self, _state: &BuildState) -> BuildResult<String> {
        Ok(self.name.to_string())
    }
}

/// Name of an alias.
#[derive(Clone, Debug, PartialEq, Eq)]
enum AliasName {
    /// Supplied by the caller, never consumes an ordinal.
    Named(Arc<str>),
    /// Assigned by the build that first reaches the alias.
    Anonymous,
}

/// A relation (or any expression) renamed with `AS`.
///
/// Clones share identity: every clone used in one statement renders the
/// same name.
#[derive(Clone, Debug)]
pub struct Alias {
    id: NodeId,
    rel: Expr,
    name: AliasName,
}

impl Alias {
    /// `rel AS tN`, named at build time.
    pub fn anonymous(rel: impl IntoOperand) -> Self {
        Self {
            id: NodeId::fresh(),
            rel: rel.into_operand(Coercion::Param),
            name: AliasName::Anonymous,
        }
    }

    /// `rel AS <name>`
    pub fn named(rel: impl IntoOperand, name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            id: NodeId::fresh(),
            rel: rel.into_operand(Coercion::Param),
            name: AliasName::Named(name.into()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The caller-supplied name, if any.
    pub fn explicit_name(&self) -> Option<&str> {
        match &self.name {
            AliasName::Named(name) => Some(&**name),
            AliasName::Anonymous => None,
        }
    }

    /// `(alias.field)`
    pub fn f(&self, field: impl IntoOperand) -> Expr {
        Expr::new(AliasRef {
            id: self.id,
            name: self.name.clone(),
        })
        .f(field)
    }

    /// `(alias.*)`
    pub fn star(&self) -> Expr {
        self.f("*")
    }
}

fn resolve(id: NodeId, name: &AliasName, state: &BuildState) -> BuildResult<String> {
    match name {
        AliasName::Named(name) => Ok(name.to_string()),
        AliasName::Anonymous => state
            .alias_name(id)
            .map(str::to_string)
            .ok_or(BuildError::UnboundAlias(id)),
    }
}

impl Node for Alias {
    fn children(&self) -> Vec<&Expr> {
        vec![&self.rel]
    }

    fn bind(&self, state: &mut BuildState) {
        if self.name == AliasName::Anonymous {
            state.bind_alias(self.id);
        }
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        Ok(format!(
            "{} AS {}",
            self.rel.render(state)?,
            resolve(self.id, &self.name, state)?
        ))
    }
}

/// The bare name of an alias, as used in field references.
///
/// Does not bind: the alias itself must be part of the statement.
#[derive(Clone, Debug)]
struct AliasRef {
    id: NodeId,
    name: AliasName,
}

impl Node for AliasRef {
    fn render(&self, state: &BuildState) -> BuildResult<String> {
        resolve(self.id, &self.name, state)
    }
}

impl_node_operand!(Table, Alias);

impl IntoOperand for &Table {
    fn into_operand(self, _coercion: Coercion) -> Expr {
        Expr::new(self.clone())
    }
}

impl IntoOperand for &Alias {
    fn into_operand(self, _coercion: Coercion) -> Expr {
        Expr::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Build, BuildOptions};

    #[test]
    fn test_table_builds_to_name() {
        let user = Table::new("user");
        let built = user.build().unwrap();
        assert_eq!(built.sql, "user");
        assert!(built.params.is_empty());
        assert_eq!(user.f("id").to_sql().unwrap(), "(user.id)");
        assert_eq!(user.star().to_sql().unwrap(), "(user.*)");
    }

    #[test]
    fn test_anonymous_alias_binds_once() {
        let a = Table::new("article").alias();
        let pair = crate::node::List::new(vec![Expr::from(a.clone()), (&a).into_operand(Coercion::Param)]);
        assert_eq!(Expr::from(pair).to_sql().unwrap(), "(article AS t1,article AS t1)");
    }

    #[test]
    fn test_named_alias_consumes_no_ordinal() {
        let named = Table::new("user").alias_as("u");
        let anon = Table::new("user").alias();
        assert_eq!(named.explicit_name(), Some("u"));
        assert_eq!(anon.explicit_name(), None);
        let pair = crate::node::List::new(vec![Expr::from(named), Expr::from(anon)]);
        assert_eq!(Expr::from(pair).to_sql().unwrap(), "(user AS u,user AS t1)");
    }

    #[test]
    fn test_field_through_unbound_alias_fails() {
        let a = Table::new("article").alias();
        let err = a.f("id").build().unwrap_err();
        assert_eq!(err, BuildError::UnboundAlias(a.id()));
    }

    #[test]
    fn test_field_through_named_alias_needs_no_binding() {
        let a = Table::new("article").alias_as("a");
        assert_eq!(a.f("title").to_sql().unwrap(), "(a.title)");
    }

    #[test]
    fn test_alias_prefix_option() {
        let a = Table::new("article").alias();
        let options = BuildOptions::new().with_alias_prefix("x").with_first_alias(5);
        assert_eq!(a.build_with(&options).unwrap().sql, "article AS x5");
    }

    #[test]
    fn test_rebuild_rebinds() {
        let a = Table::new("article").alias();
        assert_eq!(a.to_sql().unwrap(), "article AS t1");
        assert_eq!(a.to_sql().unwrap(), "article AS t1");
    }
}
