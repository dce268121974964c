//! The node protocol shared by every buildable unit.
//!
//! A statement is a tree of [`Node`]s. Building it happens in two phases:
//!
//! 1. a pre-order traversal calls [`Node::bind`] on every node, letting
//!    parameters claim `$n` placeholders and anonymous aliases claim names;
//! 2. the root is rendered, each node rendering its children through the
//!    completed [`BuildState`].
//!
//! [`Expr`] is the shared handle used to link nodes together. Cloning it
//! shares the node, so a parameter or alias reached through several parents
//! binds once per build.

use crate::error::{BuildError, BuildResult};
use crate::param::Value;
use crate::state::BuildState;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_postgres::types::ToSql;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a node carrying deferred state.
///
/// Clones of a node keep its id; two separately constructed nodes never
/// share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id.
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of a statement tree.
pub trait Node: fmt::Debug + Send + Sync {
    /// Child nodes in emission order.
    ///
    /// Traversal visits them left to right, so this order decides which
    /// placeholder and alias ordinals get assigned.
    fn children(&self) -> Vec<&Expr> {
        Vec::new()
    }

    /// Claim deferred state. Must be idempotent within one build.
    fn bind(&self, _state: &mut BuildState) {}

    /// Render this node. Only called after the traversal completed.
    fn render(&self, state: &BuildState) -> BuildResult<String>;
}

/// Shared handle to any node.
#[derive(Clone, Debug)]
pub struct Expr(Arc<dyn Node>);

impl Expr {
    /// Wrap a node.
    pub fn new(node: impl Node + 'static) -> Self {
        Expr(Arc::new(node))
    }

    /// Check whether two handles point at the same node.
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Node for Expr {
    fn children(&self) -> Vec<&Expr> {
        self.0.children()
    }

    fn bind(&self, state: &mut BuildState) {
        self.0.bind(state)
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        self.0.render(state)
    }
}

/// Render `exprs` and join them with `sep`.
pub(crate) fn render_joined(exprs: &[Expr], state: &BuildState, sep: &str) -> BuildResult<String> {
    let parts = exprs
        .iter()
        .map(|e| e.render(state))
        .collect::<BuildResult<Vec<_>>>()?;
    Ok(parts.join(sep))
}

// ==================== Leaves ====================

/// Verbatim SQL text. Not escaped.
#[derive(Clone, Debug)]
pub struct Literal {
    text: String,
}

impl Literal {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Node for Literal {
    fn render(&self, _state: &BuildState) -> BuildResult<String> {
        Ok(self.text.clone())
    }
}

/// A value bound to a positional `$n` placeholder.
#[derive(Clone, Debug)]
pub struct Param {
    id: NodeId,
    value: Value,
}

impl Param {
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Self::from_value(Value::new(value))
    }

    pub fn from_value(value: Value) -> Self {
        Self {
            id: NodeId::fresh(),
            value,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Node for Param {
    fn bind(&self, state: &mut BuildState) {
        state.bind_param(self.id, &self.value);
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        match state.placeholder(self.id) {
            Some(n) => Ok(format!("${}", n)),
            None => Err(BuildError::UnboundParam(self.id)),
        }
    }
}

/// Parenthesized, comma-joined operand list: `(a,b,c)`.
#[derive(Clone, Debug)]
pub struct List {
    items: Vec<Expr>,
}

impl List {
    pub fn new(items: Vec<Expr>) -> Self {
        Self { items }
    }
}

impl Node for List {
    fn children(&self) -> Vec<&Expr> {
        self.items.iter().collect()
    }

    fn render(&self, state: &BuildState) -> BuildResult<String> {
        Ok(format!("({})", render_joined(&self.items, state, ",")?))
    }
}

// ==================== Coercion ====================

/// How a plain value becomes a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Bind as a fresh `$n` parameter.
    Param,
    /// Insert as verbatim text (type names, field names, LIMIT counts).
    Literal,
}

/// Anything usable as an operand.
///
/// Nodes pass through unchanged; plain values are wrapped according to the
/// [`Coercion`] the receiving position asks for.
pub trait IntoOperand {
    fn into_operand(self, coercion: Coercion) -> Expr;
}

impl IntoOperand for Expr {
    fn into_operand(self, _coercion: Coercion) -> Expr {
        self
    }
}

impl IntoOperand for &Expr {
    fn into_operand(self, _coercion: Coercion) -> Expr {
        self.clone()
    }
}

impl IntoOperand for Value {
    fn into_operand(self, _coercion: Coercion) -> Expr {
        Expr::new(Param::from_value(self))
    }
}

macro_rules! impl_scalar_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoOperand for $ty {
                fn into_operand(self, coercion: Coercion) -> Expr {
                    match coercion {
                        Coercion::Param => Expr::new(Param::new(self)),
                        Coercion::Literal => Expr::new(Literal::new(self.to_string())),
                    }
                }
            }
        )*
    };
}

impl_scalar_operand!(i8, i16, i32, i64, u32, f32, f64, bool, String, serde_json::Value);

impl IntoOperand for &str {
    fn into_operand(self, coercion: Coercion) -> Expr {
        self.to_string().into_operand(coercion)
    }
}

impl<T: IntoOperand> IntoOperand for Vec<T> {
    fn into_operand(self, coercion: Coercion) -> Expr {
        let items = self.into_iter().map(|item| item.into_operand(coercion)).collect();
        Expr::new(List::new(items))
    }
}

impl<T: IntoOperand, const N: usize> IntoOperand for [T; N] {
    fn into_operand(self, coercion: Coercion) -> Expr {
        Vec::from(self).into_operand(coercion)
    }
}

macro_rules! impl_node_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::node::IntoOperand for $ty {
                fn into_operand(self, _coercion: $crate::node::Coercion) -> $crate::node::Expr {
                    $crate::node::Expr::new(self)
                }
            }

            impl From<$ty> for $crate::node::Expr {
                fn from(node: $ty) -> Self {
                    $crate::node::Expr::new(node)
                }
            }
        )*
    };
}

impl_node_operand!(Literal, Param, List);
pub(crate) use impl_node_operand;

/// Coerce a sequence of operands.
pub(crate) fn coerce_all<I>(items: I, coercion: Coercion) -> Vec<Expr>
where
    I: IntoIterator,
    I::Item: IntoOperand,
{
    items.into_iter().map(|item| item.into_operand(coercion)).collect()
}

/// Coerce heterogeneous operands into a `Vec<Expr>` of parameters/nodes.
///
/// ```ignore
/// let st_point = sqltree::func("ST_POINT");
/// st_point.call(sqltree::args![12.49, 41.90]);
/// let distance = sqltree::func("ST_Distance").call(sqltree::args![point, u.f("address"), true]);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$($crate::IntoOperand::into_operand($arg, $crate::Coercion::Param)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Build;

    #[test]
    fn test_literal_renders_verbatim() {
        let built = Expr::from(Literal::new("'[]'")).build().unwrap();
        assert_eq!(built.sql, "'[]'");
        assert!(built.params.is_empty());
    }

    #[test]
    fn test_param_root() {
        let built = Expr::from(Param::new(5i32)).build().unwrap();
        assert_eq!(built.sql, "$1");
        assert_eq!(format!("{:?}", built.params), "[5]");
    }

    #[test]
    fn test_list_coerces_each_item() {
        let list = vec![1i32, 2, 3].into_operand(Coercion::Param);
        let built = list.build().unwrap();
        assert_eq!(built.sql, "($1,$2,$3)");
        assert_eq!(built.params.len(), 3);

        let list = ["a", "b"].into_operand(Coercion::Literal);
        assert_eq!(list.to_sql().unwrap(), "(a,b)");
    }

    #[test]
    fn test_node_ids_are_distinct() {
        let a = Param::new(1i32);
        let b = Param::new(1i32);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_args_macro_mixes_operands() {
        let lit = Expr::from(Literal::new("x"));
        let items = args![lit, 1i32, "y"];
        let built = Expr::from(List::new(items)).build().unwrap();
        assert_eq!(built.sql, "(x,$1,$2)");
        assert_eq!(format!("{:?}", built.params), "[1, \"y\"]");
    }

    /// Renders a parameter without exposing it as a child.
    #[derive(Debug)]
    struct HiddenParam(Param);

    impl Node for HiddenParam {
        fn render(&self, state: &BuildState) -> BuildResult<String> {
            self.0.render(state)
        }
    }

    #[test]
    fn test_param_not_reached_by_traversal_is_unbound() {
        let p = Param::new(1i32);
        let id = p.id();
        let err = Expr::new(HiddenParam(p)).build().unwrap_err();
        assert_eq!(err, BuildError::UnboundParam(id));
    }

    #[test]
    fn test_ptr_eq_on_clone() {
        let e = Expr::from(Literal::new("a"));
        assert!(e.ptr_eq(&e.clone()));
        assert!(!e.ptr_eq(&Expr::from(Literal::new("a"))));
    }
}
