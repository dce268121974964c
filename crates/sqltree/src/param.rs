//! Parameter storage using Arc for clone-friendly statement trees.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound value using Arc.
///
/// Cloning a tree (or a built query) never copies the underlying values.
#[derive(Clone)]
pub struct Value(Arc<dyn ToSql + Send + Sync>);

impl Value {
    /// Create a new value from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Value(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        // Dropping `Send` from the object bounds is a plain upcast.
        &*self.0 as &(dyn ToSql + Sync)
    }
}

// `ToSql` requires `Debug`, so the wrapped value prints as itself.
impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.0, f)
    }
}

/// Values bound by one build, in placeholder order.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Add a value and return its 1-based position.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get all values as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v.as_ref()).collect()
    }

    /// Consume the list, returning the values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_position() {
        let mut params = ParamList::new();
        assert!(params.is_empty());
        assert_eq!(params.push(Value::new(1i32)), 1);
        assert_eq!(params.push(Value::new("a".to_string())), 2);
        assert_eq!(params.len(), 2);
        assert_eq!(params.as_refs().len(), 2);
    }

    #[test]
    fn test_value_debug_shows_inner() {
        let v = Value::new("foo@foo".to_string());
        assert_eq!(format!("{:?}", v), "\"foo@foo\"");
        assert_eq!(format!("{:?}", Value::new(42i64)), "42");
    }

    #[test]
    fn test_clone_shares_value() {
        let v = Value::new(7i32);
        let params = {
            let mut list = ParamList::new();
            list.push(v.clone());
            list.push(v);
            list.into_values()
        };
        assert_eq!(format!("{:?}", params), "[7, 7]");
    }
}
