//! Build state, options and the two-phase build traversal.

use crate::error::{BuildError, BuildResult};
use crate::node::{Node, NodeId};
use crate::param::{ParamList, Value};
use std::collections::HashMap;
use tokio_postgres::types::ToSql;

/// Options for a single build.
///
/// The defaults number placeholders `$1, $2, ...` and anonymous aliases
/// `t1, t2, ...`.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Ordinal of the first placeholder.
    pub first_param: usize,
    /// Ordinal of the first anonymous alias.
    pub first_alias: usize,
    /// Prefix of anonymous alias names.
    pub alias_prefix: String,
    /// Truncate SQL in build logs (in bytes). `None` means no truncation.
    pub max_logged_sql: Option<usize>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            first_param: 1,
            first_alias: 1,
            alias_prefix: "t".to_string(),
            max_logged_sql: Some(200),
        }
    }
}

impl BuildOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start placeholder numbering at `n`.
    ///
    /// Useful when the built fragment is appended to SQL that already uses
    /// `$1..$n-1`.
    pub fn with_first_param(mut self, n: usize) -> Self {
        self.first_param = n;
        self
    }

    /// Start anonymous alias numbering at `n`.
    pub fn with_first_alias(mut self, n: usize) -> Self {
        self.first_alias = n;
        self
    }

    /// Set the prefix of anonymous alias names.
    pub fn with_alias_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.alias_prefix = prefix.into();
        self
    }

    /// Set maximum SQL length to log.
    pub fn with_max_logged_sql(mut self, len: usize) -> Self {
        self.max_logged_sql = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql = None;
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> BuildResult<()> {
        if self.first_param == 0 {
            return Err(BuildError::InvalidOptions(
                "first_param must be at least 1".to_string(),
            ));
        }
        if self.first_alias == 0 {
            return Err(BuildError::InvalidOptions(
                "first_alias must be at least 1".to_string(),
            ));
        }
        // Unquoted identifier rules: `[A-Za-z_][A-Za-z0-9_$]*`
        let mut chars = self.alias_prefix.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            Some(c) => {
                return Err(BuildError::InvalidOptions(format!(
                    "Invalid alias prefix start character: '{c}'"
                )));
            }
            None => {
                return Err(BuildError::InvalidOptions(
                    "alias_prefix cannot be empty".to_string(),
                ));
            }
        }
        if let Some(c) = chars.find(|&c| !(c == '_' || c == '$' || c.is_ascii_alphanumeric())) {
            return Err(BuildError::InvalidOptions(format!(
                "Invalid character in alias prefix: '{c}'"
            )));
        }
        Ok(())
    }
}

/// Mutable context threaded through one build.
///
/// Deferred names and placeholders live here, keyed by node identity, so a
/// tree can be built any number of times and every build binds it afresh.
/// Only [`build_with`] creates one, which keeps rendering behind a completed
/// traversal.
#[derive(Debug)]
pub struct BuildState {
    parameters: ParamList,
    next_alias: usize,
    next_param: usize,
    alias_prefix: String,
    aliases: HashMap<NodeId, String>,
    placeholders: HashMap<NodeId, usize>,
}

impl BuildState {
    fn new(options: &BuildOptions) -> Self {
        Self {
            parameters: ParamList::new(),
            next_alias: options.first_alias,
            next_param: options.first_param,
            alias_prefix: options.alias_prefix.clone(),
            aliases: HashMap::new(),
            placeholders: HashMap::new(),
        }
    }

    /// Bind an anonymous alias, returning its name.
    ///
    /// The first call for `id` claims the next alias ordinal; later calls
    /// return the same name.
    pub fn bind_alias(&mut self, id: NodeId) -> &str {
        let next_alias = &mut self.next_alias;
        let prefix = &self.alias_prefix;
        self.aliases.entry(id).or_insert_with(|| {
            let name = format!("{}{}", prefix, next_alias);
            *next_alias += 1;
            name
        })
        .as_str()
    }

    /// Bind a parameter, returning its placeholder ordinal.
    ///
    /// The first call for `id` claims the next placeholder and queues
    /// `value`; later calls return the same ordinal without queueing again.
    pub fn bind_param(&mut self, id: NodeId, value: &Value) -> usize {
        if let Some(&n) = self.placeholders.get(&id) {
            return n;
        }
        let n = self.next_param;
        self.next_param += 1;
        self.parameters.push(value.clone());
        self.placeholders.insert(id, n);
        n
    }

    /// Name bound to an anonymous alias, if the traversal reached it.
    pub fn alias_name(&self, id: NodeId) -> Option<&str> {
        self.aliases.get(&id).map(String::as_str)
    }

    /// Placeholder ordinal bound to a parameter, if the traversal reached it.
    pub fn placeholder(&self, id: NodeId) -> Option<usize> {
        self.placeholders.get(&id).copied()
    }

    /// Values bound so far, in placeholder order.
    pub fn parameters(&self) -> &ParamList {
        &self.parameters
    }

    /// Number of anonymous aliases bound so far.
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

/// Pre-order walk: bind the node, then its children left to right.
fn visit(node: &dyn Node, state: &mut BuildState) {
    node.bind(state);
    for child in node.children() {
        visit(child, state);
    }
}

/// The result of building a statement.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }

    /// Get parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Build `root` with default options.
pub fn build(root: &dyn Node) -> BuildResult<BuiltQuery> {
    build_with(root, &BuildOptions::default())
}

/// Build `root`: bind every node, then render the root.
pub fn build_with(root: &dyn Node, options: &BuildOptions) -> BuildResult<BuiltQuery> {
    options.validate()?;

    let mut state = BuildState::new(options);
    visit(root, &mut state);

    match root.render(&state) {
        Ok(sql) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "sqltree.build",
                param_count = state.parameters.len(),
                alias_count = state.alias_count(),
                sql = %truncate_sql(&sql, options.max_logged_sql),
                "built statement"
            );
            Ok(BuiltQuery::new(sql, state.parameters.into_values()))
        }
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(target: "sqltree.build", error = %err, "build failed");
            Err(err)
        }
    }
}

#[cfg(feature = "tracing")]
fn truncate_sql(sql: &str, max: Option<usize>) -> std::borrow::Cow<'_, str> {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end]).into()
        }
        _ => sql.into(),
    }
}

/// Build entry points for every node.
pub trait Build {
    /// Build with default options.
    fn build(&self) -> BuildResult<BuiltQuery>;

    /// Build with custom options.
    fn build_with(&self, options: &BuildOptions) -> BuildResult<BuiltQuery>;

    /// Build and keep only the SQL text.
    fn to_sql(&self) -> BuildResult<String> {
        self.build().map(|built| built.sql)
    }
}

impl<T: Node> Build for T {
    fn build(&self) -> BuildResult<BuiltQuery> {
        build_with(self, &BuildOptions::default())
    }

    fn build_with(&self, options: &BuildOptions) -> BuildResult<BuiltQuery> {
        build_with(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_param_is_idempotent() {
        let mut state = BuildState::new(&BuildOptions::default());
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_eq!(state.bind_param(a, &Value::new(1i32)), 1);
        assert_eq!(state.bind_param(b, &Value::new(2i32)), 2);
        assert_eq!(state.bind_param(a, &Value::new(1i32)), 1);
        assert_eq!(state.parameters().len(), 2);
        assert_eq!(state.placeholder(b), Some(2));
    }

    #[test]
    fn test_bind_alias_is_idempotent() {
        let mut state = BuildState::new(&BuildOptions::default());
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_eq!(state.bind_alias(a), "t1");
        assert_eq!(state.bind_alias(b), "t2");
        assert_eq!(state.bind_alias(a), "t1");
        assert_eq!(state.alias_count(), 2);
        assert_eq!(state.alias_name(NodeId::fresh()), None);
    }

    #[test]
    fn test_options_offsets() {
        let options = BuildOptions::new()
            .with_first_param(4)
            .with_first_alias(3)
            .with_alias_prefix("q");
        let mut state = BuildState::new(&options);
        assert_eq!(state.bind_param(NodeId::fresh(), &Value::new(true)), 4);
        assert_eq!(state.bind_alias(NodeId::fresh()), "q3");
        // Parameter list positions are still 1-based.
        assert_eq!(state.parameters().len(), 1);
    }

    #[test]
    fn test_log_truncation_options() {
        assert_eq!(BuildOptions::default().max_logged_sql, Some(200));
        let options = BuildOptions::new().with_max_logged_sql(16);
        assert_eq!(options.max_logged_sql, Some(16));
        let options = options.no_truncate();
        assert_eq!(options.max_logged_sql, None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        assert!(BuildOptions::new().validate().is_ok());
        assert!(BuildOptions::new().with_alias_prefix("_a$1").validate().is_ok());
        assert!(matches!(
            BuildOptions::new().with_first_param(0).validate(),
            Err(BuildError::InvalidOptions(_))
        ));
        assert!(BuildOptions::new().with_first_alias(0).validate().is_err());
        assert!(BuildOptions::new().with_alias_prefix("").validate().is_err());
        assert!(BuildOptions::new().with_alias_prefix("1t").validate().is_err());
        assert!(BuildOptions::new().with_alias_prefix("t-").validate().is_err());
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1", None), "SELECT 1");
        assert_eq!(truncate_sql("SELECT 1", Some(6)), "SELECT...");
        assert_eq!(truncate_sql("ab€", Some(3)), "ab...");
    }
}
