use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name tables that drive method classification and the call-rewrite passes.
///
/// Everything the synthesizer matches against lives here so the rule set can
/// be swapped out per project (and exercised in tests) instead of being baked
/// into the visitors as string literals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRules {
    /// Suffix that marks the non-blocking variant of a method (`send` / `send_async`).
    pub async_suffix: String,
    /// Prefix that marks a method as internal; internal methods are never
    /// synthesis targets.
    pub private_prefix: String,
    /// `self.<name>(..)` calls renamed to their non-blocking alias
    /// (e.g. an internal dispatch helper with a hand-written async twin).
    pub dispatch_aliases: BTreeMap<String, String>,
    /// Type names whose associated-function references passed as call
    /// arguments get the async suffix (`PgmqOperation::send` ->
    /// `PgmqOperation::send_async`).
    pub operation_types: BTreeSet<String>,
    /// Local variable names conventionally bound to the database session.
    pub resource_vars: BTreeSet<String>,
    /// Methods on a resource variable that become suspension points.
    pub awaited_methods: BTreeSet<String>,
    /// Blocking resource types rewritten to their non-blocking counterparts
    /// in parameter position (`Session` -> `AsyncSession`).
    pub resource_types: BTreeMap<String, String>,
    /// Receiver names whose calls inside doc-comment examples are rewritten.
    pub doc_receivers: BTreeSet<String>,
    /// Words whose presence in a doc comment counts as an asynchrony marker.
    pub async_marker_words: Vec<String>,
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            async_suffix: "_async".to_string(),
            private_prefix: "_".to_string(),
            dispatch_aliases: BTreeMap::from([(
                "_execute_operation".to_string(),
                "_execute_async_operation".to_string(),
            )]),
            operation_types: BTreeSet::from(["PgmqOperation".to_string()]),
            resource_vars: BTreeSet::from(["session".to_string()]),
            awaited_methods: BTreeSet::from(["execute".to_string(), "commit".to_string()]),
            resource_types: BTreeMap::from([("Session".to_string(), "AsyncSession".to_string())]),
            doc_receivers: BTreeSet::from(["client".to_string(), "pgmq_client".to_string()]),
            async_marker_words: vec!["async".to_string(), "await".to_string()],
        }
    }
}

impl RewriteRules {
    pub fn is_internal(&self, name: &str) -> bool {
        name.starts_with(&self.private_prefix)
    }

    pub fn is_non_blocking(&self, name: &str) -> bool {
        name.ends_with(&self.async_suffix)
    }

    /// Method name with the async suffix stripped when present.
    pub fn base_name<'a>(&self, name: &'a str) -> &'a str {
        name.strip_suffix(&self.async_suffix).unwrap_or(name)
    }

    pub fn async_name(&self, base: &str) -> String {
        format!("{base}{}", self.async_suffix)
    }

    pub fn has_async_marker(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.async_marker_words.iter().any(|w| lower.contains(w))
    }
}
