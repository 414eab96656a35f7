//! # Bundle Options
//!
//! Configuration handed to the bundler by the schema-loading layer. The
//! struct deserializes from YAML/JSON configuration files; every field has a
//! default.

use crate::dialect::{Dialect, SiblingPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default traversal depth ceiling.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for a bundle call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BundleOptions {
    /// Rewrite cyclic references into self-referential local pointers instead
    /// of failing.
    pub inline_recursive: bool,
    /// Explicit sibling policy. Overrides the dialect default.
    pub sibling_policy: Option<SiblingPolicy>,
    /// Dialect of the documents. Detected from the resolver root when unset.
    pub dialect: Option<Dialect>,
    /// Maximum nesting of containers and reference hops.
    pub max_depth: usize,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            inline_recursive: false,
            sibling_policy: None,
            dialect: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BundleOptions {
    /// Sets `inline_recursive`.
    pub fn with_inline_recursive(mut self, inline_recursive: bool) -> Self {
        self.inline_recursive = inline_recursive;
        self
    }

    /// Sets an explicit sibling policy.
    pub fn with_sibling_policy(mut self, policy: SiblingPolicy) -> Self {
        self.sibling_policy = Some(policy);
        self
    }

    /// Sets the dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the depth ceiling.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The sibling policy in effect for documents rooted at `root`.
    ///
    /// Precedence: explicit policy, configured dialect, detected dialect,
    /// then JSON Schema.
    pub fn effective_sibling_policy(&self, root: &Value) -> SiblingPolicy {
        if let Some(policy) = self.sibling_policy {
            return policy;
        }
        self.dialect
            .or_else(|| Dialect::detect(root))
            .unwrap_or(Dialect::JsonSchema)
            .sibling_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = BundleOptions::default();
        assert!(!options.inline_recursive);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(
            options.effective_sibling_policy(&json!({})),
            SiblingPolicy::Preserve
        );
    }

    #[test]
    fn test_policy_precedence() {
        let swagger = json!({"swagger": "2.0"});
        assert_eq!(
            BundleOptions::default().effective_sibling_policy(&swagger),
            SiblingPolicy::Ignore
        );
        let configured = BundleOptions::default().with_dialect(Dialect::OpenApi31);
        assert_eq!(
            configured.effective_sibling_policy(&swagger),
            SiblingPolicy::Preserve
        );
        let explicit = configured.with_sibling_policy(SiblingPolicy::Ignore);
        assert_eq!(
            explicit.effective_sibling_policy(&swagger),
            SiblingPolicy::Ignore
        );
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = "inline-recursive: true\nmax-depth: 32\ndialect: openapi30\n";
        let options: BundleOptions = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            options,
            BundleOptions::default()
                .with_inline_recursive(true)
                .with_max_depth(32)
                .with_dialect(Dialect::OpenApi30)
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<BundleOptions, _> = serde_yaml::from_str("inline: true\n");
        assert!(result.is_err());
    }
}
