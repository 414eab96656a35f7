//! # Dialects
//!
//! OpenAPI and JSON Schema versions disagree on keys that sit next to `$ref`.
//! Swagger 2.0 and OpenAPI 3.0 ignore them; OpenAPI 3.1 and JSON Schema
//! 2019-09 onwards apply them alongside the referenced schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Treatment of keys that are siblings of `$ref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SiblingPolicy {
    /// Drop siblings; the node becomes a bare reference.
    Ignore,
    /// Keep siblings and bundle their values.
    Preserve,
}

/// Schema dialect of the document being bundled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// `swagger: "2.0"`.
    #[serde(rename = "swagger2")]
    Swagger2,
    /// `openapi: 3.0.x`.
    #[serde(rename = "openapi30")]
    OpenApi30,
    /// `openapi: 3.1.x` and later.
    #[serde(rename = "openapi31")]
    OpenApi31,
    /// Standalone JSON Schema.
    #[serde(rename = "jsonschema")]
    JsonSchema,
}

impl Dialect {
    /// Detects the dialect from the root document's version keys.
    pub fn detect(document: &Value) -> Option<Dialect> {
        if document.get("swagger").is_some() {
            return Some(Dialect::Swagger2);
        }
        if let Some(version) = document.get("openapi").and_then(Value::as_str) {
            return Some(if version.starts_with("3.0") {
                Dialect::OpenApi30
            } else {
                Dialect::OpenApi31
            });
        }
        if let Some(schema) = document.get("$schema").and_then(Value::as_str) {
            // Drafts up to 07 still ignore `$ref` siblings.
            let legacy = ["draft-03", "draft-04", "draft-06", "draft-07"]
                .iter()
                .any(|draft| schema.contains(draft));
            return Some(if legacy {
                Dialect::OpenApi30
            } else {
                Dialect::JsonSchema
            });
        }
        None
    }

    /// Default sibling policy of the dialect.
    pub fn sibling_policy(self) -> SiblingPolicy {
        match self {
            Dialect::Swagger2 | Dialect::OpenApi30 => SiblingPolicy::Ignore,
            Dialect::OpenApi31 | Dialect::JsonSchema => SiblingPolicy::Preserve,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Dialect::Swagger2 => "swagger2",
            Dialect::OpenApi30 => "openapi30",
            Dialect::OpenApi31 => "openapi31",
            Dialect::JsonSchema => "jsonschema",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', '.'], "").as_str() {
            "swagger2" | "swagger20" => Ok(Dialect::Swagger2),
            "openapi30" | "openapi3" => Ok(Dialect::OpenApi30),
            "openapi31" | "openapi32" => Ok(Dialect::OpenApi31),
            "jsonschema" => Ok(Dialect::JsonSchema),
            _ => Err(format!(
                "unknown dialect `{}` (expected swagger2, openapi30, openapi31 or jsonschema)",
                s
            )),
        }
    }
}
