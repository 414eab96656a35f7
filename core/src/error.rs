//! # Error Handling
//!
//! Error types shared by the pointer resolver, the document loader and the
//! bundler. Every bundling failure is terminal for the current call.

use derive_more::{Display, From};
use serde_json::Value;

/// Failure while parsing or evaluating a JSON Pointer.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// A non-empty pointer that does not begin with `/`.
    #[display("pointer must start with `/`, got `{_0}`")]
    MissingLeadingSlash(String),

    /// A `~` that is not followed by `0` or `1`.
    #[display("invalid escape sequence in token `{_0}`")]
    InvalidEscape(String),

    /// An array index token that is not a canonical decimal number.
    #[display("invalid array index `{_0}`")]
    InvalidIndex(String),

    /// An array index past the end of the array.
    #[display("index {index} is out of range for an array of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the array being indexed.
        len: usize,
    },

    /// An object key that does not exist.
    #[display("key `{_0}` not found")]
    MissingKey(String),

    /// A token applied to a scalar value.
    #[display("cannot descend into {found} with token `{token}`")]
    NotAContainer {
        /// The token that could not be applied.
        token: String,
        /// JSON type name of the value being descended into.
        found: &'static str,
    },
}

impl PointerError {
    /// Whether the failure is a property of the pointer syntax rather than of the document.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            PointerError::MissingLeadingSlash(_)
                | PointerError::InvalidEscape(_)
                | PointerError::InvalidIndex(_)
        )
    }
}

impl std::error::Error for PointerError {}

/// Failure returned by the [`Resolver`](crate::resolver::Resolver).
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The reference does not parse as `<uri>#<json-pointer>`.
    #[display("Malformed reference `{reference}`: {reason}")]
    MalformedPointer {
        /// The raw reference string.
        reference: String,
        /// Human readable cause.
        reason: String,
    },

    /// The target document or a path segment inside it does not exist.
    #[display("Unresolvable reference `{reference}`: {reason}")]
    Unresolvable {
        /// The raw reference string.
        reference: String,
        /// Human readable cause.
        reason: String,
    },
}

impl ResolveError {
    pub(crate) fn from_pointer(reference: &str, err: PointerError) -> Self {
        if err.is_malformed() {
            ResolveError::MalformedPointer {
                reference: reference.to_string(),
                reason: err.to_string(),
            }
        } else {
            ResolveError::Unresolvable {
                reference: reference.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Replaces the reference recorded in the error.
    pub(crate) fn with_reference(self, reference: &str) -> Self {
        match self {
            ResolveError::MalformedPointer { reason, .. } => ResolveError::MalformedPointer {
                reference: reference.to_string(),
                reason,
            },
            ResolveError::Unresolvable { reason, .. } => ResolveError::Unresolvable {
                reference: reference.to_string(),
                reason,
            },
        }
    }

    /// The reference that failed to resolve.
    pub fn reference(&self) -> &str {
        match self {
            ResolveError::MalformedPointer { reference, .. }
            | ResolveError::Unresolvable { reference, .. } => reference,
        }
    }

    /// Attaches the traversal location, producing a bundling error.
    pub(crate) fn at(self, location: String) -> BundleError {
        match self {
            ResolveError::MalformedPointer { reference, reason } => {
                BundleError::MalformedPointer {
                    reference,
                    location,
                    reason,
                }
            }
            ResolveError::Unresolvable { reference, reason } => {
                BundleError::UnresolvableReference {
                    reference,
                    location,
                    reason,
                }
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Failure while assembling a [`Resolver`](crate::resolver::Resolver).
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A document identifier that is not a valid URI reference.
    #[display("Invalid document URI `{uri}`: {reason}")]
    InvalidUri {
        /// The identifier as supplied.
        uri: String,
        /// Parser message.
        reason: String,
    },

    /// Two documents normalized to the same URI.
    #[display("Document `{_0}` is already registered")]
    DuplicateDocument(String),
}

impl std::error::Error for BuildError {}

/// Failure while loading an external document.
#[derive(Debug, Display, From)]
pub enum LoadError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The document is not valid JSON.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// The document is not valid YAML.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// The loader does not handle this URI.
    #[from(ignore)]
    #[display("Unsupported document URI `{_0}`")]
    UnsupportedUri(String),
}

impl std::error::Error for LoadError {}

/// Terminal failure of a bundle call.
///
/// `location` is the JSON Pointer path from the traversal root to the failing
/// reference site, continuing through any reference targets on the way.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum BundleError {
    /// The reference string is not a valid pointer.
    #[display("Malformed reference `{reference}` at `{location}`: {reason}")]
    MalformedPointer {
        /// The raw reference string.
        reference: String,
        /// Path to the reference site.
        location: String,
        /// Human readable cause.
        reason: String,
    },

    /// The target document or path segment does not exist.
    #[display("Unresolvable reference `{reference}` at `{location}`: {reason}")]
    UnresolvableReference {
        /// The raw reference string.
        reference: String,
        /// Path to the reference site.
        location: String,
        /// Human readable cause.
        reason: String,
    },

    /// A reference leads back to a target that is still being bundled.
    #[display("Cyclic reference `{reference}` at `{location}`")]
    CyclicReference {
        /// The raw reference string.
        reference: String,
        /// Path to the reference site.
        location: String,
    },

    /// Traversal went deeper than the configured ceiling.
    #[display("Maximum bundling depth of {limit} exceeded at `{location}`")]
    DepthExceeded {
        /// The configured ceiling.
        limit: usize,
        /// Path at which the ceiling was hit.
        location: String,
    },

    /// The reference resolved to something that is not a schema.
    #[display(
        "Cannot bundle `{reference}` at `{location}`: expected JSON Schema (object or boolean), got {found}"
    )]
    InvalidTarget {
        /// The raw reference string.
        reference: String,
        /// Path to the reference site.
        location: String,
        /// JSON type name of the resolved value.
        found: &'static str,
    },
}

impl BundleError {
    /// The offending reference, if the failure is tied to one.
    pub fn reference(&self) -> Option<&str> {
        match self {
            BundleError::MalformedPointer { reference, .. }
            | BundleError::UnresolvableReference { reference, .. }
            | BundleError::CyclicReference { reference, .. }
            | BundleError::InvalidTarget { reference, .. } => Some(reference),
            BundleError::DepthExceeded { .. } => None,
        }
    }

    /// JSON Pointer from the traversal root to the failure site.
    pub fn location(&self) -> &str {
        match self {
            BundleError::MalformedPointer { location, .. }
            | BundleError::UnresolvableReference { location, .. }
            | BundleError::CyclicReference { location, .. }
            | BundleError::DepthExceeded { location, .. }
            | BundleError::InvalidTarget { location, .. } => location,
        }
    }
}

impl std::error::Error for BundleError {}

/// Helper type alias for bundling results.
pub type BundleResult<T> = Result<T, BundleError>;

/// JSON type name used in diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::NotFound, "missing");
        let load_err: LoadError = io_err.into();
        assert!(matches!(load_err, LoadError::Io(_)));
    }

    #[test]
    fn test_pointer_error_classification() {
        assert!(PointerError::InvalidEscape("~2".into()).is_malformed());
        assert!(PointerError::InvalidIndex("x".into()).is_malformed());
        assert!(!PointerError::MissingKey("a".into()).is_malformed());
        assert!(!PointerError::IndexOutOfRange { index: 3, len: 1 }.is_malformed());
    }

    #[test]
    fn test_resolve_error_maps_to_bundle_error() {
        let err = ResolveError::from_pointer("#/a/~2", PointerError::InvalidEscape("~2".into()));
        let bundle_err = err.at("/properties/x".to_string());
        assert!(matches!(bundle_err, BundleError::MalformedPointer { .. }));
        assert_eq!(bundle_err.reference(), Some("#/a/~2"));
        assert_eq!(bundle_err.location(), "/properties/x");
    }

    #[test]
    fn test_invalid_target_display() {
        let err = BundleError::InvalidTarget {
            reference: "#/definitions/Name".into(),
            location: "".into(),
            found: "string",
        };
        assert_eq!(
            err.to_string(),
            "Cannot bundle `#/definitions/Name` at ``: expected JSON Schema (object or boolean), got string"
        );
    }
}
