#![deny(missing_docs)]

//! # refbundle core
//!
//! Reference resolution and bundling for JSON Schema and OpenAPI documents.
//!
//! Given a schema that contains internal and external `$ref`s, [`bundle`]
//! produces a self-contained copy in which every reachable reference points
//! into a single `$defs` container at the root, each target stored once.

/// Depth-first bundling traversal.
pub mod bundler;

/// `$ref` sibling handling per dialect.
pub mod dialect;

/// Shared error types.
pub mod error;

/// External document loading.
pub mod loader;

/// Bundler configuration.
pub mod options;

/// JSON Pointer parsing and evaluation.
pub mod pointer;

/// `$ref` string parsing.
pub mod reference;

/// Per-call target registry.
pub mod registry;

/// Document store and reference resolution.
pub mod resolver;

/// Removal of optional recursive references.
pub mod sanitize;

/// Scope stack with guarded push/pop.
pub mod scope;

pub use bundler::{bundle, bundle_with, Bundler, DEFS_KEY, REF_KEY};
pub use dialect::{Dialect, SiblingPolicy};
pub use error::{BuildError, BundleError, BundleResult, LoadError, PointerError, ResolveError};
pub use loader::{parse_document, DocumentLoader, FileLoader};
pub use options::{BundleOptions, DEFAULT_MAX_DEPTH};
pub use pointer::JsonPointer;
pub use reference::{Reference, ReferenceKind};
pub use registry::{BundleRegistry, Entry, EntryState, TargetId};
pub use resolver::{Location, Resolved, Resolver, ResolverBuilder, DEFAULT_BASE_URI};
pub use sanitize::remove_optional_references;
pub use scope::{ScopeGuard, ScopeStack};
