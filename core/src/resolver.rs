//! # Pointer Resolver
//!
//! Holds the document graph (root document, pre-loaded documents and lazily
//! loaded ones) and resolves `$ref` strings against a [`ScopeStack`].
//!
//! Resolution never mutates its inputs. The only interior mutability is the
//! document cache, guarded by a lock, so one resolver can serve concurrent
//! bundle calls.

use crate::error::{BuildError, ResolveError};
use crate::loader::DocumentLoader;
use crate::pointer::JsonPointer;
use crate::reference::{resolve_document_uri, Reference};
use crate::scope::ScopeStack;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Base URI given to the root document when none is configured.
pub const DEFAULT_BASE_URI: &str = "http://example.invalid/root.json";

/// Normalized identity of a reference target: `(scope, pointer)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Absolute URI of the document, without fragment.
    pub document: Url,
    /// Pointer into that document.
    pub pointer: JsonPointer,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.pointer)
    }
}

/// Outcome of [`Resolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Scope under which `value` must be interpreted.
    pub scope: Url,
    /// The referenced value.
    pub value: Value,
}

/// Reference resolver over a set of documents.
pub struct Resolver {
    root: Url,
    documents: RwLock<HashMap<Url, Arc<Value>>>,
    loader: Option<Box<dyn DocumentLoader>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let documents = self.documents.read();
        let mut uris: Vec<&str> = documents.keys().map(Url::as_str).collect();
        uris.sort_unstable();
        f.debug_struct("Resolver")
            .field("root", &self.root.as_str())
            .field("documents", &uris)
            .field("lazy_loading", &self.loader.is_some())
            .finish()
    }
}

impl Resolver {
    /// Creates a resolver over a single root document at [`DEFAULT_BASE_URI`].
    pub fn new(root: Value) -> Result<Self, BuildError> {
        Self::builder(root).build()
    }

    /// Starts configuring a resolver for `root`.
    pub fn builder(root: Value) -> ResolverBuilder {
        ResolverBuilder {
            root,
            base_uri: None,
            documents: Vec::new(),
            loader: None,
        }
    }

    /// URI of the root document.
    pub fn root_uri(&self) -> &Url {
        &self.root
    }

    /// The root document.
    pub fn root(&self) -> Arc<Value> {
        match self.documents.read().get(&self.root) {
            Some(document) => Arc::clone(document),
            None => Arc::new(Value::Null),
        }
    }

    /// A fresh scope stack positioned at the root document.
    pub fn scopes(&self) -> ScopeStack {
        ScopeStack::new(self.root.clone())
    }

    /// Whether `uri` is already in the document cache.
    pub fn is_loaded(&self, uri: &Url) -> bool {
        self.documents.read().contains_key(uri)
    }

    /// Normalizes `reference` against the current scope without touching any
    /// document.
    pub fn locate(&self, reference: &str, scopes: &ScopeStack) -> Result<Location, ResolveError> {
        let parsed = Reference::parse(reference);
        let document = parsed.document_uri(reference, scopes.current())?;
        let pointer = parsed.pointer(reference)?;
        Ok(Location { document, pointer })
    }

    /// Returns the document at `uri`, loading and caching it on first use.
    pub fn document(&self, uri: &Url) -> Result<Arc<Value>, ResolveError> {
        if let Some(document) = self.documents.read().get(uri) {
            return Ok(Arc::clone(document));
        }
        let Some(loader) = self.loader.as_ref() else {
            return Err(ResolveError::Unresolvable {
                reference: uri.to_string(),
                reason: format!("document `{}` is not registered", uri),
            });
        };

        // Held across the load so each document is fetched at most once.
        let mut documents = self.documents.write();
        if let Some(document) = documents.get(uri) {
            return Ok(Arc::clone(document));
        }
        tracing::debug!(%uri, "loading external document");
        let loaded = loader.load(uri).map_err(|e| ResolveError::Unresolvable {
            reference: uri.to_string(),
            reason: format!("failed to load `{}`: {}", uri, e),
        })?;
        let document = Arc::new(loaded);
        documents.insert(uri.clone(), Arc::clone(&document));
        Ok(document)
    }

    /// Resolves `reference` under the current scope.
    ///
    /// Returns the value together with the scope it must be interpreted in,
    /// which differs from the current one when the reference crosses into
    /// another document.
    pub fn resolve(&self, reference: &str, scopes: &ScopeStack) -> Result<Resolved, ResolveError> {
        let location = self.locate(reference, scopes)?;
        let document = self
            .document(&location.document)
            .map_err(|e| e.with_reference(reference))?;
        let value = location
            .pointer
            .evaluate(&document)
            .map_err(|e| ResolveError::from_pointer(reference, e))?;
        Ok(Resolved {
            scope: location.document,
            value: value.clone(),
        })
    }
}

/// Builder for [`Resolver`].
pub struct ResolverBuilder {
    root: Value,
    base_uri: Option<String>,
    documents: Vec<(String, Value)>,
    loader: Option<Box<dyn DocumentLoader>>,
}

impl ResolverBuilder {
    /// Sets the URI of the root document. Relative references and relative
    /// document identifiers are resolved against it.
    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Pre-loads a document under `id` (absolute, or relative to the base URI).
    pub fn document(mut self, id: impl Into<String>, document: Value) -> Self {
        self.documents.push((id.into(), document));
        self
    }

    /// Enables lazy loading of documents that were not pre-loaded.
    pub fn loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Validates identifiers and assembles the resolver.
    pub fn build(self) -> Result<Resolver, BuildError> {
        let base = self.base_uri.as_deref().unwrap_or(DEFAULT_BASE_URI);
        let root = resolve_document_uri(base, None).map_err(|reason| BuildError::InvalidUri {
            uri: base.to_string(),
            reason,
        })?;

        let mut documents = HashMap::with_capacity(self.documents.len() + 1);
        documents.insert(root.clone(), Arc::new(self.root));
        for (id, document) in self.documents {
            let uri = resolve_document_uri(&id, Some(&root))
                .map_err(|reason| BuildError::InvalidUri { uri: id.clone(), reason })?;
            if documents.contains_key(&uri) {
                return Err(BuildError::DuplicateDocument(uri.to_string()));
            }
            documents.insert(uri, Arc::new(document));
        }

        Ok(Resolver {
            root,
            documents: RwLock::new(documents),
            loader: self.loader,
        })
    }
}
