//! # Bundler
//!
//! Depth-first traversal that rewrites every reachable `$ref` into a local
//! pointer at `#/$defs/<name>`, storing each distinct target exactly once.
//!
//! - A target seen before (`Done`) is reused without re-traversal.
//! - A target that is still being bundled (`Pending`) is a cycle. It either
//!   fails or, with `inline_recursive`, becomes a self-referential definition.
//! - Each call owns its registry and definitions container; the resolver is
//!   only read, so separate calls can run on separate threads.

use crate::dialect::SiblingPolicy;
use crate::error::{json_type_name, BundleError, BundleResult, ResolveError};
use crate::options::BundleOptions;
use crate::pointer::JsonPointer;
use crate::reference::local_reference;
use crate::registry::{BundleRegistry, EntryState};
use crate::resolver::Resolver;
use crate::scope::ScopeStack;
use serde_json::{Map, Value};

/// Key of the definitions container attached to the bundled root.
pub const DEFS_KEY: &str = "$defs";

/// The reference keyword.
pub const REF_KEY: &str = "$ref";

/// Bundles `schema` with default options and the given recursion policy.
pub fn bundle(schema: &Value, resolver: &Resolver, inline_recursive: bool) -> BundleResult<Value> {
    let options = BundleOptions::default().with_inline_recursive(inline_recursive);
    Bundler::new(options).bundle(schema, resolver)
}

/// Bundles `schema` with explicit options.
pub fn bundle_with(
    schema: &Value,
    resolver: &Resolver,
    options: &BundleOptions,
) -> BundleResult<Value> {
    Bundler::new(options.clone()).bundle(schema, resolver)
}

/// Reusable bundler configured once with [`BundleOptions`].
#[derive(Debug, Clone, Default)]
pub struct Bundler {
    options: BundleOptions,
}

impl Bundler {
    /// Creates a bundler.
    pub fn new(options: BundleOptions) -> Self {
        Self { options }
    }

    /// The configured options.
    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    /// Produces a self-contained copy of `schema`.
    ///
    /// Every `$ref` in the result points into the `$defs` container at the
    /// root of the result. The root's own `$defs` is not treated as schema
    /// content: it is rebuilt from the reachable targets only. Scalar roots
    /// are returned unchanged.
    pub fn bundle(&self, schema: &Value, resolver: &Resolver) -> BundleResult<Value> {
        let span = tracing::debug_span!(
            "bundle",
            inline_recursive = self.options.inline_recursive,
            max_depth = self.options.max_depth
        );
        let _entered = span.enter();

        let siblings = self.options.effective_sibling_policy(&resolver.root());
        let mut traversal = Traversal {
            resolver,
            inline_recursive: self.options.inline_recursive,
            siblings,
            max_depth: self.options.max_depth,
            registry: BundleRegistry::new(),
            definitions: Map::new(),
            path: JsonPointer::root(),
        };
        let mut scopes = resolver.scopes();
        let bundled = match schema {
            Value::Object(map) => traversal.walk_object(map, &mut scopes, 0, true)?,
            other => traversal.walk(other, &mut scopes, 0)?,
        };
        tracing::debug!(definitions = traversal.registry.len(), "bundle finished");
        traversal.finish(bundled)
    }
}

struct Traversal<'r> {
    resolver: &'r Resolver,
    inline_recursive: bool,
    siblings: SiblingPolicy,
    max_depth: usize,
    registry: BundleRegistry,
    definitions: Map<String, Value>,
    path: JsonPointer,
}

impl Traversal<'_> {
    fn walk(&mut self, value: &Value, scopes: &mut ScopeStack, depth: usize) -> BundleResult<Value> {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(value.clone()),
            Value::Array(items) => self.walk_array(items, scopes, depth),
            Value::Object(map) => self.walk_object(map, scopes, depth, false),
        }
    }

    fn walk_array(
        &mut self,
        items: &[Value],
        scopes: &mut ScopeStack,
        depth: usize,
    ) -> BundleResult<Value> {
        self.check_depth(depth)?;
        let mut bundled = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            self.path.push(index.to_string());
            let result = self.walk(item, scopes, depth + 1);
            self.path.pop();
            bundled.push(result?);
        }
        Ok(Value::Array(bundled))
    }

    fn walk_object(
        &mut self,
        map: &Map<String, Value>,
        scopes: &mut ScopeStack,
        depth: usize,
        is_root: bool,
    ) -> BundleResult<Value> {
        self.check_depth(depth)?;

        // Only a string `$ref` makes a reference node; a property named `$ref`
        // inside `properties` is plain data.
        let mut local = match map.get(REF_KEY) {
            Some(Value::String(reference)) => Some(self.resolve_site(reference, scopes, depth)?),
            _ => None,
        };

        if self.siblings == SiblingPolicy::Ignore {
            if let Some(local) = local.take() {
                if map.len() > 1 {
                    tracing::trace!(location = %self.path, "dropping `$ref` siblings");
                }
                let mut node = Map::with_capacity(1);
                node.insert(REF_KEY.to_string(), Value::String(local));
                return Ok(Value::Object(node));
            }
        }

        let mut bundled = Map::with_capacity(map.len());
        for (key, value) in map {
            if is_root && key == DEFS_KEY {
                continue;
            }
            if key == REF_KEY {
                if let Some(local) = local.take() {
                    bundled.insert(key.clone(), Value::String(local));
                    continue;
                }
            }
            self.path.push(key.as_str());
            let result = self.walk(value, scopes, depth + 1);
            self.path.pop();
            bundled.insert(key.clone(), result?);
        }
        Ok(Value::Object(bundled))
    }

    /// Resolves the reference at the current site and returns its local pointer.
    fn resolve_site(
        &mut self,
        reference: &str,
        scopes: &mut ScopeStack,
        depth: usize,
    ) -> BundleResult<String> {
        let target = self
            .resolver
            .locate(reference, scopes)
            .map_err(|e| e.at(self.location()))?;

        if let Some(entry) = self.registry.get(&target) {
            return match entry.state {
                EntryState::Done => {
                    tracing::trace!(id = %target, name = %entry.name, "reusing bundled target");
                    Ok(local_reference(DEFS_KEY, &entry.name))
                }
                EntryState::Pending if self.inline_recursive => {
                    tracing::debug!(id = %target, name = %entry.name, "keeping recursive reference");
                    Ok(local_reference(DEFS_KEY, &entry.name))
                }
                EntryState::Pending => Err(BundleError::CyclicReference {
                    reference: reference.to_string(),
                    location: self.location(),
                }),
            };
        }

        let document = self
            .resolver
            .document(&target.document)
            .map_err(|e| e.with_reference(reference).at(self.location()))?;
        let value = target
            .pointer
            .evaluate(&document)
            .map_err(|e| ResolveError::from_pointer(reference, e).at(self.location()))?;
        if !matches!(value, Value::Object(_) | Value::Bool(_)) {
            return Err(BundleError::InvalidTarget {
                reference: reference.to_string(),
                location: self.location(),
                found: json_type_name(value),
            });
        }

        let name = self.registry.assign_name(&target.pointer);
        tracing::debug!(id = %target, name = %name, "bundling new target");
        self.registry.mark_pending(target.clone(), name.clone());
        let bundled = {
            let mut scoped = scopes.push(target.document.clone());
            self.walk(value, &mut scoped, depth + 1)?
        };
        self.definitions.insert(name.clone(), bundled);
        self.registry.mark_done(&target);
        Ok(local_reference(DEFS_KEY, &name))
    }

    fn check_depth(&self, depth: usize) -> BundleResult<()> {
        if depth > self.max_depth {
            return Err(BundleError::DepthExceeded {
                limit: self.max_depth,
                location: self.location(),
            });
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.to_string()
    }

    fn finish(self, bundled: Value) -> BundleResult<Value> {
        match bundled {
            Value::Object(mut map) => {
                if !self.definitions.is_empty() {
                    map.insert(DEFS_KEY.to_string(), Value::Object(self.definitions));
                }
                Ok(Value::Object(map))
            }
            other if self.definitions.is_empty() => Ok(other),
            // Definitions were produced but there is no object to attach them to.
            other => Err(BundleError::InvalidTarget {
                reference: "#".to_string(),
                location: String::new(),
                found: json_type_name(&other),
            }),
        }
    }
}
