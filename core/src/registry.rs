//! # Bundle Registry
//!
//! Per-call table from normalized target identity to the local definition
//! name and resolution state. It drives both de-duplication (`Done` entries
//! are reused) and cycle detection (`Pending` entries are ancestors of the
//! current traversal path).

use crate::pointer::JsonPointer;
use crate::resolver::Location;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Canonical identity of a reference target.
pub type TargetId = Location;

/// Name used when the pointer has no non-empty segment.
pub const FALLBACK_NAME: &str = "schema";

/// Resolution state of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// The target is being bundled; it is an ancestor of the current site.
    Pending,
    /// The target has been bundled into the definitions container.
    Done,
}

/// A registered target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Local name inside the definitions container.
    pub name: String,
    /// Resolution state.
    pub state: EntryState,
}

/// Registry for a single bundle call.
#[derive(Debug, Default)]
pub struct BundleRegistry {
    entries: IndexMap<TargetId, Entry>,
    used_names: HashSet<String>,
    collisions: HashMap<String, usize>,
}

impl BundleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a target.
    pub fn get(&self, id: &TargetId) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Picks a name for a target at `pointer` that no other entry uses.
    ///
    /// The base is the last non-empty pointer segment; repeated bases get
    /// `_1`, `_2`, … in the order they are requested.
    pub fn assign_name(&mut self, pointer: &JsonPointer) -> String {
        let base = pointer.last_named_token().unwrap_or(FALLBACK_NAME);
        let mut candidate = base.to_string();
        while self.used_names.contains(&candidate) {
            let counter = self.collisions.entry(base.to_string()).or_insert(0);
            *counter += 1;
            candidate = format!("{}_{}", base, counter);
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    /// Registers a target that is about to be bundled.
    pub fn mark_pending(&mut self, id: TargetId, name: String) {
        debug_assert!(!self.entries.contains_key(&id), "target registered twice");
        self.entries.insert(
            id,
            Entry {
                name,
                state: EntryState::Pending,
            },
        );
    }

    /// Records that a pending target has been bundled.
    pub fn mark_done(&mut self, id: &TargetId) {
        if let Some(entry) = self.entries.get_mut(id) {
            debug_assert_eq!(entry.state, EntryState::Pending, "target finished twice");
            entry.state = EntryState::Done;
        }
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no target has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, &Entry)> {
        self.entries.iter()
    }
}
